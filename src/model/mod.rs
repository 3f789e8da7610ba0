/// Maps a strum string enum onto a MySQL `VARCHAR` column, so rows decode
/// straight into the closed enum and unknown values fail the query.
macro_rules! sql_text_enum {
    ($ty:ty) => {
        impl sqlx::Type<sqlx::MySql> for $ty {
            fn type_info() -> sqlx::mysql::MySqlTypeInfo {
                <str as sqlx::Type<sqlx::MySql>>::type_info()
            }

            fn compatible(ty: &sqlx::mysql::MySqlTypeInfo) -> bool {
                <str as sqlx::Type<sqlx::MySql>>::compatible(ty)
            }
        }

        impl<'r> sqlx::Decode<'r, sqlx::MySql> for $ty {
            fn decode(
                value: sqlx::mysql::MySqlValueRef<'r>,
            ) -> Result<Self, sqlx::error::BoxDynError> {
                let text = <&str as sqlx::Decode<sqlx::MySql>>::decode(value)?;
                Ok(text.parse::<$ty>()?)
            }
        }

        impl<'q> sqlx::Encode<'q, sqlx::MySql> for $ty {
            fn encode_by_ref(&self, buf: &mut Vec<u8>) -> sqlx::encode::IsNull {
                <&str as sqlx::Encode<sqlx::MySql>>::encode(self.as_ref(), buf)
            }
        }
    };
}

pub mod adjustment;
pub mod advance;
pub mod attendance;
pub mod holiday;
pub mod location;
pub mod payroll;
pub mod penalty_rule;
pub mod role;
pub mod vault;
pub mod worker;
