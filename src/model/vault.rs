use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{HrError, HrResult};

/// Cash custody account. The row is locked for update before any debit or
/// credit so concurrent advances and disbursements serialise per vault.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Vault {
    pub id: u64,

    #[schema(example = "Main safe")]
    pub name: String,

    #[schema(example = "5000.00")]
    pub balance: Decimal,

    pub is_active: bool,
}

impl Vault {
    /// Takes `amount` out of the vault and returns the new balance.
    pub fn debit(&mut self, amount: Decimal) -> HrResult<Decimal> {
        self.ensure_usable(amount)?;
        if self.balance < amount {
            return Err(HrError::InsufficientFunds {
                vault_id: self.id,
                balance: self.balance,
                requested: amount,
            });
        }
        self.balance -= amount;
        Ok(self.balance)
    }

    pub fn credit(&mut self, amount: Decimal) -> HrResult<Decimal> {
        self.ensure_usable(amount)?;
        self.balance += amount;
        Ok(self.balance)
    }

    fn ensure_usable(&self, amount: Decimal) -> HrResult<()> {
        if !self.is_active {
            return Err(HrError::validation(format!("Vault {} is inactive", self.id)));
        }
        if amount <= Decimal::ZERO {
            return Err(HrError::validation("Amount must be greater than zero"));
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) fn test_vault(id: u64, balance: Decimal) -> Vault {
    Vault {
        id,
        name: format!("Vault {id}"),
        balance,
        is_active: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn debit_reduces_balance() {
        let mut vault = test_vault(1, dec!(5000));
        assert_eq!(vault.debit(dec!(1200)).unwrap(), dec!(3800));
        assert_eq!(vault.balance, dec!(3800));
    }

    #[test]
    fn debit_beyond_balance_is_rejected_and_leaves_balance() {
        let mut vault = test_vault(1, dec!(100));
        let err = vault.debit(dec!(100.01)).unwrap_err();
        assert!(matches!(err, HrError::InsufficientFunds { vault_id: 1, .. }));
        assert_eq!(vault.balance, dec!(100));
    }

    #[test]
    fn inactive_vault_cannot_move_cash() {
        let mut vault = test_vault(3, dec!(100));
        vault.is_active = false;
        assert!(matches!(vault.credit(dec!(5)), Err(HrError::Validation(_))));
    }

    #[test]
    fn zero_amounts_are_invalid() {
        let mut vault = test_vault(1, dec!(100));
        assert!(matches!(vault.debit(Decimal::ZERO), Err(HrError::Validation(_))));
    }
}
