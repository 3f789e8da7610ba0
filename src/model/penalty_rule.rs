use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, EnumString, AsRefStr, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PenaltyRuleType {
    /// Lateness range mapped to a number of deducted days.
    Tier,
    /// Forgives the first `grace_count` late arrivals of a period.
    GracePeriod,
}

sql_text_enum!(PenaltyRuleType);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 2,
        "name": "Late 15-30 minutes",
        "name_ar": "تأخير ١٥-٣٠ دقيقة",
        "rule_type": "tier",
        "min_minutes": 15,
        "max_minutes": 30,
        "deduction_days": "0.25",
        "grace_count": 0,
        "is_active": true
    })
)]
pub struct PenaltyRule {
    pub id: u64,
    pub name: String,
    pub name_ar: Option<String>,
    pub rule_type: PenaltyRuleType,
    pub min_minutes: u32,
    /// `None` means unbounded.
    pub max_minutes: Option<u32>,
    pub deduction_days: Decimal,
    pub grace_count: u32,
    pub is_active: bool,
}

impl PenaltyRule {
    pub fn covers(&self, late_minutes: u32) -> bool {
        late_minutes >= self.min_minutes && self.max_minutes.is_none_or(|max| late_minutes <= max)
    }
}
