use rust_decimal::Decimal;
use serde::Serialize;

use crate::model::penalty_rule::{PenaltyRule, PenaltyRuleType};

/// Active lateness rules, ready for evaluation: tiers ordered by
/// `min_minutes`, plus the number of late arrivals forgiven per period.
#[derive(Debug, Clone, Default)]
pub struct PenaltyPolicy {
    tiers: Vec<PenaltyRule>,
    grace_count: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LatenessOutcome {
    pub late_arrivals: u32,
    pub forgiven: u32,
    pub deduction_days: Decimal,
}

impl PenaltyPolicy {
    pub fn from_rules(rules: &[PenaltyRule]) -> Self {
        let mut tiers: Vec<PenaltyRule> = rules
            .iter()
            .filter(|r| r.is_active && r.rule_type == PenaltyRuleType::Tier)
            .cloned()
            .collect();
        tiers.sort_by_key(|r| (r.min_minutes, r.id));

        let grace_count = rules
            .iter()
            .filter(|r| r.is_active && r.rule_type == PenaltyRuleType::GracePeriod)
            .map(|r| r.grace_count)
            .max()
            .unwrap_or(0);

        Self { tiers, grace_count }
    }

    pub fn grace_count(&self) -> u32 {
        self.grace_count
    }

    /// Lateness from which a check-in is recorded as `late`.
    pub fn late_threshold_minutes(&self) -> u32 {
        self.tiers.first().map(|t| t.min_minutes).unwrap_or(0).max(1)
    }

    pub fn is_late(&self, late_minutes: u32) -> bool {
        late_minutes >= self.late_threshold_minutes()
    }

    pub fn tier_for(&self, late_minutes: u32) -> Option<&PenaltyRule> {
        self.tiers.iter().find(|t| t.covers(late_minutes))
    }

    /// Walks one period's late arrivals in date order. The first
    /// `grace_count` arrivals are forgiven, the rest deduct their tier's days.
    pub fn evaluate<I>(&self, late_minutes_in_order: I) -> LatenessOutcome
    where
        I: IntoIterator<Item = u32>,
    {
        let mut outcome = LatenessOutcome::default();
        for minutes in late_minutes_in_order {
            if !self.is_late(minutes) {
                continue;
            }
            outcome.late_arrivals += 1;
            if outcome.late_arrivals <= self.grace_count {
                outcome.forgiven += 1;
                continue;
            }
            if let Some(tier) = self.tier_for(minutes) {
                outcome.deduction_days += tier.deduction_days;
            }
        }
        outcome
    }
}

#[cfg(test)]
pub(crate) fn tier(id: u64, min: u32, max: Option<u32>, days: Decimal) -> PenaltyRule {
    PenaltyRule {
        id,
        name: format!("tier {id}"),
        name_ar: None,
        rule_type: PenaltyRuleType::Tier,
        min_minutes: min,
        max_minutes: max,
        deduction_days: days,
        grace_count: 0,
        is_active: true,
    }
}

#[cfg(test)]
pub(crate) fn grace(id: u64, count: u32) -> PenaltyRule {
    PenaltyRule {
        id,
        name: "grace".into(),
        name_ar: None,
        rule_type: PenaltyRuleType::GracePeriod,
        min_minutes: 0,
        max_minutes: None,
        deduction_days: Decimal::ZERO,
        grace_count: count,
        is_active: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn policy() -> PenaltyPolicy {
        PenaltyPolicy::from_rules(&[
            tier(3, 60, None, dec!(1)),
            tier(1, 10, Some(29), dec!(0.25)),
            tier(2, 30, Some(59), dec!(0.5)),
            grace(4, 2),
        ])
    }

    #[test]
    fn tiers_are_looked_up_by_range() {
        let p = policy();
        assert!(p.tier_for(5).is_none());
        assert_eq!(p.tier_for(10).unwrap().id, 1);
        assert_eq!(p.tier_for(29).unwrap().id, 1);
        assert_eq!(p.tier_for(30).unwrap().id, 2);
        assert_eq!(p.tier_for(600).unwrap().id, 3);
    }

    #[test]
    fn threshold_is_lowest_tier() {
        let p = policy();
        assert_eq!(p.late_threshold_minutes(), 10);
        assert!(!p.is_late(9));
        assert!(p.is_late(10));
    }

    #[test]
    fn without_tiers_any_lateness_counts() {
        let p = PenaltyPolicy::from_rules(&[]);
        assert!(!p.is_late(0));
        assert!(p.is_late(1));
        assert_eq!(p.evaluate([5, 50]).deduction_days, Decimal::ZERO);
    }

    #[test]
    fn grace_forgives_first_arrivals_of_the_period() {
        let outcome = policy().evaluate([45, 70, 15, 0, 35]);
        assert_eq!(outcome.late_arrivals, 4);
        assert_eq!(outcome.forgiven, 2);
        // 15 -> 0.25, 35 -> 0.5
        assert_eq!(outcome.deduction_days, dec!(0.75));
    }

    #[test]
    fn inactive_rules_are_ignored() {
        let mut off = grace(9, 10);
        off.is_active = false;
        let p = PenaltyPolicy::from_rules(&[tier(1, 10, None, dec!(1)), off]);
        assert_eq!(p.grace_count(), 0);
        assert_eq!(p.evaluate([20]).deduction_days, dec!(1));
    }
}
