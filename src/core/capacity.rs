use crate::models::{Advisor, ExclusionReason, Role};

/// Outcome of a capacity check for one advisor and role
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapacityDecision {
    Eligible,
    /// `current == max`
    AtCapacity,
    /// `current > max`
    OverCapacity,
    /// `max == 0`
    NoCapacity,
}

impl CapacityDecision {
    pub fn is_eligible(self) -> bool {
        self == CapacityDecision::Eligible
    }

    pub fn exclusion_reason(self, advisor: &Advisor, role: Role) -> Option<ExclusionReason> {
        let current = advisor.current_families;
        let max = advisor.max_families;
        match self {
            CapacityDecision::Eligible => None,
            CapacityDecision::AtCapacity => {
                Some(ExclusionReason::AtCapacity { role, current, max })
            }
            CapacityDecision::OverCapacity => {
                Some(ExclusionReason::OverCapacity { role, current, max })
            }
            CapacityDecision::NoCapacity => Some(ExclusionReason::NoCapacity { role }),
        }
    }
}

/// Only lead assignments draw on the capacity pool; backup and support
/// are always eligible.
pub fn check(advisor: &Advisor, role: Role) -> CapacityDecision {
    if role != Role::Lead {
        return CapacityDecision::Eligible;
    }

    let (current, max) = (advisor.current_families, advisor.max_families);
    if max == 0 {
        CapacityDecision::NoCapacity
    } else if current > max {
        CapacityDecision::OverCapacity
    } else if current == max {
        CapacityDecision::AtCapacity
    } else {
        CapacityDecision::Eligible
    }
}

#[inline]
pub fn is_eligible(advisor: &Advisor, role: Role) -> bool {
    check(advisor, role).is_eligible()
}

/// Unclamped `current / max`; `None` when the advisor has no capacity at all
#[inline]
pub fn load_ratio(advisor: &Advisor) -> Option<f64> {
    if advisor.max_families == 0 {
        return None;
    }
    Some(advisor.current_families as f64 / advisor.max_families as f64)
}

/// Display percentage, clamped to 0..=100
pub fn capacity_pct(advisor: &Advisor) -> u8 {
    load_ratio(advisor).map_or(0, |ratio| (ratio * 100.0).round().clamp(0.0, 100.0) as u8)
}

pub fn is_over_capacity(advisor: &Advisor) -> bool {
    load_ratio(advisor).is_some_and(|ratio| ratio > 1.0)
}
