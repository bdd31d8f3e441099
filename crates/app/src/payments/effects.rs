//! Best-effort work that follows a completed payment.

use std::fmt;

/// Result of one side effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EffectOutcome {
    Applied,
    NotApplicable,
    Failed { reason: String },
}

impl EffectOutcome {
    pub fn failed(reason: impl fmt::Display) -> Self {
        Self::Failed {
            reason: reason.to_string(),
        }
    }

    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Applied => "applied",
            Self::NotApplicable => "not_applicable",
            Self::Failed { .. } => "failed",
        }
    }
}

/// Everything that happened after the order was completed.
///
/// None of these can undo the completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SideEffects {
    pub voucher: EffectOutcome,
    pub user: EffectOutcome,
    pub email: EffectOutcome,
    pub notifications: EffectOutcome,
}

impl SideEffects {
    #[must_use]
    pub fn failures(&self) -> usize {
        [&self.voucher, &self.user, &self.email, &self.notifications]
            .into_iter()
            .filter(|outcome| outcome.is_failed())
            .count()
    }
}
