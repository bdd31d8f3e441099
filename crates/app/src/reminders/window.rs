//! Reminder windows relative to an event's start.

use jiff::SignedDuration;

/// A band of lead times in which one reminder is due.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReminderWindow {
    /// 23.5 to 24.5 hours before the start.
    DayBefore,

    /// 0.5 to 1.5 hours before the start.
    HourBefore,
}

impl ReminderWindow {
    pub const ALL: [Self; 2] = [Self::DayBefore, Self::HourBefore];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::DayBefore => "24h",
            Self::HourBefore => "1h",
        }
    }

    /// Inclusive lower and exclusive upper lead time.
    #[must_use]
    pub const fn bounds(self) -> (SignedDuration, SignedDuration) {
        match self {
            Self::DayBefore => (
                SignedDuration::from_mins(23 * 60 + 30),
                SignedDuration::from_mins(24 * 60 + 30),
            ),
            Self::HourBefore => (SignedDuration::from_mins(30), SignedDuration::from_mins(90)),
        }
    }

    /// The window a lead time falls in, if any.
    #[must_use]
    pub fn for_lead(lead: SignedDuration) -> Option<Self> {
        Self::ALL.into_iter().find(|window| {
            let (lower, upper) = window.bounds();

            lead >= lower && lead < upper
        })
    }
}
