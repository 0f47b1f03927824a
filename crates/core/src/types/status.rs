//! Status and role enums for Slotwise entities.

use serde::{Deserialize, Serialize};

/// Lifecycle status of an appointment.
///
/// Transitions:
///
/// ```text
/// Scheduled -> Confirmed -> InProgress -> Completed
/// Scheduled | Confirmed -> Canceled
/// any non-terminal -> NoShow
/// ```
///
/// `Completed`, `Canceled`, and `NoShow` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "appointment_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    #[default]
    Scheduled,
    Confirmed,
    InProgress,
    Completed,
    Canceled,
    NoShow,
}

impl AppointmentStatus {
    /// Whether this status admits no further transitions.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Canceled | Self::NoShow)
    }

    /// Whether the appointment may still be canceled.
    ///
    /// Only appointments that have not yet started qualify.
    #[must_use]
    pub const fn can_be_canceled(self) -> bool {
        matches!(self, Self::Scheduled | Self::Confirmed)
    }

    /// Whether a transition from `self` to `next` is allowed.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        match (self, next) {
            (Self::Scheduled, Self::Confirmed)
            | (Self::Confirmed, Self::InProgress)
            | (Self::InProgress, Self::Completed) => true,
            (Self::Scheduled | Self::Confirmed, Self::Canceled) => true,
            (from, Self::NoShow) => !from.is_terminal(),
            _ => false,
        }
    }
}

impl std::fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Scheduled => "scheduled",
            Self::Confirmed => "confirmed",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Canceled => "canceled",
            Self::NoShow => "no_show",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for AppointmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scheduled" => Ok(Self::Scheduled),
            "confirmed" => Ok(Self::Confirmed),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            "canceled" => Ok(Self::Canceled),
            "no_show" => Ok(Self::NoShow),
            _ => Err(format!("invalid appointment status: {s}")),
        }
    }
}

/// Role of a dashboard user within a tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "user_role", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Full access including tenant settings and user management.
    Owner,
    /// Day-to-day access to customers, appointments, and schedules.
    Staff,
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Owner => write!(f, "owner"),
            Self::Staff => write!(f, "staff"),
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "owner" => Ok(Self::Owner),
            "staff" => Ok(Self::Staff),
            _ => Err(format!("invalid user role: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_transitions() {
        use AppointmentStatus as S;
        assert!(S::Scheduled.can_transition_to(S::Confirmed));
        assert!(S::Confirmed.can_transition_to(S::InProgress));
        assert!(S::InProgress.can_transition_to(S::Completed));
    }

    #[test]
    fn test_only_scheduled_confirms() {
        use AppointmentStatus as S;
        assert!(S::Scheduled.can_transition_to(S::Confirmed));
        for from in [S::Confirmed, S::InProgress, S::Completed, S::Canceled, S::NoShow] {
            assert!(!from.can_transition_to(S::Confirmed), "{from} -> Confirmed");
        }
    }

    #[test]
    fn test_cancelable_states() {
        use AppointmentStatus as S;
        assert!(S::Scheduled.can_be_canceled());
        assert!(S::Confirmed.can_be_canceled());
        assert!(!S::InProgress.can_be_canceled());
        assert!(!S::Completed.can_be_canceled());
        assert!(!S::Canceled.can_be_canceled());
        assert!(!S::NoShow.can_be_canceled());
    }

    #[test]
    fn test_no_show_from_non_terminal_only() {
        use AppointmentStatus as S;
        for from in [S::Scheduled, S::Confirmed, S::InProgress] {
            assert!(from.can_transition_to(S::NoShow), "{from} -> NoShow");
        }
        for from in [S::Completed, S::Canceled, S::NoShow] {
            assert!(!from.can_transition_to(S::NoShow), "{from} -> NoShow");
        }
    }

    #[test]
    fn test_terminal_states_admit_nothing() {
        use AppointmentStatus as S;
        let all = [
            S::Scheduled,
            S::Confirmed,
            S::InProgress,
            S::Completed,
            S::Canceled,
            S::NoShow,
        ];
        for from in [S::Completed, S::Canceled, S::NoShow] {
            for to in all {
                assert!(!from.can_transition_to(to), "{from} -> {to}");
            }
        }
    }

    #[test]
    fn test_status_string_round_trip() {
        use AppointmentStatus as S;
        for status in [S::Scheduled, S::Confirmed, S::InProgress, S::Completed, S::Canceled, S::NoShow] {
            let parsed: S = status.to_string().parse().expect("round trip");
            assert_eq!(parsed, status);
        }
    }
}
