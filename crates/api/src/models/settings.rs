//! Per-tenant booking settings.

use chrono::{DateTime, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};

use slotwise_core::{TenantId, UserId};

/// Opening hours for one weekday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayHours {
    pub open: NaiveTime,
    pub close: NaiveTime,
}

/// Weekly opening hours, Monday-first. `None` means closed that day.
///
/// All times are UTC instants' wall-clock components; clients localize for
/// display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BusinessHours(pub [Option<DayHours>; 7]);

impl BusinessHours {
    /// Hours for a given weekday, if open.
    #[must_use]
    pub fn for_weekday(&self, weekday: Weekday) -> Option<DayHours> {
        self.0
            .get(weekday.num_days_from_monday() as usize)
            .copied()
            .flatten()
    }

    /// Nine-to-five Monday through Friday.
    #[must_use]
    pub fn weekdays_nine_to_five() -> Self {
        let open = NaiveTime::from_hms_opt(9, 0, 0).unwrap_or_default();
        let close = NaiveTime::from_hms_opt(17, 0, 0).unwrap_or_default();
        let day = Some(DayHours { open, close });
        Self([day, day, day, day, day, None, None])
    }
}

/// Booking policy knobs for a tenant.
#[derive(Debug, Clone)]
pub struct TenantSettings {
    pub tenant_id: TenantId,
    /// Spacing between offered slot start times, in minutes.
    pub slot_granularity_minutes: i32,
    /// Minimum lead time before a slot may be booked, in minutes.
    pub min_notice_minutes: i32,
    /// How far ahead slots are offered, in days.
    pub booking_window_days: i32,
    /// How close to the start an appointment may still be canceled, in hours.
    pub cancellation_window_hours: i32,
    pub business_hours: BusinessHours,
    pub updated_at: DateTime<Utc>,
    pub updated_by: Option<UserId>,
}

impl TenantSettings {
    /// Defaults applied when a tenant registers.
    #[must_use]
    pub fn defaults_for(tenant_id: TenantId) -> Self {
        Self {
            tenant_id,
            slot_granularity_minutes: 15,
            min_notice_minutes: 60,
            booking_window_days: 60,
            cancellation_window_hours: 24,
            business_hours: BusinessHours::weekdays_nine_to_five(),
            updated_at: Utc::now(),
            updated_by: None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_weekday_lookup() {
        let hours = BusinessHours::weekdays_nine_to_five();
        let friday = hours.for_weekday(Weekday::Fri).unwrap();
        assert_eq!(friday.open, NaiveTime::from_hms_opt(9, 0, 0).unwrap());
        assert!(hours.for_weekday(Weekday::Sun).is_none());
    }

    #[test]
    fn test_business_hours_json_round_trip() {
        let hours = BusinessHours::weekdays_nine_to_five();
        let json = serde_json::to_string(&hours).unwrap();
        let back: BusinessHours = serde_json::from_str(&json).unwrap();
        assert_eq!(hours, back);
    }
}
