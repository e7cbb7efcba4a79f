use std::str::FromStr;

use chrono::{DateTime, Duration, Local};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

use crate::diary::DiaryEntry;
use crate::errors::StoreError;
use crate::storage::{NOTIFICATIONS_KEY, Store, THEME_KEY};

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, AsRefStr, Display, EnumIter, EnumString,
)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum AppTheme {
    #[default]
    Day,
    Night,
    Girly,
    Boyish,
}

impl AppTheme {
    /// Loads the persisted theme. Absent or unrecognized values fall back
    /// to [`AppTheme::Day`].
    pub fn load(store: &Store) -> Result<Self, StoreError> {
        let raw = match store.get_str(THEME_KEY) {
            Err(StoreError::NotText(_)) => None,
            raw => raw?,
        };
        Ok(raw
            .and_then(|raw| AppTheme::from_str(raw.trim()).ok())
            .unwrap_or_default())
    }

    pub fn save(self, store: &Store) -> Result<(), StoreError> {
        store.put_str(THEME_KEY, self.as_ref())
    }
}

pub const REMINDER_INTERVALS: [u32; 4] = [12, 24, 48, 72];
pub const DEFAULT_REMINDER_INTERVAL: u32 = 24;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPreference {
    pub enabled: bool,
    pub interval_hours: u32,
}

impl Default for NotificationPreference {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_hours: DEFAULT_REMINDER_INTERVAL,
        }
    }
}

impl NotificationPreference {
    /// Builds a preference, rejecting intervals outside the offered set.
    pub fn new(enabled: bool, interval_hours: u32) -> Option<Self> {
        REMINDER_INTERVALS
            .contains(&interval_hours)
            .then_some(Self {
                enabled,
                interval_hours,
            })
    }

    pub fn load(store: &Store) -> Result<Self, StoreError> {
        let preference = store
            .get_json::<NotificationPreference>(NOTIFICATIONS_KEY)
            .unwrap_or_else(|e| {
                tracing::warn!("Ignoring stored notification preference: {e}");
                None
            })
            .filter(|p| REMINDER_INTERVALS.contains(&p.interval_hours))
            .unwrap_or_default();
        Ok(preference)
    }

    pub fn save(&self, store: &Store) -> Result<(), StoreError> {
        store.put_json(NOTIFICATIONS_KEY, self)
    }

    /// When the next check-up is due: one interval after the latest diary
    /// entry, or right away for an empty diary. `None` while disabled.
    pub fn next_reminder(
        &self,
        latest: Option<&DiaryEntry>,
        now: DateTime<Local>,
    ) -> Option<DateTime<Local>> {
        if !self.enabled {
            return None;
        }
        match latest.and_then(DiaryEntry::created_at) {
            Some(created) => Some(created + Duration::hours(i64::from(self.interval_hours))),
            None => Some(now),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::TimeZone;
    use strum::IntoEnumIterator;

    #[test]
    fn test_theme_defaults_to_day() {
        let store = Store::temporary().unwrap();
        assert_eq!(AppTheme::load(&store).unwrap(), AppTheme::Day);
    }

    #[test]
    fn test_theme_round_trip() {
        let store = Store::temporary().unwrap();
        for theme in AppTheme::iter() {
            theme.save(&store).unwrap();
            assert_eq!(AppTheme::load(&store).unwrap(), theme);
        }
    }

    #[test]
    fn test_theme_stored_as_upper_case_name() {
        let store = Store::temporary().unwrap();
        AppTheme::Boyish.save(&store).unwrap();
        assert_eq!(store.get_str(THEME_KEY).unwrap().as_deref(), Some("BOYISH"));
        assert_eq!(AppTheme::Girly.to_string(), "GIRLY");
    }

    #[test]
    fn test_unrecognized_theme_falls_back() {
        let store = Store::temporary().unwrap();
        store.put_str(THEME_KEY, "SEPIA").unwrap();
        assert_eq!(AppTheme::load(&store).unwrap(), AppTheme::Day);

        store.put_bytes(THEME_KEY, &[0xff, 0xfe]).unwrap();
        assert_eq!(AppTheme::load(&store).unwrap(), AppTheme::Day);
    }

    #[test]
    fn test_notification_round_trip() {
        let store = Store::temporary().unwrap();
        assert_eq!(
            NotificationPreference::load(&store).unwrap(),
            NotificationPreference::default()
        );

        let preference = NotificationPreference::new(true, 48).unwrap();
        preference.save(&store).unwrap();
        assert_eq!(NotificationPreference::load(&store).unwrap(), preference);
    }

    #[test]
    fn test_only_offered_intervals_accepted() {
        assert!(NotificationPreference::new(true, 36).is_none());
        assert!(NotificationPreference::new(false, 72).is_some());
    }

    #[test]
    fn test_next_reminder() {
        let now = Local.with_ymd_and_hms(2026, 5, 1, 12, 0, 0).unwrap();
        let created = Local.with_ymd_and_hms(2026, 4, 30, 8, 0, 0).unwrap();
        let entry = DiaryEntry {
            id: created.timestamp_millis().to_string(),
            date: "4/30/2026".into(),
            image_base64: String::new(),
            health_score: 70,
            insight: String::new(),
        };

        let disabled = NotificationPreference::default();
        assert_eq!(disabled.next_reminder(Some(&entry), now), None);

        let enabled = NotificationPreference::new(true, 12).unwrap();
        assert_eq!(enabled.next_reminder(None, now), Some(now));
        assert_eq!(
            enabled.next_reminder(Some(&entry), now),
            Some(created + Duration::hours(12))
        );
    }
}
