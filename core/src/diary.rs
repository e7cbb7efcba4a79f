use chrono::{DateTime, Local, TimeZone};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::diagnosis::DiagnosisResult;
use crate::errors::StoreError;
use crate::storage::{DIARY_KEY, Store};

const INSIGHT_LENGTH: usize = 100;
const INSIGHT_SUFFIX: &str = "...";

/// Summary of an accepted diagnosis, as kept in the diary.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiaryEntry {
    /// Creation time in epoch milliseconds, rendered as a string
    pub id: String,
    /// Localized creation date
    pub date: String,
    /// The analysed image, base64 without a data-URL header
    pub image_base64: String,
    pub health_score: u8,
    /// Leading excerpt of the quantitative analysis
    pub insight: String,
}

pub fn insight_excerpt(analysis: &str) -> String {
    let mut insight: String = analysis.chars().take(INSIGHT_LENGTH).collect();
    insight.push_str(INSIGHT_SUFFIX);
    insight
}

pub fn localized_date<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.format("%-m/%-d/%Y").to_string()
}

impl DiaryEntry {
    pub fn from_diagnosis<Tz: TimeZone>(
        image_base64: &str,
        diagnosis: &DiagnosisResult,
        created_at: &DateTime<Tz>,
    ) -> Self
    where
        Tz::Offset: std::fmt::Display,
    {
        Self {
            id: created_at.timestamp_millis().to_string(),
            date: localized_date(created_at),
            image_base64: image_base64.to_string(),
            health_score: diagnosis.health_score,
            insight: insight_excerpt(&diagnosis.mathematical_analysis),
        }
    }

    /// Creation time recovered from the id, when the id is time based.
    pub fn created_at(&self) -> Option<DateTime<Local>> {
        self.id
            .parse::<i64>()
            .ok()
            .and_then(|millis| Local.timestamp_millis_opt(millis).single())
    }
}

/// Insertion-ordered log of accepted diagnoses.
///
/// The whole collection is written back under a single key after every
/// append. There is no update or delete path and no size cap.
pub struct DiaryStore {
    store: Store,
    entries: Vec<DiaryEntry>,
}

impl DiaryStore {
    /// Reads the persisted collection. A missing key is an empty diary.
    #[instrument(name = "diary-load", skip_all)]
    pub fn load(store: Store) -> Result<Self, StoreError> {
        let entries: Vec<DiaryEntry> = store.get_json(DIARY_KEY)?.unwrap_or_default();
        tracing::debug!(entries = entries.len(), "Loaded diary");
        Ok(Self { store, entries })
    }

    pub fn entries(&self) -> &[DiaryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in reverse insertion order, as shown in the diary view.
    pub fn newest_first(&self) -> impl Iterator<Item = &DiaryEntry> {
        self.entries.iter().rev()
    }

    pub fn latest(&self) -> Option<&DiaryEntry> {
        self.entries.last()
    }

    pub fn find(&self, id: &str) -> Option<&DiaryEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Appends and immediately persists the full collection. The in-memory
    /// state only changes once the write succeeded.
    #[instrument(name = "diary-append", skip_all, fields(id = %entry.id))]
    pub fn append(&mut self, entry: DiaryEntry) -> Result<(), StoreError> {
        self.entries.push(entry);
        if let Err(e) = self.store.put_json(DIARY_KEY, &self.entries) {
            self.entries.pop();
            return Err(e);
        }
        Ok(())
    }

    /// Builds an entry for a plant-positive diagnosis and appends it.
    /// Non-plant diagnoses leave the diary untouched.
    pub fn record(
        &mut self,
        image_base64: &str,
        diagnosis: &DiagnosisResult,
    ) -> Result<Option<&DiaryEntry>, StoreError> {
        self.record_at(image_base64, diagnosis, &Local::now())
    }

    pub fn record_at<Tz: TimeZone>(
        &mut self,
        image_base64: &str,
        diagnosis: &DiagnosisResult,
        created_at: &DateTime<Tz>,
    ) -> Result<Option<&DiaryEntry>, StoreError>
    where
        Tz::Offset: std::fmt::Display,
    {
        if !diagnosis.is_plant {
            return Ok(None);
        }

        let mut entry = DiaryEntry::from_diagnosis(image_base64, diagnosis, created_at);
        entry.id = self.unique_id(created_at.timestamp_millis());
        self.append(entry)?;
        Ok(self.entries.last())
    }

    fn unique_id(&self, millis: i64) -> String {
        let newest = self
            .entries
            .iter()
            .filter_map(|e| e.id.parse::<i64>().ok())
            .max();
        match newest {
            Some(newest) if newest >= millis => (newest + 1).to_string(),
            _ => millis.to_string(),
        }
    }
}
