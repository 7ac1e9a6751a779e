use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::trip::TripRecord;

/// Parsed records of one upload. Never changes after creation.
#[derive(Debug)]
pub struct Session {
    id: Uuid,
    source_filename: String,
    uploaded_at: DateTime<Utc>,
    records: Vec<TripRecord>,
    // Lower-cased display fields, parallel to `records`.
    search_index: Vec<Vec<String>>,
}

impl Session {
    pub fn new(
        id: Uuid,
        source_filename: String,
        uploaded_at: DateTime<Utc>,
        records: Vec<TripRecord>,
    ) -> Self {
        let search_index = records
            .iter()
            .map(|record| {
                record
                    .display_fields()
                    .into_iter()
                    .map(|field| field.to_lowercase())
                    .collect()
            })
            .collect();
        Self {
            id,
            source_filename,
            uploaded_at,
            records,
            search_index,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn source_filename(&self) -> &str {
        &self.source_filename
    }

    pub fn uploaded_at(&self) -> DateTime<Utc> {
        self.uploaded_at
    }

    pub fn records(&self) -> &[TripRecord] {
        &self.records
    }

    pub fn total_records(&self) -> usize {
        self.records.len()
    }

    /// Records paired with their lower-cased display fields.
    pub fn indexed_records(&self) -> impl Iterator<Item = (&TripRecord, &[String])> {
        self.records
            .iter()
            .zip(self.search_index.iter().map(Vec::as_slice))
    }

    pub fn info(&self) -> SessionInfo {
        SessionInfo {
            filename: self.source_filename.clone(),
            uploaded_at: self.uploaded_at,
            total_records: self.total_records(),
        }
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            session_id: self.id,
            filename: self.source_filename.clone(),
            uploaded_at: self.uploaded_at,
            total_records: self.total_records(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub filename: String,
    pub uploaded_at: DateTime<Utc>,
    pub total_records: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub session_id: Uuid,
    pub filename: String,
    pub uploaded_at: DateTime<Utc>,
    pub total_records: usize,
}
