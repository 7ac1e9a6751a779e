use serde::{Deserialize, Serialize};
use serde_with::{serde_as, NoneAsEmptyString};
use uuid::Uuid;

use super::{
    session::{SessionInfo, SessionSummary},
    trip::TripRecord,
};

pub const DEFAULT_PER_PAGE: u32 = 20;
pub const MAX_PER_PAGE: u32 = 500;

/// Query string of `GET /data/{sessionId}`.
#[serde_as]
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataQuery {
    pub page: Option<u32>,
    #[serde(alias = "per_page")]
    pub per_page: Option<u32>,
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    pub search: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    pub page: u32,
    pub per_page: u32,
    pub total_matches: usize,
    pub total_pages: usize,
    pub records: Vec<TripRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
    pub total: usize,
    pub total_pages: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataResponse {
    pub data: Vec<TripRecord>,
    pub pagination: Pagination,
    pub session_info: SessionInfo,
}

impl DataResponse {
    pub fn new(result: QueryResult, session_info: SessionInfo) -> Self {
        Self {
            pagination: Pagination {
                page: result.page,
                per_page: result.per_page,
                total: result.total_matches,
                total_pages: result.total_pages,
            },
            data: result.records,
            session_info,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub session_id: Uuid,
    pub filename: String,
    pub uploaded_at: chrono::DateTime<chrono::Utc>,
    pub total_records: usize,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionList {
    pub sessions: Vec<SessionSummary>,
}
