//! Client-side driver for the upload → view → search/page → download flow.
//!
//! The [`Orchestrator`] holds the view state and talks to the service through
//! a [`Backend`]. Queries are issued in two steps so several can be in flight:
//! `begin_*` hands out a [`QueryTicket`] stamped with a generation number, and
//! [`Orchestrator::apply`] only accepts the outcome of the newest ticket.

pub mod http;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
    models::query::{DataResponse, UploadResponse, DEFAULT_PER_PAGE},
    services::{export::output_filename, parser::ensure_trip_log_filename},
};

pub use self::http::HttpBackend;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClientError {
    #[error("{0}")]
    Validation(String),
    /// Transport failure; the detail is kept for logs, users see a generic text.
    #[error("Netwerkfout: Kan geen verbinding maken met de server")]
    Network(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Export(String),
    #[error("{message}")]
    Server { status: u16, message: String },
    #[error("Deze actie is nu niet beschikbaar")]
    InvalidState,
}

#[async_trait]
pub trait Backend: Send + Sync + 'static {
    async fn upload(&self, filename: &str, bytes: Vec<u8>) -> Result<UploadResponse, ClientError>;

    async fn fetch_page(
        &self,
        session_id: Uuid,
        page: u32,
        per_page: u32,
        search: Option<&str>,
    ) -> Result<DataResponse, ClientError>;

    async fn download(&self, session_id: Uuid) -> Result<Vec<u8>, ClientError>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum View {
    Idle,
    Uploading { filename: String },
    Viewing(Viewing),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Viewing {
    pub session_id: Uuid,
    pub filename: String,
    pub page: u32,
    pub search: String,
    /// Latest accepted page of data, if any has arrived yet.
    pub data: Option<DataResponse>,
}

impl Viewing {
    pub fn total_pages(&self) -> usize {
        self.data
            .as_ref()
            .map(|data| data.pagination.total_pages)
            .unwrap_or(1)
    }

    pub fn has_next_page(&self) -> bool {
        (self.page as usize) < self.total_pages()
    }

    pub fn has_previous_page(&self) -> bool {
        self.page > 1
    }
}

#[derive(Debug, Clone)]
pub struct Download {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// A query that has been issued but not yet sent.
pub struct QueryTicket<B> {
    backend: Arc<B>,
    generation: u64,
    session_id: Uuid,
    page: u32,
    per_page: u32,
    search: String,
}

impl<B: Backend> QueryTicket<B> {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub async fn run(self) -> QueryOutcome {
        let search = Some(self.search.as_str()).filter(|term| !term.is_empty());
        let result = self
            .backend
            .fetch_page(self.session_id, self.page, self.per_page, search)
            .await;
        QueryOutcome {
            generation: self.generation,
            result,
        }
    }
}

#[derive(Debug)]
pub struct QueryOutcome {
    pub generation: u64,
    pub result: Result<DataResponse, ClientError>,
}

pub struct Orchestrator<B> {
    backend: Arc<B>,
    view: View,
    error: Option<String>,
    generation: u64,
    per_page: u32,
}

impl<B: Backend> Orchestrator<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend: Arc::new(backend),
            view: View::Idle,
            error: None,
            generation: 0,
            per_page: DEFAULT_PER_PAGE,
        }
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn viewing(&self) -> Option<&Viewing> {
        match &self.view {
            View::Viewing(viewing) => Some(viewing),
            _ => None,
        }
    }

    /// Error overlay shown on top of whatever view is active.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Uploads a file and switches to viewing its first page.
    ///
    /// Files without the expected extension are rejected here, without
    /// contacting the service. A failure while loading the first page leaves
    /// the view on the new session with the error overlaid.
    pub async fn upload(&mut self, filename: &str, bytes: Vec<u8>) -> Result<(), ClientError> {
        if !matches!(self.view, View::Idle) {
            return Err(ClientError::InvalidState);
        }
        if let Err(err) = ensure_trip_log_filename(filename) {
            let err = ClientError::Validation(err.to_string());
            self.error = Some(err.to_string());
            return Err(err);
        }

        self.view = View::Uploading {
            filename: filename.to_string(),
        };
        self.error = None;

        match self.backend.upload(filename, bytes).await {
            Ok(uploaded) => {
                debug!(session_id = %uploaded.session_id, "upload accepted");
                self.view = View::Viewing(Viewing {
                    session_id: uploaded.session_id,
                    filename: uploaded.filename,
                    page: 1,
                    search: String::new(),
                    data: None,
                });
                // The first page's failure is already on the error overlay.
                if let Err(err) = self.refresh().await {
                    debug!("first page after upload failed: {err:?}");
                }
                Ok(())
            }
            Err(err) => {
                warn!("upload failed: {err:?}");
                self.view = View::Idle;
                self.error = Some(err.to_string());
                Err(err)
            }
        }
    }

    pub fn begin_page(&mut self, page: u32) -> Result<QueryTicket<B>, ClientError> {
        if page == 0 {
            return Err(ClientError::Validation(
                "Paginanummer moet minimaal 1 zijn".into(),
            ));
        }
        self.begin(|viewing| viewing.page = page)
    }

    /// A new search always starts at the first page.
    pub fn begin_search(&mut self, term: &str) -> Result<QueryTicket<B>, ClientError> {
        let term = term.trim().to_string();
        self.begin(move |viewing| {
            viewing.search = term;
            viewing.page = 1;
        })
    }

    pub fn begin_refresh(&mut self) -> Result<QueryTicket<B>, ClientError> {
        self.begin(|_| {})
    }

    fn begin(
        &mut self,
        update: impl FnOnce(&mut Viewing),
    ) -> Result<QueryTicket<B>, ClientError> {
        let View::Viewing(viewing) = &mut self.view else {
            return Err(ClientError::InvalidState);
        };
        update(viewing);
        self.generation += 1;
        Ok(QueryTicket {
            backend: Arc::clone(&self.backend),
            generation: self.generation,
            session_id: viewing.session_id,
            page: viewing.page,
            per_page: self.per_page,
            search: viewing.search.clone(),
        })
    }

    /// Applies a finished query. Returns `false` when a newer query was issued
    /// in the meantime (or the view was left) and the outcome was dropped.
    pub fn apply(&mut self, outcome: QueryOutcome) -> bool {
        if outcome.generation != self.generation {
            debug!(
                stale = outcome.generation,
                latest = self.generation,
                "discarding superseded query result"
            );
            return false;
        }
        let View::Viewing(viewing) = &mut self.view else {
            return false;
        };
        match outcome.result {
            Ok(data) => {
                viewing.data = Some(data);
                self.error = None;
            }
            Err(err) => self.error = Some(err.to_string()),
        }
        true
    }

    pub async fn go_to_page(&mut self, page: u32) -> Result<(), ClientError> {
        let ticket = self.begin_page(page)?;
        self.finish(ticket).await
    }

    pub async fn search(&mut self, term: &str) -> Result<(), ClientError> {
        let ticket = self.begin_search(term)?;
        self.finish(ticket).await
    }

    pub async fn refresh(&mut self) -> Result<(), ClientError> {
        let ticket = self.begin_refresh()?;
        self.finish(ticket).await
    }

    async fn finish(&mut self, ticket: QueryTicket<B>) -> Result<(), ClientError> {
        let outcome = ticket.run().await;
        let failure = outcome.result.as_ref().err().cloned();
        self.apply(outcome);
        failure.map_or(Ok(()), Err)
    }

    /// Fetches the spreadsheet for the whole session. Page and search stay as they are.
    pub async fn download(&mut self) -> Result<Download, ClientError> {
        let Some(viewing) = self.viewing() else {
            return Err(ClientError::InvalidState);
        };
        let session_id = viewing.session_id;
        let filename = output_filename(&viewing.filename);

        match self.backend.download(session_id).await {
            Ok(bytes) => {
                self.error = None;
                Ok(Download { filename, bytes })
            }
            Err(err) => {
                self.error = Some(err.to_string());
                Err(err)
            }
        }
    }

    /// Leaves the session view. The session itself lives on server-side until evicted.
    pub fn back(&mut self) {
        self.generation += 1;
        self.view = View::Idle;
        self.error = None;
    }
}
