//! Paging and searching over one session's records.

use crate::{
    error::AppError,
    models::{
        query::{DataQuery, QueryResult, DEFAULT_PER_PAGE, MAX_PER_PAGE},
        session::Session,
    },
};

/// Validated query parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryParams {
    pub page: u32,
    pub per_page: u32,
    pub search: Option<String>,
}

impl Default for QueryParams {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: DEFAULT_PER_PAGE,
            search: None,
        }
    }
}

impl TryFrom<DataQuery> for QueryParams {
    type Error = AppError;

    fn try_from(query: DataQuery) -> Result<Self, Self::Error> {
        let page = query.page.unwrap_or(1);
        if page == 0 {
            return Err(AppError::Validation(
                "Paginanummer moet minimaal 1 zijn".into(),
            ));
        }
        let per_page = query.per_page.unwrap_or(DEFAULT_PER_PAGE);
        if !(1..=MAX_PER_PAGE).contains(&per_page) {
            return Err(AppError::Validation(format!(
                "Aantal per pagina moet tussen 1 en {MAX_PER_PAGE} liggen"
            )));
        }
        let search = query
            .search
            .map(|term| term.trim().to_string())
            .filter(|term| !term.is_empty());
        Ok(Self {
            page,
            per_page,
            search,
        })
    }
}

pub fn query(session: &Session, params: &QueryParams) -> QueryResult {
    let needle = params.search.as_deref().map(str::to_lowercase);
    let matches: Vec<_> = session
        .indexed_records()
        .filter(|(_, fields)| match &needle {
            Some(needle) => fields.iter().any(|field| field.contains(needle.as_str())),
            None => true,
        })
        .map(|(record, _)| record)
        .collect();

    let per_page = params.per_page.max(1) as usize;
    let total_matches = matches.len();
    let total_pages = total_matches.div_ceil(per_page).max(1);
    let start = (params.page.max(1) as usize - 1).saturating_mul(per_page);
    let records = matches
        .into_iter()
        .skip(start)
        .take(per_page)
        .cloned()
        .collect();

    QueryResult {
        page: params.page,
        per_page: params.per_page,
        total_matches,
        total_pages,
        records,
    }
}
