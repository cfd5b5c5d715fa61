use common::Article;
use serde::Serialize;

use crate::pipeline::FetchOutcome;
use crate::request::EndpointLabel;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchStatus {
    #[default]
    Idle,
    Loading,
    Success,
    Error,
}

/// What the presentation layer renders. Replaced wholesale on every commit.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FetchState {
    pub status: FetchStatus,
    pub endpoint: Option<EndpointLabel>,
    pub error: Option<String>,
    pub articles: Vec<Article>,
    pub total_results: u64,
    pub page: u32,
    pub page_size: u32,
}

impl FetchState {
    pub(crate) fn begin_loading(&mut self) {
        self.status = FetchStatus::Loading;
        self.error = None;
        self.endpoint = None;
    }

    pub(crate) fn succeed(&mut self, outcome: FetchOutcome, page: u32, page_size: u32) {
        *self = FetchState {
            status: FetchStatus::Success,
            endpoint: Some(outcome.endpoint),
            error: None,
            articles: outcome.page.articles,
            total_results: outcome.page.total_results,
            page,
            page_size,
        };
    }

    pub(crate) fn fail(&mut self, message: String, endpoint: EndpointLabel, page: u32, page_size: u32) {
        *self = FetchState {
            status: FetchStatus::Error,
            endpoint: Some(endpoint),
            error: Some(message),
            articles: Vec::new(),
            total_results: 0,
            page,
            page_size,
        };
    }

    pub fn is_loading(&self) -> bool {
        self.status == FetchStatus::Loading
    }
}

/// Page controls derived from the current result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub page: u32,
    pub total_pages: u32,
    pub has_prev: bool,
    pub has_next: bool,
}

/// `max(1, ceil(total / page_size))`
pub fn total_pages(total_results: u64, page_size: u32) -> u32 {
    let page_size = u64::from(page_size.max(1));
    let pages = total_results.div_ceil(page_size).max(1);
    u32::try_from(pages).unwrap_or(u32::MAX)
}

impl Pagination {
    pub fn new(page: u32, total_results: u64, page_size: u32) -> Self {
        let total_pages = total_pages(total_results, page_size);
        Pagination {
            page,
            total_pages,
            has_prev: page > 1,
            has_next: page < total_pages,
        }
    }

    /// Clamp a requested page into `[1, total_pages]`.
    pub fn clamp(&self, page: u32) -> u32 {
        page.clamp(1, self.total_pages)
    }
}
