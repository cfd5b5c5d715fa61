use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use common::QueryDefaults;
use tracing::{debug, info, warn};

use crate::pipeline::{self, Decision};
use crate::progress::{FetchObserver, NoopObserver};
use crate::request::{DateRange, SortOrder, ViewParams};
use crate::source::NewsSource;
use crate::state::{FetchState, Pagination};

/// Initial screen values. Built from the `[defaults]` config section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestratorConfig {
    pub country: String,
    pub category: String,
    pub page_size: u32,
    pub sort_by: SortOrder,
    pub date_range: DateRange,
    pub language: String,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self::from_defaults(&QueryDefaults::default())
    }
}

impl OrchestratorConfig {
    pub fn from_defaults(defaults: &QueryDefaults) -> Self {
        let sort_by = defaults.sort_by.parse().unwrap_or_else(|e| {
            warn!(error = %e, "invalid defaults.sort_by, using publishedAt");
            SortOrder::default()
        });
        Self {
            country: defaults.country.clone(),
            category: defaults.category.clone(),
            page_size: defaults.page_size.max(1),
            sort_by,
            date_range: DateRange::All,
            language: defaults.language.clone(),
        }
    }

    fn initial_params(&self) -> ViewParams {
        ViewParams {
            search_text: String::new(),
            sort_by: self.sort_by,
            date_range: self.date_range,
            language: self.language.clone(),
            category: self.category.clone(),
            country: self.country.clone(),
            page: 1,
            page_size: self.page_size,
        }
    }
}

struct Inner {
    params: ViewParams,
    state: FetchState,
    /// Bumped by every fetch; only the latest may commit.
    generation: u64,
}

/// Client-side owner of the fetch lifecycle and presentation state.
///
/// Setters re-fetch only when the constructed proxy request changes. At most
/// one fetch is current; results of superseded fetches are dropped.
pub struct Orchestrator {
    source: Arc<dyn NewsSource>,
    observer: Arc<dyn FetchObserver>,
    config: OrchestratorConfig,
    inner: Mutex<Inner>,
}

impl Orchestrator {
    pub fn new(source: Arc<dyn NewsSource>, config: OrchestratorConfig) -> Self {
        Self::with_observer(source, config, Arc::new(NoopObserver))
    }

    pub fn with_observer(
        source: Arc<dyn NewsSource>,
        config: OrchestratorConfig,
        observer: Arc<dyn FetchObserver>,
    ) -> Self {
        let params = config.initial_params();
        let state = FetchState {
            page: params.page,
            page_size: params.page_size,
            ..Default::default()
        };
        Self {
            source,
            observer,
            config,
            inner: Mutex::new(Inner {
                params,
                state,
                generation: 0,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn state(&self) -> FetchState {
        self.lock().state.clone()
    }

    pub fn params(&self) -> ViewParams {
        self.lock().params.clone()
    }

    pub fn pagination(&self) -> Pagination {
        let inner = self.lock();
        Pagination::new(
            inner.params.page,
            inner.state.total_results,
            inner.params.page_size,
        )
    }

    /// `Search Results: "<q>"` or `Top Headlines: <Category>`
    pub fn heading(&self) -> String {
        let params = self.params();
        let query = params.search_text.trim();
        if !query.is_empty() {
            return format!("Search Results: \"{}\"", query);
        }
        let mut chars = params.category.chars();
        let category: String = match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        };
        format!("Top Headlines: {}", category)
    }

    /// Run one fetch cycle against the current parameters and return the
    /// state afterwards. A cycle superseded mid-flight leaves state alone.
    pub async fn fetch(&self) -> FetchState {
        let (token, params) = {
            let mut inner = self.lock();
            inner.generation += 1;
            inner.state.begin_loading();
            self.observer.on_start(inner.generation);
            (inner.generation, inner.params.clone())
        };

        let primary_request = params.primary_request(Utc::now());
        info!(endpoint = %primary_request.endpoint, query = %primary_request.query, "fetching news");

        let result = match pipeline::primary(self.source.as_ref(), &primary_request).await {
            Ok(outcome) => match pipeline::decide(&params, &outcome) {
                Decision::Accept => Ok(outcome),
                Decision::Fallback(request) => {
                    if !self.is_current(token) {
                        debug!(token, "superseded before fallback, dropping");
                        return self.state();
                    }
                    Ok(pipeline::fallback(self.source.as_ref(), outcome, &request).await)
                }
            },
            Err(e) => Err(e),
        };

        let mut inner = self.lock();
        if inner.generation != token {
            debug!(token, current = inner.generation, "discarding stale fetch result");
            return inner.state.clone();
        }
        match result {
            Ok(outcome) => {
                inner.state.succeed(outcome, params.page, params.page_size);
            }
            Err(e) => {
                warn!(error = %e, "news fetch failed");
                inner.state.fail(
                    e.to_string(),
                    primary_request.endpoint,
                    params.page,
                    params.page_size,
                );
            }
        }
        // Under the lock: a newer fetch cannot start between commit and finish
        self.observer.on_finish(token);
        inner.state.clone()
    }

    fn is_current(&self, token: u64) -> bool {
        self.lock().generation == token
    }

    /// Apply `change`; fetch if the constructed request differs afterwards.
    async fn update(&self, change: impl FnOnce(&mut ViewParams)) -> FetchState {
        let now = Utc::now();
        let changed = {
            let mut inner = self.lock();
            let before = inner.params.primary_request(now);
            change(&mut inner.params);
            inner.params.primary_request(now) != before
        };
        if changed {
            self.fetch().await
        } else {
            self.state()
        }
    }

    pub async fn set_search_text(&self, text: impl Into<String>) -> FetchState {
        let text = text.into();
        self.update(|p| p.search_text = text).await
    }

    pub async fn set_sort_by(&self, sort_by: SortOrder) -> FetchState {
        self.update(|p| p.sort_by = sort_by).await
    }

    pub async fn set_date_range(&self, range: DateRange) -> FetchState {
        self.update(|p| p.date_range = range).await
    }

    pub async fn set_language(&self, language: impl Into<String>) -> FetchState {
        let language = language.into();
        self.update(|p| p.language = language).await
    }

    pub async fn set_category(&self, category: impl Into<String>) -> FetchState {
        let category = category.into();
        self.update(|p| {
            p.category = category;
            p.page = 1;
        })
        .await
    }

    pub async fn set_country(&self, country: impl Into<String>) -> FetchState {
        let country = country.into();
        self.update(|p| {
            p.country = country;
            p.page = 1;
        })
        .await
    }

    pub async fn set_page_size(&self, page_size: u32) -> FetchState {
        self.update(|p| {
            p.page_size = page_size.max(1);
            p.page = 1;
        })
        .await
    }

    /// Explicit submit: back to page 1 and always fetch.
    pub async fn submit_search(&self, text: impl Into<String>) -> FetchState {
        {
            let mut inner = self.lock();
            inner.params.search_text = text.into();
            inner.params.page = 1;
        }
        self.fetch().await
    }

    /// Search text, sort, date range and language back to defaults, page 1.
    pub async fn reset_filters(&self) -> FetchState {
        {
            let mut inner = self.lock();
            inner.params.search_text.clear();
            inner.params.sort_by = self.config.sort_by;
            inner.params.date_range = self.config.date_range;
            inner.params.language = self.config.language.clone();
            inner.params.page = 1;
        }
        self.fetch().await
    }

    /// Move to `page`, clamped to the known page range. No fetch when the
    /// clamped page is the current one.
    pub async fn go_to_page(&self, page: u32) -> FetchState {
        let target = self.pagination().clamp(page);
        self.update(|p| p.page = target).await
    }

    pub async fn next_page(&self) -> FetchState {
        let page = self.pagination().page.saturating_add(1);
        self.go_to_page(page).await
    }

    pub async fn prev_page(&self) -> FetchState {
        let page = self.pagination().page.saturating_sub(1);
        self.go_to_page(page).await
    }

    /// Re-issue the current request.
    pub async fn retry(&self) -> FetchState {
        self.fetch().await
    }
}
