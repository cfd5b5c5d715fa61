//! Fetch cycle as explicit steps: primary fetch, decision on the result,
//! optional fallback fetch. The orchestrator checks its generation token
//! between steps.

use common::ArticlePage;
use tracing::{info, warn};

use crate::request::{EndpointLabel, ProxyRequest, ViewParams};
use crate::source::{FetchError, NewsSource};

/// Data to show plus the label of the route that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchOutcome {
    pub page: ArticlePage,
    pub endpoint: EndpointLabel,
}

/// What to do with a primary result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Accept,
    Fallback(ProxyRequest),
}

pub async fn primary(
    source: &dyn NewsSource,
    request: &ProxyRequest,
) -> Result<FetchOutcome, FetchError> {
    let page = source.fetch(request).await?;
    Ok(FetchOutcome {
        page,
        endpoint: request.endpoint,
    })
}

/// A browse result with zero total results falls back to searching the category.
pub fn decide(params: &ViewParams, outcome: &FetchOutcome) -> Decision {
    if outcome.endpoint.is_browse() && outcome.page.total_results == 0 {
        Decision::Fallback(params.fallback_request())
    } else {
        Decision::Accept
    }
}

/// Run the fallback once. Its failure is logged and the primary outcome kept.
pub async fn fallback(
    source: &dyn NewsSource,
    primary: FetchOutcome,
    request: &ProxyRequest,
) -> FetchOutcome {
    match source.fetch(request).await {
        Ok(page) => {
            info!(
                total_results = page.total_results,
                query = %request.query,
                "browse returned nothing, using search fallback"
            );
            FetchOutcome {
                page,
                endpoint: request.endpoint,
            }
        }
        Err(e) => {
            warn!(error = %e, "fallback search failed, keeping empty browse result");
            primary
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::QueryParams;

    fn browse_params() -> ViewParams {
        ViewParams {
            search_text: String::new(),
            sort_by: Default::default(),
            date_range: Default::default(),
            language: "en".into(),
            category: "sports".into(),
            country: "us".into(),
            page: 2,
            page_size: 18,
        }
    }

    fn outcome(endpoint: EndpointLabel, total: u64) -> FetchOutcome {
        FetchOutcome {
            page: ArticlePage {
                total_results: total,
                ..Default::default()
            },
            endpoint,
        }
    }

    #[test]
    fn empty_browse_requests_fallback() {
        let params = browse_params();
        match decide(&params, &outcome(EndpointLabel::TopHeadlines, 0)) {
            Decision::Fallback(req) => {
                assert_eq!(req.endpoint, EndpointLabel::EverythingFallback);
                let query = QueryParams::from_query_str(&req.query);
                assert_eq!(query.q.as_deref(), Some("sports"));
                assert_eq!(query.page.as_deref(), Some("2"));
            }
            Decision::Accept => panic!("expected fallback"),
        }
    }

    #[test]
    fn search_and_non_empty_results_are_accepted() {
        let params = browse_params();
        assert_eq!(
            decide(&params, &outcome(EndpointLabel::TopHeadlines, 3)),
            Decision::Accept
        );
        assert_eq!(
            decide(&params, &outcome(EndpointLabel::Everything, 0)),
            Decision::Accept
        );
    }
}
