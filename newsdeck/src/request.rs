use chrono::{DateTime, Duration, Months, SecondsFormat, Utc};
use common::{NewsMode, QueryParams};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Sort order offered for search results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    #[default]
    #[serde(rename = "publishedAt")]
    PublishedAt,
    #[serde(rename = "relevancy")]
    Relevancy,
    #[serde(rename = "popularity")]
    Popularity,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::PublishedAt => "publishedAt",
            SortOrder::Relevancy => "relevancy",
            SortOrder::Popularity => "popularity",
        }
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "publishedAt" => Ok(SortOrder::PublishedAt),
            "relevancy" => Ok(SortOrder::Relevancy),
            "popularity" => Ok(SortOrder::Popularity),
            other => Err(format!(
                "unknown sort order '{}' (expected publishedAt, relevancy or popularity)",
                other
            )),
        }
    }
}

/// Date-range bucket for search results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateRange {
    Today,
    Week,
    Month,
    #[default]
    All,
}

impl DateRange {
    /// Lower bound for `from`, computed from `now` without touching it.
    pub fn lower_bound(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            DateRange::Today => Some(now - Duration::days(1)),
            DateRange::Week => Some(now - Duration::days(7)),
            DateRange::Month => now.checked_sub_months(Months::new(1)),
            DateRange::All => None,
        }
    }
}

impl FromStr for DateRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "today" => Ok(DateRange::Today),
            "week" => Ok(DateRange::Week),
            "month" => Ok(DateRange::Month),
            "all" => Ok(DateRange::All),
            other => Err(format!(
                "unknown date range '{}' (expected today, week, month or all)",
                other
            )),
        }
    }
}

/// Which upstream route produced the data on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndpointLabel {
    #[serde(rename = "top-headlines")]
    TopHeadlines,
    #[serde(rename = "everything")]
    Everything,
    #[serde(rename = "everything(fallback)")]
    EverythingFallback,
}

impl EndpointLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            EndpointLabel::TopHeadlines => "top-headlines",
            EndpointLabel::Everything => "everything",
            EndpointLabel::EverythingFallback => "everything(fallback)",
        }
    }

    pub fn is_browse(&self) -> bool {
        matches!(self, EndpointLabel::TopHeadlines)
    }
}

impl From<NewsMode> for EndpointLabel {
    fn from(mode: NewsMode) -> Self {
        match mode {
            NewsMode::TopHeadlines => EndpointLabel::TopHeadlines,
            NewsMode::Everything => EndpointLabel::Everything,
        }
    }
}

impl fmt::Display for EndpointLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request to the proxy: encoded query string plus the label it will carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyRequest {
    pub endpoint: EndpointLabel,
    pub query: String,
}

/// Everything the user can change on screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewParams {
    pub search_text: String,
    pub sort_by: SortOrder,
    pub date_range: DateRange,
    /// Empty means no language filter
    pub language: String,
    pub category: String,
    pub country: String,
    pub page: u32,
    pub page_size: u32,
}

impl ViewParams {
    pub fn mode(&self) -> NewsMode {
        if self.search_text.trim().is_empty() {
            NewsMode::TopHeadlines
        } else {
            NewsMode::Everything
        }
    }

    fn paging(&self) -> QueryParams {
        QueryParams {
            page: Some(self.page.to_string()),
            page_size: Some(self.page_size.to_string()),
            ..Default::default()
        }
    }

    fn language(&self) -> Option<String> {
        let language = self.language.trim();
        (!language.is_empty()).then(|| language.to_string())
    }

    /// Query for the current screen. Search never carries country/category,
    /// browse never carries q/language/from.
    pub fn to_query(&self, now: DateTime<Utc>) -> QueryParams {
        let mut query = self.paging();
        match self.mode() {
            NewsMode::Everything => {
                query.q = Some(self.search_text.trim().to_string());
                query.sort_by = Some(self.sort_by.as_str().to_string());
                query.from = self
                    .date_range
                    .lower_bound(now)
                    .map(|ts| ts.to_rfc3339_opts(SecondsFormat::Millis, true));
                query.language = self.language();
            }
            NewsMode::TopHeadlines => {
                query.country = Some(self.country.clone());
                query.category = Some(self.category.clone());
            }
        }
        query
    }

    /// Primary request. Deterministic for a given `now`.
    pub fn primary_request(&self, now: DateTime<Utc>) -> ProxyRequest {
        ProxyRequest {
            endpoint: self.mode().into(),
            query: self.to_query(now).to_query_string(),
        }
    }

    /// Search for the category name, same paging and language.
    pub fn fallback_request(&self) -> ProxyRequest {
        let mut query = self.paging();
        query.q = Some(self.category.clone());
        query.sort_by = Some(SortOrder::PublishedAt.as_str().to_string());
        query.language = self.language();

        ProxyRequest {
            endpoint: EndpointLabel::EverythingFallback,
            query: query.to_query_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn params() -> ViewParams {
        ViewParams {
            search_text: String::new(),
            sort_by: SortOrder::PublishedAt,
            date_range: DateRange::All,
            language: "en".into(),
            category: "general".into(),
            country: "in".into(),
            page: 1,
            page_size: 18,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 31, 12, 0, 0).unwrap()
    }

    #[test]
    fn browse_request_has_no_language_or_q() {
        let req = params().primary_request(now());
        assert_eq!(req.endpoint, EndpointLabel::TopHeadlines);
        assert_eq!(req.query, "page=1&pageSize=18&country=in&category=general");
        let p = QueryParams::from_query_str(&req.query);
        assert!(p.language.is_none());
        assert!(p.q.is_none());
        assert!(p.from.is_none());
    }

    #[test]
    fn search_request_has_no_country_or_category() {
        let mut view = params();
        view.search_text = " election ".into();
        view.date_range = DateRange::Week;

        let req = view.primary_request(now());
        assert_eq!(req.endpoint, EndpointLabel::Everything);
        let p = QueryParams::from_query_str(&req.query);
        assert_eq!(p.q.as_deref(), Some("election"));
        assert_eq!(p.sort_by.as_deref(), Some("publishedAt"));
        assert_eq!(p.from.as_deref(), Some("2024-03-24T12:00:00.000Z"));
        assert_eq!(p.language.as_deref(), Some("en"));
        assert!(p.country.is_none());
        assert!(p.category.is_none());
    }

    #[test]
    fn whitespace_search_text_browses() {
        let mut view = params();
        view.search_text = "  \t".into();
        assert_eq!(view.mode(), NewsMode::TopHeadlines);
        assert_eq!(view.primary_request(now()).endpoint, EndpointLabel::TopHeadlines);
    }

    #[test]
    fn same_params_same_request() {
        let mut view = params();
        view.search_text = "monsoon".into();
        view.date_range = DateRange::Today;
        assert_eq!(view.primary_request(now()), view.clone().primary_request(now()));
    }

    #[test]
    fn date_buckets_are_pure() {
        let t = now();
        assert_eq!(
            DateRange::Today.lower_bound(t),
            Some(Utc.with_ymd_and_hms(2024, 3, 30, 12, 0, 0).unwrap())
        );
        assert_eq!(
            DateRange::Week.lower_bound(t),
            Some(Utc.with_ymd_and_hms(2024, 3, 24, 12, 0, 0).unwrap())
        );
        // One calendar month back from Mar 31 clamps to Feb 29 (leap year)
        assert_eq!(
            DateRange::Month.lower_bound(t),
            Some(Utc.with_ymd_and_hms(2024, 2, 29, 12, 0, 0).unwrap())
        );
        assert_eq!(DateRange::All.lower_bound(t), None);
        // `now` itself is unchanged by the computation
        assert_eq!(t, now());
    }

    #[test]
    fn fallback_searches_the_category() {
        let mut view = params();
        view.page = 2;
        let req = view.fallback_request();
        assert_eq!(req.endpoint, EndpointLabel::EverythingFallback);
        assert_eq!(
            req.query,
            "page=2&pageSize=18&q=general&sortBy=publishedAt&language=en"
        );
    }

    #[test]
    fn parse_sort_and_range() {
        assert_eq!("relevancy".parse::<SortOrder>(), Ok(SortOrder::Relevancy));
        assert!("newest".parse::<SortOrder>().is_err());
        assert_eq!("month".parse::<DateRange>(), Ok(DateRange::Month));
        assert!("year".parse::<DateRange>().is_err());
    }
}
