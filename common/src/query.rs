use serde::{Deserialize, Serialize};
use std::fmt;

/// Upstream endpoint family a request resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NewsMode {
    /// Category + country listing ("top-headlines")
    TopHeadlines,
    /// Free-text search ("everything")
    Everything,
}

impl NewsMode {
    /// Path segment on the upstream API
    pub fn path(&self) -> &'static str {
        match self {
            NewsMode::TopHeadlines => "top-headlines",
            NewsMode::Everything => "everything",
        }
    }
}

impl fmt::Display for NewsMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Query parameters exchanged between the client and the proxy.
///
/// Every field is an optional string, mirroring the URL query string. Empty
/// strings are treated as unset by the accessors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryParams {
    pub country: Option<String>,
    pub category: Option<String>,
    pub page: Option<String>,
    pub page_size: Option<String>,
    pub q: Option<String>,
    pub sort_by: Option<String>,
    pub from: Option<String>,
    pub language: Option<String>,
}

impl QueryParams {
    /// Build from decoded key/value pairs. Unknown keys are ignored and the
    /// last occurrence of a repeated key wins.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut params = QueryParams::default();
        for (key, value) in pairs {
            let slot = match key.as_ref() {
                "country" => &mut params.country,
                "category" => &mut params.category,
                "page" => &mut params.page,
                "pageSize" => &mut params.page_size,
                "q" => &mut params.q,
                "sortBy" => &mut params.sort_by,
                "from" => &mut params.from,
                "language" => &mut params.language,
                _ => continue,
            };
            *slot = Some(value.into());
        }
        params
    }

    /// Parse an `application/x-www-form-urlencoded` query string (no leading `?`).
    pub fn from_query_str(query: &str) -> Self {
        Self::from_pairs(url::form_urlencoded::parse(query.as_bytes()).into_owned())
    }

    /// Trimmed search text, if any.
    pub fn search_text(&self) -> Option<&str> {
        non_empty(&self.q).map(str::trim).filter(|q| !q.is_empty())
    }

    /// Search mode when `q` has non-whitespace content, browse mode otherwise.
    pub fn mode(&self) -> NewsMode {
        if self.search_text().is_some() {
            NewsMode::Everything
        } else {
            NewsMode::TopHeadlines
        }
    }

    /// Set keys as (wire name, value) pairs in a fixed order:
    /// page, pageSize, q, sortBy, from, language, country, category.
    pub fn pairs(&self) -> Vec<(&'static str, &str)> {
        [
            ("page", &self.page),
            ("pageSize", &self.page_size),
            ("q", &self.q),
            ("sortBy", &self.sort_by),
            ("from", &self.from),
            ("language", &self.language),
            ("country", &self.country),
            ("category", &self.category),
        ]
        .into_iter()
        .filter_map(|(key, value)| non_empty(value).map(|v| (key, v)))
        .collect()
    }

    /// Encode the set keys as a query string. Same params, same string.
    pub fn to_query_string(&self) -> String {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (key, value) in self.pairs() {
            serializer.append_pair(key, value);
        }
        serializer.finish()
    }
}

/// Treat `Some("")` the same as `None`.
pub fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}
