use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::debug;

/// Shown when an article has no image.
pub const FALLBACK_IMAGE: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAQAAAC1HAwCAAAAC0lEQVR42mP8x8AAwMCAO1P5R8AAAAASUVORK5CYII=";

/// Publisher block of an upstream article
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArticleSource {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
}

/// Read-only article record as returned by the upstream API.
/// `url` doubles as the article's identity in a result list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    #[serde(default, deserialize_with = "lenient_source")]
    pub source: Option<ArticleSource>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub author: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: Option<String>,
    /// Empty when upstream sends null or no link
    #[serde(default, deserialize_with = "lenient_url")]
    pub url: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub url_to_image: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub published_at: Option<String>,
}

/// Strings pass through; null and any other JSON type become `None`.
fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        _ => None,
    })
}

fn lenient_url<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(lenient_string(deserializer)?.unwrap_or_default())
}

fn lenient_source<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<ArticleSource>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

impl Article {
    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or_default()
    }

    pub fn author_or_unknown(&self) -> &str {
        self.author
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .unwrap_or("Unknown")
    }

    pub fn image_or_fallback(&self) -> &str {
        self.url_to_image
            .as_deref()
            .filter(|u| !u.is_empty())
            .unwrap_or(FALLBACK_IMAGE)
    }

    pub fn source_name(&self) -> Option<&str> {
        self.source.as_ref().and_then(|s| s.name.as_deref())
    }

    pub fn published(&self) -> Option<DateTime<Utc>> {
        let raw = self.published_at.as_deref()?;
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|d| d.with_timezone(&Utc))
    }

    /// Local-time rendering of the publication date, or the raw value when it
    /// does not parse.
    pub fn published_display(&self) -> String {
        match self.published() {
            Some(ts) => ts.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string(),
            None => self.published_at.clone().unwrap_or_default(),
        }
    }
}

/// Article-list payload (`{status, totalResults, articles}`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticlePage {
    pub status: Option<String>,
    #[serde(default)]
    pub total_results: u64,
    #[serde(default)]
    pub articles: Vec<Article>,
}

impl ArticlePage {
    /// Lenient decode: a non-array `articles` becomes empty, a non-numeric
    /// `totalResults` becomes 0. Null or mistyped article fields become
    /// placeholders; only entries that are not objects are skipped.
    pub fn from_value(value: &Value) -> Self {
        let articles = value
            .get("articles")
            .and_then(|a| a.as_array())
            .map(|items| {
                items
                    .iter()
                    .enumerate()
                    .filter_map(|(index, item)| {
                        match serde_json::from_value::<Article>(item.clone()) {
                            Ok(article) => Some(article),
                            Err(e) => {
                                debug!(index, error = %e, "skipping malformed article entry");
                                None
                            }
                        }
                    })
                    .collect()
            })
            .unwrap_or_default();

        ArticlePage {
            status: value
                .get("status")
                .and_then(|s| s.as_str())
                .map(str::to_string),
            total_results: value
                .get("totalResults")
                .and_then(|t| t.as_u64())
                .unwrap_or(0),
            articles,
        }
    }
}
