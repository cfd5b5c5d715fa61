//! Plain-text rendering of the fetch state for the terminal front-end.

use common::Article;
use std::fmt::Write;

use crate::state::{FetchState, FetchStatus, Pagination};

pub fn render_card(article: &Article) -> String {
    let mut out = String::new();
    let title = match article.title() {
        "" => "(untitled)",
        t => t,
    };
    let _ = writeln!(out, "* {}", title);
    if let Some(source) = article.source_name() {
        let _ = writeln!(out, "  [{}]", source);
    }
    if let Some(description) = article.description.as_deref().filter(|d| !d.is_empty()) {
        let _ = writeln!(out, "  {}", description);
    }
    let _ = writeln!(
        out,
        "  By {} • {}",
        article.author_or_unknown(),
        article.published_display()
    );
    let _ = writeln!(out, "  {}", article.url);
    out
}

/// Header, body for the current status and page controls.
pub fn render_state(heading: &str, state: &FetchState, pagination: &Pagination) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", heading);

    let source = state
        .endpoint
        .map(|e| format!("Source: {}", e))
        .unwrap_or_else(|| "Fetching the freshest stories".to_string());
    if state.total_results > 0 {
        let _ = writeln!(out, "{} • {} results\n", source, state.total_results);
    } else {
        let _ = writeln!(out, "{}\n", source);
    }

    if state.is_loading() {
        let _ = writeln!(out, "Curating the latest news...");
        return out;
    }

    match state.status {
        FetchStatus::Idle | FetchStatus::Loading => {
            let _ = writeln!(out, "Nothing fetched yet");
        }
        FetchStatus::Error => {
            let _ = writeln!(out, "We hit a snag fetching stories");
            let _ = writeln!(out, "  {}", state.error.as_deref().unwrap_or_default());
        }
        FetchStatus::Success if state.articles.is_empty() => {
            let _ = writeln!(out, "No stories found");
            let _ = writeln!(out, "Try a different query, category, or region");
        }
        FetchStatus::Success => {
            for article in &state.articles {
                let _ = writeln!(out, "{}", render_card(article));
            }
            if pagination.total_pages > 1 {
                let _ = writeln!(out, "Page {} of {}", pagination.page, pagination.total_pages);
            }
        }
    }
    out
}
