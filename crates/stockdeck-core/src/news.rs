use serde_json::Value;

use crate::{NewsItem, SectionError, NOT_AVAILABLE};

/// Most articles kept per result.
pub const MAX_NEWS_ITEMS: usize = 5;

/// Reduce a news payload to at most [`MAX_NEWS_ITEMS`] normalized articles,
/// in provider order.
///
/// Individual articles never fail: absent text fields read `"N/A"` and an
/// absent image is `None`.
///
/// # Errors
///
/// [`SectionError::NewsUnavailable`] when the payload carries no `results`
/// array. An empty array is an empty digest, not an error.
pub fn digest(payload: &Value) -> Result<Vec<NewsItem>, SectionError> {
    let Some(results) = payload.get("results").and_then(Value::as_array) else {
        return Err(SectionError::NewsUnavailable {
            message: provider_message(payload)
                .unwrap_or_else(|| String::from("no news articles in response")),
        });
    };

    Ok(results
        .iter()
        .take(MAX_NEWS_ITEMS)
        .map(news_item)
        .collect())
}

fn news_item(article: &Value) -> NewsItem {
    NewsItem {
        published_at: text_or_na(article.get("published_utc")),
        title: text_or_na(article.get("title")),
        summary: text_or_na(article.get("description")),
        sentiment: text_or_na(
            article
                .get("insights")
                .and_then(Value::as_array)
                .and_then(|insights| insights.first())
                .and_then(|insight| insight.get("sentiment")),
        ),
        source_name: text_or_na(article.get("publisher").and_then(|p| p.get("name"))),
        image_url: non_empty(article.get("image_url")),
        article_url: non_empty(article.get("article_url")),
    }
}

fn text_or_na(value: Option<&Value>) -> String {
    value
        .and_then(Value::as_str)
        .map_or_else(|| String::from(NOT_AVAILABLE), str::to_owned)
}

fn non_empty(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .filter(|text| !text.trim().is_empty())
        .map(str::to_owned)
}

/// Error text a provider put in place of results, if any.
fn provider_message(payload: &Value) -> Option<String> {
    ["error", "message"]
        .iter()
        .find_map(|key| payload.get(*key).and_then(Value::as_str))
        .map(str::to_owned)
}
