//! Pure mapping from Reddit listing payloads to `ItemRecord`s. No I/O.

use crate::error::FetchError;
use crate::record::{now_rfc3339, ItemKind, ItemRecord, UNKNOWN_AUTHOR};
use serde_json::Value;

/// Only the first N nested replies of a post are considered.
pub const MAX_REPLIES_PER_ITEM: usize = 20;
/// Replies shorter than this are not worth keeping.
pub const MIN_REPLY_CHARS: usize = 30;
/// Listing kind tag for a genuine comment.
const COMMENT_KIND: &str = "t1";
const TITLE_PREVIEW_CHARS: usize = 50;

/// Query context carried onto every record.
#[derive(Clone, Copy, Debug)]
pub struct QueryContext<'a> {
    pub query: &'a str,
    pub community: &'a str,
}

fn str_field(v: &Value, key: &str) -> String {
    v.get(key).and_then(|x| x.as_str()).unwrap_or_default().to_string()
}

fn int_field(v: &Value, key: &str) -> i64 {
    v.get(key)
        .and_then(|x| x.as_i64().or_else(|| x.as_f64().map(|f| f as i64)))
        .unwrap_or(0)
}

fn author_field(v: &Value) -> String {
    match v.get("author").and_then(|x| x.as_str()) {
        Some(a) if !a.is_empty() => a.to_string(),
        _ => UNKNOWN_AUTHOR.to_string(),
    }
}

/// Map a post's `data` object to a record.
pub fn post_record(data: &Value, base_url: &str, ctx: QueryContext<'_>) -> ItemRecord {
    let title = str_field(data, "title");
    let body = str_field(data, "selftext");
    let permalink = str_field(data, "permalink");
    ItemRecord {
        kind: ItemKind::Post,
        combined_text: format!("{} {}", title, body),
        title,
        body,
        author: author_field(data),
        score: int_field(data, "score"),
        reply_count: int_field(data, "num_comments"),
        source_url: format!("{}{}", base_url, permalink),
        query: ctx.query.to_string(),
        community: ctx.community.to_string(),
        collected_at: now_rfc3339(),
    }
}

/// Map a reply's `data` object to a record attached to its parent post.
pub fn reply_record(data: &Value, parent_title: &str, parent_url: &str, ctx: QueryContext<'_>) -> ItemRecord {
    let body = str_field(data, "body");
    let preview: String = parent_title.chars().take(TITLE_PREVIEW_CHARS).collect();
    ItemRecord {
        kind: ItemKind::Reply,
        title: format!("Comment on: {}...", preview),
        combined_text: body.clone(),
        body,
        author: author_field(data),
        score: int_field(data, "score"),
        reply_count: 0,
        source_url: parent_url.to_string(),
        query: ctx.query.to_string(),
        community: ctx.community.to_string(),
        collected_at: now_rfc3339(),
    }
}

/// Empty, removed-content sentinels, or too short.
pub fn is_unusable_reply_body(body: &str) -> bool {
    matches!(body, "" | "[deleted]" | "[removed]") || body.chars().count() < MIN_REPLY_CHARS
}

/// The `data` objects of a search listing (`{"data":{"children":[{"data":{..}}]}}`).
pub fn extract_posts(listing: &Value) -> Result<Vec<&Value>, FetchError> {
    let children = listing
        .pointer("/data/children")
        .and_then(|c| c.as_array())
        .ok_or_else(|| FetchError::Parse("search listing has no data.children array".into()))?;
    Ok(children.iter().filter_map(|c| c.get("data")).collect())
}

/// Replies from a post's `.json` payload (`[post_listing, comment_listing]`).
///
/// Fewer than two elements, or a missing comment listing, means "no replies".
pub fn extract_replies(
    payload: &Value,
    parent_title: &str,
    parent_url: &str,
    ctx: QueryContext<'_>,
) -> Vec<ItemRecord> {
    let Some(parts) = payload.as_array() else { return Vec::new() };
    if parts.len() < 2 {
        return Vec::new();
    }
    let Some(children) = parts[1].pointer("/data/children").and_then(|c| c.as_array()) else {
        return Vec::new();
    };

    children
        .iter()
        .take(MAX_REPLIES_PER_ITEM)
        .filter(|c| c.get("kind").and_then(|k| k.as_str()) == Some(COMMENT_KIND))
        .filter_map(|c| c.get("data"))
        .filter(|d| !is_unusable_reply_body(d.get("body").and_then(|b| b.as_str()).unwrap_or_default()))
        .map(|d| reply_record(d, parent_title, parent_url, ctx))
        .collect()
}
