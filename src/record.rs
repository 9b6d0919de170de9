//! The tabular record schema shared by checkpoints, resume files and the final dataset.

use serde::{Deserialize, Deserializer, Serialize};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

/// Author sentinel used when the source omits the field.
pub const UNKNOWN_AUTHOR: &str = "unknown";

/// Post vs. nested reply. Serialized as `post` / `reply`; `comment` is accepted on read.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Post,
    #[serde(alias = "comment")]
    Reply,
}

/// One normalized unit of collected content.
///
/// Column aliases let a dataset written by the older collector be resumed as-is.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRecord {
    #[serde(alias = "type")]
    pub kind: ItemKind,
    #[serde(default)]
    pub title: String,
    #[serde(default, alias = "text")]
    pub body: String,
    #[serde(default)]
    pub combined_text: String,
    #[serde(default = "unknown_author", deserialize_with = "author_or_unknown")]
    pub author: String,
    #[serde(default)]
    pub score: i64,
    #[serde(default, alias = "num_comments")]
    pub reply_count: i64,
    #[serde(default, alias = "url")]
    pub source_url: String,
    #[serde(default, alias = "search_query")]
    pub query: String,
    #[serde(default, alias = "subreddit")]
    pub community: String,
    #[serde(default, alias = "date_scraped")]
    pub collected_at: String,
}

fn unknown_author() -> String {
    UNKNOWN_AUTHOR.to_string()
}

/// Blank author cells (older datasets wrote missing authors as empty) read as unknown.
fn author_or_unknown<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    let s = String::deserialize(d)?;
    Ok(if s.trim().is_empty() { unknown_author() } else { s })
}

impl ItemRecord {
    /// Text length in Unicode scalar values (what the 30-char floor is measured in).
    #[inline]
    pub fn text_len(&self) -> usize {
        self.combined_text.chars().count()
    }
}

/// A finalized row: the record columns plus the two derived analysis columns.
/// Written flat (csv rows cannot carry nested structs).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalRecord {
    pub kind: ItemKind,
    pub title: String,
    pub body: String,
    pub combined_text: String,
    pub author: String,
    pub score: i64,
    pub reply_count: i64,
    pub source_url: String,
    pub query: String,
    pub community: String,
    pub collected_at: String,
    pub text_length: usize,
    pub has_metaphor_signal: bool,
}

impl FinalRecord {
    pub fn from_record(rec: ItemRecord, has_metaphor_signal: bool) -> Self {
        let text_length = rec.text_len();
        Self {
            kind: rec.kind,
            title: rec.title,
            body: rec.body,
            combined_text: rec.combined_text,
            author: rec.author,
            score: rec.score,
            reply_count: rec.reply_count,
            source_url: rec.source_url,
            query: rec.query,
            community: rec.community,
            collected_at: rec.collected_at,
            text_length,
            has_metaphor_signal,
        }
    }
}

/// RFC 3339 UTC stamp for `collected_at`.
pub fn now_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| OffsetDateTime::UNIX_EPOCH.to_string())
}
