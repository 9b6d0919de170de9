//! Source client: one search request per query plus one reply fetch per post.

use crate::cancel::CancelToken;
use crate::config::HarvestOptions;
use crate::error::FetchError;
use crate::normalize::{extract_posts, extract_replies, post_record, QueryContext};
use crate::query::{QuerySpec, MAX_PAGE_SIZE};
use crate::record::ItemRecord;
use serde_json::Value;
use std::time::Duration;

/// Fixed wait after each post (and its replies) is processed.
pub const ITEM_PACING: Duration = Duration::from_secs(2);

/// Anything that can turn a query into records.
///
/// `Ok(vec![])` means the query matched nothing; `Err` means the call failed.
/// Implementations must return `FetchError::Cancelled` if they stop because of `cancel`.
pub trait SourceClient {
    fn fetch_items(&self, spec: &QuerySpec, cancel: &CancelToken) -> Result<Vec<ItemRecord>, FetchError>;
}

/// Blocking client for the Reddit JSON search endpoints.
pub struct RedditClient {
    http: reqwest::blocking::Client,
    base_url: String,
    pacing: Duration,
}

impl RedditClient {
    pub fn new(opts: &HarvestOptions) -> Result<Self, FetchError> {
        let http = reqwest::blocking::Client::builder()
            .user_agent(opts.user_agent.clone())
            .timeout(opts.request_timeout)
            .build()?;
        Ok(Self { http, base_url: opts.base_url.clone(), pacing: ITEM_PACING })
    }

    fn get_json(&self, url: &str, params: &[(&str, String)]) -> Result<Value, FetchError> {
        let resp = self.http.get(url).query(params).send()?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status { status: status.as_u16(), url: url.to_string() });
        }
        let text = resp.text()?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Search one community. Returns the raw listing.
    pub fn search(&self, spec: &QuerySpec) -> Result<Value, FetchError> {
        let url = format!("{}/r/{}/search.json", self.base_url, spec.community);
        let params = [
            ("q", spec.query_text.clone()),
            ("restrict_sr", "on".to_string()),
            ("sort", "comments".to_string()),
            ("limit", spec.target_count.min(MAX_PAGE_SIZE).to_string()),
        ];
        self.get_json(&url, &params)
    }

    /// Nested replies for one post. Never fails: any error yields no replies.
    pub fn fetch_replies(&self, post_url: &str, post_title: &str, ctx: QueryContext<'_>) -> Vec<ItemRecord> {
        let url = format!("{}.json", post_url);
        match self.get_json(&url, &[]) {
            Ok(payload) => extract_replies(&payload, post_title, post_url, ctx),
            Err(e) => {
                tracing::debug!(url = %url, error = %e, "reply fetch failed; treating as no replies");
                Vec::new()
            }
        }
    }
}

impl SourceClient for RedditClient {
    fn fetch_items(&self, spec: &QuerySpec, cancel: &CancelToken) -> Result<Vec<ItemRecord>, FetchError> {
        let listing = self.search(spec)?;
        let posts = extract_posts(&listing)?;
        tracing::info!(community = %spec.community, query = %spec.query_text, posts = posts.len(), "search returned");
        if posts.is_empty() {
            tracing::warn!(community = %spec.community, query = %spec.query_text, "no posts found for this query");
            return Ok(Vec::new());
        }

        let ctx = QueryContext { query: &spec.query_text, community: &spec.community };
        let total = posts.len();
        let mut out = Vec::with_capacity(total * 4);

        for (idx, data) in posts.into_iter().enumerate() {
            let post = post_record(data, &self.base_url, ctx);
            let title = post.title.clone();
            let url = post.source_url.clone();
            let has_replies = post.reply_count > 0;
            out.push(post);

            if has_replies {
                out.extend(self.fetch_replies(&url, &title, ctx));
            }

            if (idx + 1) % 10 == 0 {
                tracing::info!("  [{}/{}] processed {} items so far", idx + 1, total, out.len());
            }

            if !cancel.wait(self.pacing) {
                return Err(FetchError::Cancelled);
            }
        }

        Ok(out)
    }
}
