mod config;
mod error;
mod query;
mod record;

mod cancel;
mod normalize;
mod source;

mod checkpoint;
mod harvest;
mod resume;
mod finalize;
mod pipeline;

mod progress;
mod table;
mod util;

pub use crate::config::{HarvestOptions, DEFAULT_COOLDOWN};
pub use crate::error::{FetchError, ResumeError};
pub use crate::query::{continuation_plan, load_plan_file, overnight_plan, Plan, QuerySpec, MAX_PAGE_SIZE};
pub use crate::record::{FinalRecord, ItemKind, ItemRecord, UNKNOWN_AUTHOR};

pub use crate::cancel::CancelToken;
pub use crate::source::{RedditClient, SourceClient, ITEM_PACING};

// Expose the pure normalizer so adapters and tests can feed it raw payloads.
pub use crate::normalize::{
    extract_posts, extract_replies, is_unusable_reply_body, post_record, reply_record, QueryContext,
    MAX_REPLIES_PER_ITEM, MIN_REPLY_CHARS,
};

pub use crate::checkpoint::Checkpointer;
pub use crate::harvest::{HarvestOutcome, HarvestState, Harvester, QueryReport};
pub use crate::resume::load as load_prior_dataset;
pub use crate::finalize::{
    finalize, finalize_and_persist, finalize_with_stats, has_metaphor_signal, persist_dataset, FilterStats,
    FinalizeReport, METAPHOR_KEYWORDS, MIN_TEXT_CHARS,
};
pub use crate::pipeline::{RedditHarvest, RunReport};

pub use crate::progress::ProgressScope;
pub use crate::util::init_tracing_once;
