pub mod config;
pub mod dlq;
pub mod domain;
pub mod error;
pub mod errorlog;
pub mod hash;
pub mod notify;
pub mod ratelimit;

pub use config::Config;
pub use dlq::{DeadLetterStore, DlqStats};
pub use domain::*;
pub use error::{PipelineError, Result};
pub use errorlog::{ErrorLogEntry, ErrorLogSink};
pub use hash::{content_hash, event_fingerprint, fast_hash, normalize_title};
pub use notify::{notifier_from_config, NotifyBackend, RunSummary};

/// Normalize a name into a URL-safe slug: lowercase, strip non-alphanumeric
/// (keeping spaces), collapse whitespace, replace spaces with hyphens.
///
/// ```
/// assert_eq!(pipeline_common::slugify("Lake Street Church"), "lake-street-church");
/// assert_eq!(pipeline_common::slugify("Lake St. Church!!!"), "lake-st-church");
/// assert_eq!(pipeline_common::slugify("  Multiple   Spaces  "), "multiple-spaces");
/// ```
pub fn slugify(name: &str) -> String {
    let lowered = name.to_lowercase();
    let cleaned: String = lowered
        .chars()
        .map(|c| if c.is_alphanumeric() || c == ' ' { c } else { ' ' })
        .collect();
    cleaned.split_whitespace().collect::<Vec<&str>>().join("-")
}
