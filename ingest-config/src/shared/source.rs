use serde::{Deserialize, Serialize};

/// Configuration for a data source.
///
/// The `type` tag selects the concrete source; each variant carries a closed
/// parameter struct, so a missing required key or an unrecognized key fails
/// at deserialization, before the source performs any I/O.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SourceConfig {
    /// Polls an RSS feed and emits one item per entry.
    RssFeed(RssFeedSourceConfig),
}

impl SourceConfig {
    /// Returns the type name of this source, as used in fingerprints and
    /// remote job function names.
    pub fn kind(&self) -> &'static str {
        match self {
            SourceConfig::RssFeed(_) => "rss_feed",
        }
    }

    /// Returns the source parameters as a JSON value.
    ///
    /// Used to compute the configuration fingerprint, so the representation
    /// must be stable for identical configurations.
    pub fn params_value(&self) -> serde_json::Value {
        match self {
            SourceConfig::RssFeed(params) => {
                serde_json::to_value(params).expect("source params serialize to JSON")
            }
        }
    }
}

/// Parameters for the RSS feed source.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "snake_case")]
pub struct RssFeedSourceConfig {
    /// URL of the RSS feed to poll.
    pub rss_feed_url: String,
    /// Keywords attached to every produced item as `source_keywords`.
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Marks items from this feed as coming from a trusted source.
    #[serde(default)]
    pub trusted_source: bool,
    /// Minimum minutes between two scrapes of the same feed.
    #[serde(default = "default_minutes_between_scrapes")]
    pub minutes_between_scrapes: u64,
    /// Item type assigned to produced items.
    #[serde(default = "default_rss_item_type")]
    pub item_type: String,
}

fn default_minutes_between_scrapes() -> u64 {
    10
}

fn default_rss_item_type() -> String {
    "article_reference".to_owned()
}
