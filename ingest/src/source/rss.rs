use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use futures::stream;
use ingest_config::shared::RssFeedSourceConfig;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{IngestError, IngestResult};
use crate::source::base::{ItemStream, Source, config_fingerprint};
use crate::state::checkpoint::{Fingerprint, SourceState};
use crate::types::{Item, Payload};

/// State field holding the unix time of the last completed scrape.
const TIME_LAST_UPDATED: &str = "time_last_updated";

/// Scrapes an RSS feed, emitting one item per feed entry.
///
/// The scrape interval lives in the resumable state: a pass stamps
/// `time_last_updated`, and [`Source::has_new_data`] admits a new pass only
/// once the configured number of minutes has elapsed since that stamp.
pub struct RssFeedSource {
    params: RssFeedSourceConfig,
    state: SourceState,
    http: reqwest::Client,
}

impl RssFeedSource {
    pub fn new(params: RssFeedSourceConfig) -> Self {
        let mut state = SourceState::new();
        state.set(TIME_LAST_UPDATED, 0);

        Self {
            params,
            state,
            http: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl Source for RssFeedSource {
    fn fingerprint(&self) -> Fingerprint {
        let params = serde_json::to_value(&self.params).expect("source params serialize to JSON");
        config_fingerprint("rss_feed", &params)
    }

    async fn has_new_data(&self) -> IngestResult<bool> {
        let last_updated = self.state.get_f64(TIME_LAST_UPDATED).unwrap_or(0.0);
        let elapsed = unix_now() - last_updated;

        debug!(
            "rss feed {} last ran at {}",
            self.params.rss_feed_url, last_updated
        );

        Ok(elapsed > (self.params.minutes_between_scrapes * 60) as f64)
    }

    fn yield_items(&mut self) -> ItemStream<'_> {
        // Stamp the pass up front; the final state is persisted by the
        // controller only after the sequence completes.
        self.state.set(TIME_LAST_UPDATED, unix_now());

        let params = self.params.clone();
        let http = self.http.clone();

        Box::pin(
            stream::once(async move {
                let body = http
                    .get(&params.rss_feed_url)
                    .send()
                    .await?
                    .error_for_status()?
                    .text()
                    .await?;

                let items = parse_feed(&body, &params)?;
                Ok::<_, IngestError>(stream::iter(items.into_iter().map(Ok)))
            })
            .try_flatten(),
        )
    }

    fn state(&self) -> SourceState {
        self.state.clone()
    }

    fn restore_state(&mut self, partial: SourceState) {
        self.state.merge(partial);
    }
}

#[derive(Debug, Deserialize)]
struct Feed {
    channel: FeedChannel,
}

#[derive(Debug, Deserialize)]
struct FeedChannel {
    #[serde(rename = "item", default)]
    entries: Vec<FeedEntry>,
}

#[derive(Debug, Deserialize)]
struct FeedEntry {
    title: Option<String>,
    link: Option<String>,
    description: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
}

/// Parses an RSS 2.0 document into items under the source's configuration.
///
/// Entries without a link or a parseable publication date are skipped with a
/// warning rather than failing the whole pass.
fn parse_feed(body: &str, params: &RssFeedSourceConfig) -> IngestResult<Vec<Item>> {
    let feed: Feed = quick_xml::de::from_str(body)?;
    let time_sourced = unix_now();

    let mut items = Vec::with_capacity(feed.channel.entries.len());
    for entry in feed.channel.entries {
        let Some(link) = entry.link else {
            warn!("skipping rss entry without a link");
            continue;
        };

        let time_published = match entry.pub_date.as_deref().map(parse_pub_date) {
            Some(Ok(timestamp)) => timestamp,
            Some(Err(err)) => {
                warn!("skipping rss entry {}: bad pubDate: {}", link, err);
                continue;
            }
            None => {
                warn!("skipping rss entry {}: no pubDate", link);
                continue;
            }
        };

        let content = entry.description.unwrap_or_default();

        let mut payload = Payload::new();
        payload.insert("title".to_owned(), entry.title.unwrap_or_default().into());
        payload.insert("url".to_owned(), clean_url_path(&link).into());
        payload.insert("content".to_owned(), content.clone().into());
        payload.insert("source_type".to_owned(), "rss".into());
        payload.insert(
            "source_keywords".to_owned(),
            serde_json::Value::Array(
                params
                    .keywords
                    .iter()
                    .map(|keyword| keyword.clone().into())
                    .collect(),
            ),
        );
        payload.insert("trusted_source".to_owned(), params.trusted_source.into());
        payload.insert("time_sourced".to_owned(), time_sourced.into());
        payload.insert(
            "domain".to_owned(),
            feed_domain(&params.rss_feed_url).into(),
        );
        payload.insert("source_url".to_owned(), params.rss_feed_url.clone().into());
        payload.insert("time_published".to_owned(), time_published.into());
        payload.insert("summary".to_owned(), content.into());

        items.push(Item::new(params.item_type.clone(), payload));
    }

    Ok(items)
}

fn unix_now() -> f64 {
    Utc::now().timestamp_millis() as f64 / 1000.0
}

fn parse_pub_date(pub_date: &str) -> Result<i64, chrono::ParseError> {
    DateTime::parse_from_rfc2822(pub_date).map(|date| date.timestamp())
}

/// Normalizes a URL to scheme, host, and path, dropping query and fragment.
fn clean_url_path(url: &str) -> String {
    match reqwest::Url::parse(url) {
        Ok(parsed) => format!(
            "{}://{}{}",
            parsed.scheme(),
            parsed.host_str().unwrap_or_default(),
            parsed.path()
        ),
        Err(_) => url.to_owned(),
    }
}

fn feed_domain(feed_url: &str) -> String {
    reqwest::Url::parse(feed_url)
        .ok()
        .and_then(|parsed| parsed.host_str().map(str::to_owned))
        .unwrap_or_default()
}
