mod common;

use std::sync::Arc;
use std::sync::atomic::Ordering;

use ingest::controller::Controller;
use ingest::error::ErrorKind;
use ingest::invoke::NoopInvoker;
use ingest::queue::base::ItemQueue;
use ingest::queue::local::LocalQueue;
use ingest::registry::PluginRegistry;
use ingest::state::store::CheckpointStore;
use ingest::state::store::memory::MemoryCheckpointStore;
use ingest::store::memory::MemoryTableClient;
use ingest_config::shared::{PipelineConfig, SourceConfig};
use ingest_telemetry::init_test_tracing;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const FEED_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Example News</title>
    <item>
      <title>First story</title>
      <link>https://example.com/articles/1</link>
      <description>Something happened.</description>
      <pubDate>Mon, 01 Jan 2024 00:00:00 GMT</pubDate>
    </item>
    <item>
      <title>Second story</title>
      <link>https://example.com/articles/2</link>
      <description>Something else happened.</description>
      <pubDate>Tue, 02 Jan 2024 12:30:00 GMT</pubDate>
    </item>
  </channel>
</rss>"#;

async fn mock_feed_server(expected_fetches: u64) -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/feed"))
        .respond_with(ResponseTemplate::new(200).set_body_string(FEED_XML))
        .expect(expected_fetches)
        .mount(&server)
        .await;

    server
}

fn feed_pipeline_config(server: &MockServer) -> PipelineConfig {
    common::config_from_json(serde_json::json!({
        "project_name": "newsroom",
        "execution": { "queue_mode": "local", "job_dispatch": "in_process" },
        "sources": [{
            "type": "rss_feed",
            "rss_feed_url": format!("{}/feed", server.uri()),
        }],
        "transformers": [{
            "type": "identity",
            "input_item_types": ["article_reference"],
            "output_item_types": ["stored_article"],
        }],
        "source_storage": [{
            "type": "document",
            "table": "articles",
            "partition_key": "url",
            "partition_key_format": "{url}",
        }],
    }))
}

#[tokio::test(flavor = "multi_thread")]
async fn local_pipeline_flows_feed_items_to_the_output_queue() {
    init_test_tracing();
    let server = mock_feed_server(1).await;

    let config = feed_pipeline_config(&server);
    let source_config = config.sources[0].clone();

    let table_client = Arc::new(MemoryTableClient::new());
    table_client.create_table("articles", "url").await;
    let registry = Arc::new(PluginRegistry::new(table_client.clone()));
    let queue = Arc::new(LocalQueue::new());
    let checkpoint_store = MemoryCheckpointStore::new();

    let mut controller = Controller::new(
        config,
        checkpoint_store.clone(),
        NoopInvoker,
        queue.clone(),
        registry.clone(),
    )
    .unwrap();

    controller.start().await.unwrap();
    controller.wait().await.unwrap();

    // Both feed entries were stored and forwarded: the identity transformer
    // drained the article_reference queue and re-enqueued under its output
    // type.
    assert_eq!(table_client.record_count("articles").await, 2);
    assert!(queue.is_empty("article_reference").await);
    assert_eq!(queue.len("stored_article").await, 2);

    let output = queue.receive("stored_article").await.unwrap();
    assert_eq!(output[0].item_type, "stored_article");
    assert!(output[0].field_str("url").is_some());
    assert!(output[0].payload.get("time_published").is_some());
    assert_eq!(
        output[0].payload.get("source_keywords").unwrap(),
        &serde_json::json!([])
    );

    // The source checkpoint was persisted under the config fingerprint.
    let fingerprint = registry.build_source(&source_config).unwrap().fingerprint();
    let checkpoint = checkpoint_store
        .get(&fingerprint)
        .await
        .unwrap()
        .expect("checkpoint persisted after the source pass");
    assert!(checkpoint.get_f64("time_last_updated").unwrap() > 0.0);
}

#[tokio::test(flavor = "multi_thread")]
async fn source_cycle_skips_when_no_new_data() {
    init_test_tracing();
    // The mock enforces a single fetch: the second cycle must be gated off
    // by the persisted checkpoint before any I/O.
    let server = mock_feed_server(1).await;

    let config = common::config_from_json(serde_json::json!({
        "project_name": "newsroom",
        "sources": [{
            "type": "rss_feed",
            "rss_feed_url": format!("{}/feed", server.uri()),
        }],
        "transformers": [],
    }));
    let source_config = config.sources[0].clone();

    let registry = Arc::new(PluginRegistry::new(Arc::new(MemoryTableClient::new())));
    let controller = Controller::new(
        config,
        MemoryCheckpointStore::new(),
        NoopInvoker,
        Arc::new(LocalQueue::new()),
        registry,
    )
    .unwrap();

    let first = controller.run_source_cycle(&source_config).await.unwrap();
    assert!(first);

    let second = controller.run_source_cycle(&source_config).await.unwrap();
    assert!(!second);
}

#[tokio::test(flavor = "multi_thread")]
async fn local_drain_survives_poisoned_items() {
    init_test_tracing();

    let config = common::config_from_json(serde_json::json!({
        "project_name": "newsroom",
        "sources": [],
        "transformers": [{
            "type": "custom.Poison",
            "input_item_types": ["article_reference"],
            "output_item_types": ["stored_article"],
        }],
    }));

    let mut registry = PluginRegistry::new(Arc::new(MemoryTableClient::new()));
    let attempts = common::register_poison_transformer(&mut registry);

    let queue = Arc::new(LocalQueue::new());
    for url in ["https://example.com/1", "https://example.com/2", "https://example.com/3"] {
        let mut item = common::url_item("article_reference", url);
        if url.ends_with("/2") {
            item.payload.insert(common::POISON_FIELD.to_owned(), true.into());
        }
        queue.enqueue("article_reference", &item).await.unwrap();
    }

    let mut controller = Controller::new(
        config,
        MemoryCheckpointStore::new(),
        NoopInvoker,
        queue.clone(),
        Arc::new(registry),
    )
    .unwrap();

    controller.start().await.unwrap();
    controller.wait().await.unwrap();

    // The poisoned item was attempted, logged, and skipped; the drain
    // continued through the remaining items.
    assert_eq!(attempts.load(Ordering::SeqCst), 3);
    assert_eq!(queue.len("stored_article").await, 2);
    assert!(queue.is_empty("article_reference").await);
}

#[tokio::test(flavor = "multi_thread")]
async fn remote_dispatch_invokes_the_source_job_function() {
    init_test_tracing();

    let config = common::config_from_json(serde_json::json!({
        "project_name": "newsroom",
        "execution": { "job_dispatch": "remote" },
        "sources": [{
            "type": "rss_feed",
            "rss_feed_url": "https://example.com/feed",
        }],
        "transformers": [],
    }));
    let source_config = config.sources[0].clone();

    let invoker = common::RecordingInvoker::new();
    let controller = Controller::new(
        config,
        MemoryCheckpointStore::new(),
        invoker.clone(),
        Arc::new(LocalQueue::new()),
        Arc::new(PluginRegistry::new(Arc::new(MemoryTableClient::new()))),
    )
    .unwrap();

    let dispatched = controller.run_source_cycle(&source_config).await.unwrap();
    assert!(dispatched);

    let invocations = invoker.invocations().await;
    assert_eq!(invocations.len(), 1);
    assert_eq!(invocations[0].0, "newsroom-source-rss_feed");

    // The payload carries both configs so the remote handler can rebuild the
    // controller and run the job.
    let payload = &invocations[0].1;
    assert!(payload.get("controller_config").is_some());
    let SourceConfig::RssFeed(params) =
        serde_json::from_value(payload.get("source_config").unwrap().clone()).unwrap();
    assert_eq!(params.rss_feed_url, "https://example.com/feed");
}

#[tokio::test(flavor = "multi_thread")]
async fn unknown_transformer_type_aborts_start() {
    init_test_tracing();

    let config = common::config_from_json(serde_json::json!({
        "project_name": "newsroom",
        "sources": [],
        "transformers": [{
            "type": "custom.Missing",
            "input_item_types": ["a"],
            "output_item_types": ["b"],
        }],
    }));

    let mut controller = Controller::new(
        config,
        MemoryCheckpointStore::new(),
        NoopInvoker,
        Arc::new(LocalQueue::new()),
        Arc::new(PluginRegistry::new(Arc::new(MemoryTableClient::new()))),
    )
    .unwrap();

    let err = controller.start().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnknownPluginType);
}

#[test]
fn source_config_missing_required_parameter_fails_at_deserialization() {
    let result: Result<PipelineConfig, _> = serde_json::from_value(serde_json::json!({
        "project_name": "newsroom",
        "sources": [{ "type": "rss_feed" }],
        "transformers": [],
    }));

    assert!(result.is_err());
}
