mod common;

use std::sync::Arc;

use ingest::backfill::{BackfillEngine, BackfillRequest};
use ingest::registry::PluginRegistry;
use ingest::store::attribute::encode_payload;
use ingest::store::base::RecordKey;
use ingest::store::base::TableClient;
use ingest::store::memory::MemoryTableClient;
use ingest::types::Payload;
use ingest_config::shared::PipelineConfig;
use ingest_telemetry::init_test_tracing;

fn backfill_config(storage: serde_json::Value) -> Arc<PipelineConfig> {
    Arc::new(common::config_from_json(serde_json::json!({
        "project_name": "newsroom",
        "sources": [],
        "transformers": [{
            "type": "identity",
            "input_item_types": ["article_reference"],
            "output_item_types": ["article_reference"],
            "storage": storage,
        }],
    })))
}

async fn seed_articles(client: &MemoryTableClient, count: usize, with_fulltext: impl Fn(usize) -> bool) {
    for i in 0..count {
        let mut payload = Payload::new();
        payload.insert(
            "url".to_owned(),
            format!("https://example.com/articles/{i:03}").into(),
        );
        payload.insert("time_published".to_owned(), (1000 + i).into());
        if with_fulltext(i) {
            payload.insert("fulltext".to_owned(), "already scraped".into());
        }
        client
            .put_record("articles", encode_payload(&payload))
            .await
            .unwrap();
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn backfill_pages_through_every_record_in_three_steps() {
    init_test_tracing();

    let client = Arc::new(MemoryTableClient::new());
    client.create_table("articles", "url").await;
    client.create_table("enriched", "url").await;
    seed_articles(&client, 25, |_| false).await;

    let config = backfill_config(serde_json::json!([{
        "type": "document",
        "table": "enriched",
        "partition_key": "url",
        "partition_key_format": "{url}",
    }]));
    let registry = Arc::new(PluginRegistry::new(client.clone()));
    let engine = BackfillEngine::new(config, client.clone(), registry);

    let mut request = BackfillRequest::scan("articles", "identity");
    request.page_size = Some(10);

    let report = engine.run(request).await.unwrap();

    // 25 records at page size 10: pages of 10, 10, and 5.
    assert_eq!(report.pages, 3);
    assert_eq!(report.scanned, 25);
    assert_eq!(report.transformed, 25);
    assert_eq!(report.filtered, 0);
    assert_eq!(report.skipped, 0);

    // Output storage applied to every replayed record.
    assert_eq!(client.record_count("enriched").await, 25);
}

#[tokio::test(flavor = "multi_thread")]
async fn backfill_excludes_records_already_having_the_required_null_field() {
    init_test_tracing();

    let client = Arc::new(MemoryTableClient::new());
    client.create_table("articles", "url").await;
    seed_articles(&client, 5, |i| i % 2 == 1).await;

    let config = backfill_config(serde_json::json!([]));
    let registry = Arc::new(PluginRegistry::new(client.clone()));
    let engine = BackfillEngine::new(config, client.clone(), registry);

    let mut request = BackfillRequest::scan("articles", "identity");
    request.required_null_field = Some("fulltext".to_owned());

    let report = engine.run(request).await.unwrap();

    assert_eq!(report.scanned, 5);
    assert_eq!(report.skipped, 2);
    assert_eq!(report.transformed, 3);
}

#[tokio::test(flavor = "multi_thread")]
async fn keyed_backfill_filters_server_side_and_paginates() {
    init_test_tracing();

    let client = Arc::new(MemoryTableClient::new());
    client
        .create_table_with_sort_key("articles", "domain", "time_published")
        .await;

    for i in 0..12 {
        let mut payload = Payload::new();
        payload.insert("domain".to_owned(), "example.com".into());
        payload.insert("time_published".to_owned(), (1000 + i).into());
        payload.insert(
            "url".to_owned(),
            format!("https://example.com/articles/{i:03}").into(),
        );
        if i % 3 == 0 {
            payload.insert("fulltext".to_owned(), "already scraped".into());
        }
        client
            .put_record("articles", encode_payload(&payload))
            .await
            .unwrap();
    }

    let config = backfill_config(serde_json::json!([]));
    let registry = Arc::new(PluginRegistry::new(client.clone()));
    let engine = BackfillEngine::new(config, client.clone(), registry);

    let mut request = BackfillRequest::scan("articles", "identity");
    request.key = Some(RecordKey::new("domain", "example.com"));
    request.required_null_field = Some("fulltext".to_owned());
    request.page_size = Some(5);

    let report = engine.run(request).await.unwrap();

    // 12 records, 4 already scraped: the keyed path filters server-side, so
    // only the 8 remaining ever reach the engine, across two pages.
    assert_eq!(report.pages, 2);
    assert_eq!(report.scanned, 8);
    assert_eq!(report.skipped, 0);
    assert_eq!(report.transformed, 8);

    let unknown = engine
        .run(BackfillRequest::scan("articles", "custom.Missing"))
        .await;
    assert!(unknown.is_err());
}
