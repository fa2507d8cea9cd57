use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::{ErrorKind, IngestError, IngestResult};
use crate::ingest_error;
use crate::store::attribute::{AttrMap, AttrValue};
use crate::store::base::{QueryRequest, RecordKey, RecordPage, ScanRequest, TableClient};

/// Records returned per page when a request does not set a page size.
const DEFAULT_PAGE_SIZE: usize = 100;

/// Separator between partition and sort key in the internal storage key.
const KEY_SEPARATOR: char = '\u{1f}';

#[derive(Debug, Clone)]
struct TableSchema {
    partition_key: String,
    sort_key: Option<String>,
}

#[derive(Debug)]
struct Table {
    schema: TableSchema,
    records: BTreeMap<String, AttrMap>,
}

#[derive(Debug, Default)]
struct Inner {
    tables: HashMap<String, Table>,
}

/// In-memory [`TableClient`] with full pagination-cursor semantics.
///
/// Intended for deterministic single-process runs and tests. Secondary index
/// names on queries are accepted and ignored: every query runs over the
/// table's records directly.
#[derive(Debug, Clone, Default)]
pub struct MemoryTableClient {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryTableClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a table keyed by a single partition attribute.
    pub async fn create_table(&self, name: &str, partition_key: &str) {
        self.create_table_inner(name, partition_key, None).await;
    }

    /// Creates a table keyed by a partition attribute plus a sort attribute.
    pub async fn create_table_with_sort_key(
        &self,
        name: &str,
        partition_key: &str,
        sort_key: &str,
    ) {
        self.create_table_inner(name, partition_key, Some(sort_key.to_owned()))
            .await;
    }

    async fn create_table_inner(&self, name: &str, partition_key: &str, sort_key: Option<String>) {
        let mut inner = self.inner.lock().await;
        inner.tables.entry(name.to_owned()).or_insert_with(|| Table {
            schema: TableSchema {
                partition_key: partition_key.to_owned(),
                sort_key,
            },
            records: BTreeMap::new(),
        });
    }

    /// Returns the number of records currently stored in `table`.
    pub async fn record_count(&self, table: &str) -> usize {
        let inner = self.inner.lock().await;
        inner
            .tables
            .get(table)
            .map(|table| table.records.len())
            .unwrap_or(0)
    }
}

fn unknown_table(table: &str) -> IngestError {
    ingest_error!(ErrorKind::StorageError, "Table does not exist", table)
}

fn attr_text(value: &AttrValue) -> Option<String> {
    match value {
        AttrValue::S(s) => Some(s.clone()),
        AttrValue::N(n) => Some(n.clone()),
        _ => None,
    }
}

/// Computes the internal storage key of a record under the table's schema.
fn storage_key(schema: &TableSchema, record: &AttrMap) -> IngestResult<String> {
    let partition = record
        .get(&schema.partition_key)
        .and_then(attr_text)
        .ok_or_else(|| {
            ingest_error!(
                ErrorKind::InvalidData,
                "Record is missing its partition key attribute",
                schema.partition_key
            )
        })?;

    let Some(sort_attribute) = &schema.sort_key else {
        return Ok(partition);
    };

    let sort = record
        .get(sort_attribute)
        .and_then(attr_text)
        .ok_or_else(|| {
            ingest_error!(
                ErrorKind::InvalidData,
                "Record is missing its sort key attribute",
                sort_attribute
            )
        })?;

    Ok(format!("{partition}{KEY_SEPARATOR}{sort}"))
}

/// Compares two attribute values numerically when both are numbers,
/// lexicographically otherwise.
fn compare_sort_values(a: &AttrValue, b: &AttrValue) -> std::cmp::Ordering {
    if let (AttrValue::N(a), AttrValue::N(b)) = (a, b)
        && let (Ok(a), Ok(b)) = (a.parse::<f64>(), b.parse::<f64>())
    {
        return a.partial_cmp(&b).unwrap_or(std::cmp::Ordering::Equal);
    }

    attr_text(a)
        .unwrap_or_default()
        .cmp(&attr_text(b).unwrap_or_default())
}

/// Takes one page out of an ordered record sequence.
///
/// The cursor is the storage key of the last record of the previous page;
/// the next page resumes right after it. A `None` result cursor means the
/// sequence is exhausted.
fn paginate(
    keyed: Vec<(String, AttrMap)>,
    cursor: Option<&String>,
    page_size: usize,
) -> RecordPage {
    let start = match cursor {
        Some(cursor) => keyed
            .iter()
            .position(|(key, _)| key == cursor)
            .map(|position| position + 1)
            .unwrap_or(keyed.len()),
        None => 0,
    };

    let remaining = &keyed[start.min(keyed.len())..];
    let page = &remaining[..page_size.min(remaining.len())];
    let cursor = if remaining.len() > page.len() {
        page.last().map(|(key, _)| key.clone())
    } else {
        None
    };

    RecordPage {
        records: page.iter().map(|(_, record)| record.clone()).collect(),
        cursor,
    }
}

#[async_trait]
impl TableClient for MemoryTableClient {
    async fn get_record(&self, table: &str, key: &RecordKey) -> IngestResult<Option<AttrMap>> {
        let inner = self.inner.lock().await;
        let table = inner.tables.get(table).ok_or_else(|| unknown_table(table))?;

        let record = table
            .records
            .values()
            .find(|record| {
                record.get(&key.attribute).and_then(attr_text).as_deref() == Some(&key.value)
            })
            .cloned();

        Ok(record)
    }

    async fn put_record(&self, table_name: &str, record: AttrMap) -> IngestResult<()> {
        let mut inner = self.inner.lock().await;
        let table = inner
            .tables
            .get_mut(table_name)
            .ok_or_else(|| unknown_table(table_name))?;

        let key = storage_key(&table.schema, &record)?;
        table.records.insert(key, record);

        Ok(())
    }

    async fn scan(&self, request: ScanRequest) -> IngestResult<RecordPage> {
        let inner = self.inner.lock().await;
        let table = inner
            .tables
            .get(&request.table)
            .ok_or_else(|| unknown_table(&request.table))?;

        let keyed = table
            .records
            .iter()
            .map(|(key, record)| (key.clone(), record.clone()))
            .collect::<Vec<_>>();

        Ok(paginate(
            keyed,
            request.cursor.as_ref(),
            request.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
        ))
    }

    async fn query(&self, request: QueryRequest) -> IngestResult<RecordPage> {
        let inner = self.inner.lock().await;
        let table = inner
            .tables
            .get(&request.table)
            .ok_or_else(|| unknown_table(&request.table))?;

        let mut keyed = table
            .records
            .iter()
            .filter(|(_, record)| {
                record
                    .get(&request.key.attribute)
                    .and_then(attr_text)
                    .as_deref()
                    == Some(&request.key.value)
            })
            .filter(|(_, record)| match &request.missing_field {
                Some(field) => !record.contains_key(field),
                None => true,
            })
            .map(|(key, record)| (key.clone(), record.clone()))
            .collect::<Vec<_>>();

        if let Some(sort_attribute) = table.schema.sort_key.clone() {
            if let Some(range) = &request.sort_range {
                keyed.retain(|(_, record)| {
                    let Some(value) = record.get(&sort_attribute).and_then(attr_text) else {
                        return false;
                    };
                    let after_start = range.start.as_ref().is_none_or(|start| {
                        compare_sort_values(
                            &AttrValue::N(value.clone()),
                            &AttrValue::N(start.clone()),
                        ) != std::cmp::Ordering::Less
                    });
                    let before_end = range.end.as_ref().is_none_or(|end| {
                        compare_sort_values(&AttrValue::N(value.clone()), &AttrValue::N(end.clone()))
                            != std::cmp::Ordering::Greater
                    });
                    after_start && before_end
                });
            }

            keyed.sort_by(|(_, a), (_, b)| {
                let a = a.get(&sort_attribute).cloned().unwrap_or(AttrValue::Null);
                let b = b.get(&sort_attribute).cloned().unwrap_or(AttrValue::Null);
                compare_sort_values(&a, &b)
            });
        }

        if request.reverse {
            keyed.reverse();
        }

        Ok(paginate(
            keyed,
            request.cursor.as_ref(),
            request.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
        ))
    }
}
