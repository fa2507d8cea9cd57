use async_trait::async_trait;

use crate::error::IngestResult;
use crate::store::attribute::AttrMap;

/// Primary key of a record, as a named string attribute.
///
/// Partition keys are strings throughout the pipeline; numeric sort keys are
/// addressed through [`QueryRequest`] ranges instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordKey {
    /// Name of the key attribute.
    pub attribute: String,
    /// Key value.
    pub value: String,
}

impl RecordKey {
    pub fn new(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            value: value.into(),
        }
    }
}

/// Opaque continuation cursor returned by paginated reads.
pub type Cursor = String;

/// One page of records plus the cursor to fetch the next page.
///
/// A `None` cursor means the backend reports no records remaining.
#[derive(Debug, Clone, Default)]
pub struct RecordPage {
    pub records: Vec<AttrMap>,
    pub cursor: Option<Cursor>,
}

/// A paginated full-table read.
#[derive(Debug, Clone)]
pub struct ScanRequest {
    /// Table to scan.
    pub table: String,
    /// Maximum records per page; backend default when unset.
    pub page_size: Option<usize>,
    /// Continuation cursor from the previous page.
    pub cursor: Option<Cursor>,
}

impl ScanRequest {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            page_size: None,
            cursor: None,
        }
    }
}

/// Bounds on the sort key of a [`QueryRequest`], inclusive on both ends.
#[derive(Debug, Clone, Default)]
pub struct SortKeyRange {
    pub start: Option<String>,
    pub end: Option<String>,
}

/// A paginated keyed read, optionally through a secondary index.
#[derive(Debug, Clone)]
pub struct QueryRequest {
    /// Table to query.
    pub table: String,
    /// Secondary index to query through, if any.
    pub index: Option<String>,
    /// Partition key condition.
    pub key: RecordKey,
    /// When set, only records *missing* this attribute are returned.
    pub missing_field: Option<String>,
    /// Restricts results to a sort-key range.
    pub sort_range: Option<SortKeyRange>,
    /// Returns results in descending sort-key order.
    pub reverse: bool,
    /// Maximum records per page; backend default when unset.
    pub page_size: Option<usize>,
    /// Continuation cursor from the previous page.
    pub cursor: Option<Cursor>,
}

impl QueryRequest {
    pub fn new(table: impl Into<String>, key: RecordKey) -> Self {
        Self {
            table: table.into(),
            index: None,
            key,
            missing_field: None,
            sort_range: None,
            reverse: false,
            page_size: None,
            cursor: None,
        }
    }
}

/// Client for the attribute-encoded storage backend.
///
/// Used by storage plugins, the uniqueness filter, the table-backed
/// checkpoint store, and the backfill engine. Writes are keyed by a
/// caller-computed primary key carried inside the record; reads paginate
/// through opaque cursors. The backend is assumed safe for concurrent
/// external access.
#[async_trait]
pub trait TableClient: Send + Sync {
    /// Reads the record under `key`, or `None` when absent.
    async fn get_record(&self, table: &str, key: &RecordKey) -> IngestResult<Option<AttrMap>>;

    /// Writes `record`, replacing any record under the same primary key.
    async fn put_record(&self, table: &str, record: AttrMap) -> IngestResult<()>;

    /// Reads one page of a full-table scan.
    async fn scan(&self, request: ScanRequest) -> IngestResult<RecordPage>;

    /// Reads one page of a keyed query.
    async fn query(&self, request: QueryRequest) -> IngestResult<RecordPage>;
}
