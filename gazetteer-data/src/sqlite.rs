//! SQLite-backed search index.
//!
//! Each dataset lives in its own table. Every operation opens its own
//! connection, so the three pipeline pushes can run on separate threads
//! against one database file; WAL mode and a busy timeout let their write
//! transactions queue instead of failing.

use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use gazetteer_core::Point;
use gazetteer_core::index::{
    Dataset, IndexBackend, IndexError, JunctionDocument, PathDocument, PointDocument, SearchHit,
    Tags,
};
use log::debug;
use rusqlite::{Connection, Error as SqliteError, Transaction, TransactionBehavior};
use serde_json::to_string;
use thiserror::Error;

const BUSY_TIMEOUT: Duration = Duration::from_secs(30);

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS junctions (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL,
        name_lower TEXT NOT NULL,
        lon REAL NOT NULL,
        lat REAL NOT NULL,
        streets TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS points (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL,
        name_lower TEXT NOT NULL,
        lon REAL NOT NULL,
        lat REAL NOT NULL,
        tags TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS paths (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL,
        name_lower TEXT NOT NULL,
        lon REAL NOT NULL,
        lat REAL NOT NULL,
        tags TEXT NOT NULL
    );
";

// `?1` is the lowercased query. Ranks mirror `gazetteer_core::index::match_rank`.
const SEARCH: &str = "
    SELECT dataset, id, name, lon, lat FROM (
        SELECT 'junctions' AS dataset, id, name, name_lower, lon, lat FROM junctions
        UNION ALL
        SELECT 'points' AS dataset, id, name, name_lower, lon, lat FROM points
        UNION ALL
        SELECT 'paths' AS dataset, id, name, name_lower, lon, lat FROM paths
    )
    WHERE instr(name_lower, ?1) > 0
    ORDER BY
        CASE
            WHEN name_lower = ?1 THEN 0
            WHEN substr(name_lower, 1, length(?1)) = ?1 THEN 1
            ELSE 2
        END,
        length(name),
        id,
        dataset
    LIMIT ?2
";

/// Errors raised by the SQLite index before they are wrapped in
/// [`IndexError`].
#[derive(Debug, Error)]
pub enum SqliteIndexError {
    /// Failed to create the parent directory for the database file.
    #[error("failed to create parent directory for {path:?}")]
    CreateDirectory {
        /// Database path whose parent could not be created.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// Opening the SQLite database failed.
    #[error("failed to open SQLite database at {path:?}")]
    Open {
        /// Database path.
        path: Utf8PathBuf,
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// Setting the journal mode or busy timeout failed.
    #[error("failed to configure SQLite connection")]
    Configure {
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// Beginning the transaction failed.
    #[error("failed to begin {dataset} transaction")]
    BeginTransaction {
        /// Dataset being written.
        dataset: Dataset,
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// Creating or dropping tables failed.
    #[error("failed to update index tables")]
    Schema {
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// A document identifier could not be represented as an SQLite integer.
    #[error("{dataset} document id {id} exceeds SQLite i64 range")]
    IdOutOfRange {
        /// Dataset of the offending document.
        dataset: Dataset,
        /// Identifier that failed the conversion.
        id: u64,
    },
    /// Serializing document tags or streets to JSON failed.
    #[error("failed to serialize {dataset} document {id}")]
    Serialize {
        /// Dataset of the offending document.
        dataset: Dataset,
        /// Identifier of the document.
        id: u64,
        /// Source error produced by `serde_json`.
        #[source]
        source: serde_json::Error,
    },
    /// Preparing the insert statement failed.
    #[error("failed to prepare {dataset} insert statement")]
    PrepareInsert {
        /// Dataset being written.
        dataset: Dataset,
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// Writing a document row failed.
    #[error("failed to persist {dataset} document {id}")]
    PersistRow {
        /// Dataset being written.
        dataset: Dataset,
        /// Identifier of the document.
        id: u64,
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// Committing the transaction failed.
    #[error("failed to commit {dataset} transaction")]
    Commit {
        /// Dataset being written.
        dataset: Dataset,
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// Running the search query failed.
    #[error("failed to query index")]
    Query {
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// A stored row carried a value the index never writes.
    #[error("index row has unexpected {field}: {value}")]
    CorruptRow {
        /// Column holding the bad value.
        field: &'static str,
        /// Offending value.
        value: String,
    },
}

/// Search index stored in a single SQLite file.
///
/// # Examples
/// ```no_run
/// use gazetteer_core::index::IndexBackend;
/// use gazetteer_data::SqliteIndex;
///
/// # fn main() -> Result<(), gazetteer_core::index::IndexError> {
/// let index = SqliteIndex::new("target/gazetteer/index.db");
/// index.ensure_schema()?;
/// for hit in index.search("Chuy", 5)? {
///     println!("{} {}", hit.dataset, hit.name);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct SqliteIndex {
    path: Utf8PathBuf,
}

impl SqliteIndex {
    /// Index backed by the database at `path`; nothing is opened yet.
    #[must_use]
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Database file location.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    fn connect(&self) -> Result<Connection, SqliteIndexError> {
        gazetteer_fs::ensure_parent_dir(&self.path).map_err(|source| {
            SqliteIndexError::CreateDirectory {
                path: self.path.clone(),
                source,
            }
        })?;
        let connection =
            Connection::open(self.path.as_std_path()).map_err(|source| SqliteIndexError::Open {
                path: self.path.clone(),
                source,
            })?;
        connection
            .busy_timeout(BUSY_TIMEOUT)
            .map_err(|source| SqliteIndexError::Configure { source })?;
        connection
            .pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get::<_, String>(0))
            .map_err(|source| SqliteIndexError::Configure { source })?;
        Ok(connection)
    }

    fn write<T, F>(&self, dataset: Dataset, docs: &[T], row: F) -> Result<usize, IndexError>
    where
        F: FnMut(&Transaction<'_>, &T) -> Result<(), SqliteIndexError>,
    {
        self.write_rows(dataset, docs, row)
            .map_err(|err| IndexError::push(dataset, err))?;
        debug!("wrote {} {dataset} documents to {}", docs.len(), self.path);
        Ok(docs.len())
    }

    fn write_rows<T, F>(
        &self,
        dataset: Dataset,
        docs: &[T],
        mut row: F,
    ) -> Result<(), SqliteIndexError>
    where
        F: FnMut(&Transaction<'_>, &T) -> Result<(), SqliteIndexError>,
    {
        let mut connection = self.connect()?;
        let transaction = connection
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|source| SqliteIndexError::BeginTransaction { dataset, source })?;
        for doc in docs {
            row(&transaction, doc)?;
        }
        transaction
            .commit()
            .map_err(|source| SqliteIndexError::Commit { dataset, source })
    }

    fn run_search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>, SqliteIndexError> {
        let connection = self.connect()?;
        let mut statement = connection
            .prepare(SEARCH)
            .map_err(|source| SqliteIndexError::Query { source })?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = statement
            .query_map((query.to_lowercase(), limit), |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, f64>(3)?,
                    row.get::<_, f64>(4)?,
                ))
            })
            .map_err(|source| SqliteIndexError::Query { source })?;

        let mut hits = Vec::new();
        for row in rows {
            let (dataset, id, name, lon, lat) =
                row.map_err(|source| SqliteIndexError::Query { source })?;
            hits.push(SearchHit {
                dataset: parse_dataset(&dataset)?,
                id: u64::try_from(id).map_err(|_| SqliteIndexError::CorruptRow {
                    field: "id",
                    value: id.to_string(),
                })?,
                name,
                location: Point::new(lat, lon),
            });
        }
        Ok(hits)
    }
}

fn parse_dataset(value: &str) -> Result<Dataset, SqliteIndexError> {
    match value {
        "junctions" => Ok(Dataset::Junctions),
        "points" => Ok(Dataset::Points),
        "paths" => Ok(Dataset::Paths),
        other => Err(SqliteIndexError::CorruptRow {
            field: "dataset",
            value: other.to_owned(),
        }),
    }
}

fn row_id(dataset: Dataset, id: u64) -> Result<i64, SqliteIndexError> {
    i64::try_from(id).map_err(|_| SqliteIndexError::IdOutOfRange { dataset, id })
}

fn tags_json(dataset: Dataset, id: u64, tags: &Tags) -> Result<String, SqliteIndexError> {
    to_string(tags).map_err(|source| SqliteIndexError::Serialize {
        dataset,
        id,
        source,
    })
}

fn insert(
    transaction: &Transaction<'_>,
    dataset: Dataset,
    id: u64,
    name: &str,
    location: Point,
    extra: String,
) -> Result<(), SqliteIndexError> {
    let sql = match dataset {
        Dataset::Junctions => {
            "INSERT OR REPLACE INTO junctions (id, name, name_lower, lon, lat, streets) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)"
        }
        Dataset::Points => {
            "INSERT OR REPLACE INTO points (id, name, name_lower, lon, lat, tags) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)"
        }
        Dataset::Paths => {
            "INSERT OR REPLACE INTO paths (id, name, name_lower, lon, lat, tags) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)"
        }
    };
    let mut statement = transaction
        .prepare_cached(sql)
        .map_err(|source| SqliteIndexError::PrepareInsert { dataset, source })?;
    statement
        .execute((
            row_id(dataset, id)?,
            name,
            name.to_lowercase(),
            location.lon,
            location.lat,
            extra,
        ))
        .map(|_| ())
        .map_err(|source| SqliteIndexError::PersistRow {
            dataset,
            id,
            source,
        })
}

impl IndexBackend for SqliteIndex {
    fn ensure_schema(&self) -> Result<(), IndexError> {
        let connection = self
            .connect()
            .map_err(|err| IndexError::Schema { source: err.into() })?;
        connection
            .execute_batch(SCHEMA)
            .map_err(|source| IndexError::Schema {
                source: SqliteIndexError::Schema { source }.into(),
            })
    }

    fn push_junctions(&self, docs: &[JunctionDocument]) -> Result<usize, IndexError> {
        let dataset = Dataset::Junctions;
        self.write(dataset, docs, |transaction, doc| {
            let streets = to_string(&doc.streets).map_err(|source| {
                SqliteIndexError::Serialize {
                    dataset,
                    id: doc.id,
                    source,
                }
            })?;
            insert(transaction, dataset, doc.id, &doc.name, doc.location, streets)
        })
    }

    fn push_points(&self, docs: &[PointDocument]) -> Result<usize, IndexError> {
        let dataset = Dataset::Points;
        self.write(dataset, docs, |transaction, doc| {
            let tags = tags_json(dataset, doc.id, &doc.tags)?;
            insert(transaction, dataset, doc.id, &doc.name, doc.location, tags)
        })
    }

    fn push_paths(&self, docs: &[PathDocument]) -> Result<usize, IndexError> {
        let dataset = Dataset::Paths;
        self.write(dataset, docs, |transaction, doc| {
            let tags = tags_json(dataset, doc.id, &doc.tags)?;
            insert(transaction, dataset, doc.id, &doc.name, doc.location, tags)
        })
    }

    fn delete_indices(&self) -> Result<(), IndexError> {
        let connection = self
            .connect()
            .map_err(|err| IndexError::Delete { source: err.into() })?;
        connection
            .execute_batch(
                "DROP TABLE IF EXISTS junctions;
                 DROP TABLE IF EXISTS points;
                 DROP TABLE IF EXISTS paths;",
            )
            .map_err(|source| IndexError::Delete {
                source: SqliteIndexError::Schema { source }.into(),
            })
    }

    fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>, IndexError> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        self.run_search(query, limit)
            .map_err(|err| IndexError::Search {
                query: query.to_owned(),
                source: err.into(),
            })
    }
}
