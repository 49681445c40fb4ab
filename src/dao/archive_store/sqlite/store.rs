use std::{
    sync::{Arc, Mutex, PoisonError},
    time::SystemTime,
};

use futures::future::BoxFuture;
use indexmap::IndexMap;
use rusqlite::{Connection, Row, params_from_iter, types::Value};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use uuid::Uuid;

use super::error::{SqliteDaoError, SqliteResult};
use crate::{
    dao::{
        archive_store::ArchiveStore,
        models::{ARCHIVE_TABLE, ArchiveRecordEntity},
        storage::StorageResult,
    },
    state::scoreboard::CounterKey,
};

/// Columns written after the counters, in insertion order.
const META_COLUMNS: [&str; 4] = ["Team_1", "Team_2", "Stage", "Date"];
const ID_COLUMN: &str = "Id";

#[derive(Clone)]
pub struct SqliteArchiveStore {
    conn: Arc<Mutex<Connection>>,
    /// `None` for in-memory databases, which cannot be reopened.
    path: Option<Arc<str>>,
}

impl SqliteArchiveStore {
    /// Open (or create) the database file and make sure the archive table exists.
    pub async fn open(path: impl Into<String>) -> SqliteResult<Self> {
        let path: Arc<str> = Arc::from(path.into());
        let opened = path.clone();
        let conn = tokio::task::spawn_blocking(move || open_connection(&opened))
            .await
            .map_err(|source| SqliteDaoError::Worker { source })??;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path: Some(path),
        })
    }

    /// Private in-memory database, mostly useful for tests.
    pub fn open_in_memory() -> SqliteResult<Self> {
        let conn = Connection::open_in_memory().map_err(|source| SqliteDaoError::Open {
            path: ":memory:".into(),
            source,
        })?;
        create_table(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path: None,
        })
    }

    async fn with_connection<T, F>(&self, work: F) -> SqliteResult<T>
    where
        F: FnOnce(&mut Connection) -> SqliteResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let mut guard = conn.lock().unwrap_or_else(PoisonError::into_inner);
            work(&mut guard)
        })
        .await
        .map_err(|source| SqliteDaoError::Worker { source })?
    }

    async fn append_record(&self, record: ArchiveRecordEntity) -> SqliteResult<()> {
        self.with_connection(move |conn| {
            let mut values: Vec<Value> = vec![Value::Text(record.id.to_string())];
            values.extend(CounterKey::all().map(|key| {
                let count = record.counters.get(key.name()).copied().unwrap_or(0);
                Value::Integer(i64::from(count))
            }));
            values.push(Value::Text(record.team1_name));
            values.push(Value::Text(record.team2_name));
            values.push(Value::Text(record.stage));
            values.push(Value::Text(format_timestamp(record.saved_at)?));

            conn.execute(&insert_sql(), params_from_iter(values.iter()))
                .map_err(|source| SqliteDaoError::Insert {
                    id: record.id,
                    source,
                })?;
            Ok(())
        })
        .await
    }

    async fn list_records(&self) -> SqliteResult<Vec<ArchiveRecordEntity>> {
        self.with_connection(|conn| {
            let query_error = |source| SqliteDaoError::Query {
                table: ARCHIVE_TABLE,
                source,
            };
            let mut statement = conn.prepare(&select_sql()).map_err(query_error)?;
            let mut rows = statement.query([]).map_err(query_error)?;

            let mut records = Vec::new();
            while let Some(row) = rows.next().map_err(query_error)? {
                records.push(read_record(row)?);
            }
            Ok(records)
        })
        .await
    }

    async fn ping(&self) -> SqliteResult<()> {
        self.with_connection(|conn| {
            conn.query_row("SELECT 1", [], |_| Ok(()))
                .map_err(|source| SqliteDaoError::Query {
                    table: ARCHIVE_TABLE,
                    source,
                })
        })
        .await
    }

    async fn reopen(&self) -> SqliteResult<()> {
        let Some(path) = self.path.clone() else {
            return Ok(());
        };
        self.with_connection(move |conn| {
            *conn = open_connection(&path)?;
            Ok(())
        })
        .await
    }
}

fn open_connection(path: &str) -> SqliteResult<Connection> {
    let conn = Connection::open(path).map_err(|source| SqliteDaoError::Open {
        path: path.to_string(),
        source,
    })?;
    create_table(&conn)?;
    Ok(conn)
}

fn create_table(conn: &Connection) -> SqliteResult<()> {
    let counter_columns = CounterKey::all()
        .map(|key| format!("\"{}\" INTEGER NOT NULL DEFAULT 0", key.name()))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "CREATE TABLE IF NOT EXISTS {ARCHIVE_TABLE} (\
         \"{ID_COLUMN}\" TEXT PRIMARY KEY, {counter_columns}, \
         \"Team_1\" TEXT NOT NULL, \"Team_2\" TEXT NOT NULL, \
         \"Stage\" TEXT NOT NULL, \"Date\" TEXT NOT NULL)"
    );

    conn.execute_batch(&sql)
        .map_err(|source| SqliteDaoError::CreateTable {
            table: ARCHIVE_TABLE,
            source,
        })
}

fn column_list() -> Vec<String> {
    std::iter::once(ID_COLUMN)
        .chain(CounterKey::all().map(CounterKey::name))
        .chain(META_COLUMNS)
        .map(|column| format!("\"{column}\""))
        .collect()
}

fn insert_sql() -> String {
    let columns = column_list();
    let placeholders = vec!["?"; columns.len()].join(", ");
    format!(
        "INSERT INTO {ARCHIVE_TABLE} ({}) VALUES ({placeholders})",
        columns.join(", ")
    )
}

fn select_sql() -> String {
    format!(
        "SELECT {} FROM {ARCHIVE_TABLE} ORDER BY rowid",
        column_list().join(", ")
    )
}

fn read_record(row: &Row<'_>) -> SqliteResult<ArchiveRecordEntity> {
    let column = |index: usize| -> SqliteResult<Value> {
        row.get::<_, Value>(index)
            .map_err(|source| SqliteDaoError::Query {
                table: ARCHIVE_TABLE,
                source,
            })
    };
    let text = |index: usize, name: &'static str| -> SqliteResult<String> {
        match column(index)? {
            Value::Text(value) => Ok(value),
            other => Err(SqliteDaoError::InvalidValue {
                column: name,
                value: format!("{other:?}"),
            }),
        }
    };

    let raw_id = text(0, ID_COLUMN)?;
    let id = Uuid::parse_str(&raw_id).map_err(|_| SqliteDaoError::InvalidValue {
        column: ID_COLUMN,
        value: raw_id.clone(),
    })?;

    let mut counters = IndexMap::new();
    for (offset, key) in CounterKey::all().enumerate() {
        let value = column(offset + 1)?;
        let count = match &value {
            Value::Integer(raw) => u32::try_from(*raw).ok(),
            _ => None,
        }
        .ok_or_else(|| SqliteDaoError::InvalidValue {
            column: key.name(),
            value: format!("{value:?}"),
        })?;
        counters.insert(key.name().to_string(), count);
    }

    let meta = 1 + counters.len();
    let raw_date = text(meta + 3, "Date")?;

    Ok(ArchiveRecordEntity {
        id,
        counters,
        team1_name: text(meta, "Team_1")?,
        team2_name: text(meta + 1, "Team_2")?,
        stage: text(meta + 2, "Stage")?,
        saved_at: parse_timestamp(&raw_date)?,
    })
}

fn format_timestamp(time: SystemTime) -> SqliteResult<String> {
    OffsetDateTime::from(time)
        .format(&Rfc3339)
        .map_err(|source| SqliteDaoError::FormatTimestamp { source })
}

fn parse_timestamp(value: &str) -> SqliteResult<SystemTime> {
    OffsetDateTime::parse(value, &Rfc3339)
        .map(SystemTime::from)
        .map_err(|_| SqliteDaoError::InvalidValue {
            column: "Date",
            value: value.to_string(),
        })
}

impl ArchiveStore for SqliteArchiveStore {
    fn append_record(&self, record: ArchiveRecordEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.append_record(record).await.map_err(Into::into) })
    }

    fn list_records(&self) -> BoxFuture<'static, StorageResult<Vec<ArchiveRecordEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_records().await.map_err(Into::into) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.reopen().await.map_err(Into::into) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{
        MatchState,
        scoreboard::{PlayerSlot, Stage, StatKind, TeamSide},
    };

    #[tokio::test]
    async fn archived_rows_read_back_in_order() {
        let store = SqliteArchiveStore::open_in_memory().unwrap();
        let mut state = MatchState::new("Sand Sharks", "Dune Riders", Stage::Final);
        state.increment(CounterKey::Score(TeamSide::Team1));
        state.increment(CounterKey::PlayerStat {
            team: TeamSide::Team2,
            player: PlayerSlot::Player2,
            stat: StatKind::MissedServes,
        });

        let first: ArchiveRecordEntity = state.archive().into();
        state.reset();
        let second: ArchiveRecordEntity = state.archive().into();

        ArchiveStore::append_record(&store, first.clone()).await.unwrap();
        ArchiveStore::append_record(&store, second.clone()).await.unwrap();

        let records = ArchiveStore::list_records(&store).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, first.id);
        assert_eq!(records[0].counters, first.counters);
        assert_eq!(records[0].counters["Score_T1"], 1);
        assert_eq!(records[0].counters["T2_P2_miss"], 1);
        assert_eq!(records[0].team1_name, "Sand Sharks");
        assert_eq!(records[0].stage, "Final");
        assert_eq!(records[1].id, second.id);
        assert!(records[1].counters.values().all(|count| *count == 0));
    }

    #[tokio::test]
    async fn timestamps_survive_storage() {
        let store = SqliteArchiveStore::open_in_memory().unwrap();
        let record: ArchiveRecordEntity = MatchState::default().archive().into();
        ArchiveStore::append_record(&store, record.clone()).await.unwrap();

        let stored = ArchiveStore::list_records(&store).await.unwrap().remove(0);
        let drift = stored
            .saved_at
            .duration_since(record.saved_at)
            .unwrap_or_else(|err| err.duration());
        assert!(drift.as_millis() < 1);
    }

    #[tokio::test]
    async fn in_memory_store_is_healthy_and_reconnect_is_a_noop() {
        let store = SqliteArchiveStore::open_in_memory().unwrap();
        let record: ArchiveRecordEntity = MatchState::default().archive().into();
        ArchiveStore::append_record(&store, record).await.unwrap();

        ArchiveStore::health_check(&store).await.unwrap();
        ArchiveStore::try_reconnect(&store).await.unwrap();
        assert_eq!(ArchiveStore::list_records(&store).await.unwrap().len(), 1);
    }

    #[test]
    fn insert_statement_lists_every_column() {
        let sql = insert_sql();
        assert!(sql.starts_with("INSERT INTO championship_archive (\"Id\", \"T1_P1_digs\""));
        assert!(sql.contains("\"Score_T2\", \"Team_1\", \"Team_2\", \"Stage\", \"Date\""));
        assert_eq!(sql.matches('?').count(), 23);
    }
}
