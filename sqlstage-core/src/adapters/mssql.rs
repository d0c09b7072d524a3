//! SQL Server engine built on tiberius.
//!
//! Each operation opens its own client and drops it when done. The number of
//! clients open at once is capped by `EngineOptions::pool_size`, and waiting
//! for a slot plus the TCP/TDS handshake together must finish within
//! `EngineOptions::pool_timeout`.
//!
//! Named instances are located through the SQL Browser service. Windows
//! authentication (integrated or `DOMAIN\user`) is only available when built
//! for Windows.
//!
//! # Security
//! Driver errors are wrapped with a fixed context string and never include
//! the address or credentials.

use super::Engine;
use crate::config::EngineOptions;
use crate::models::{IfExists, TableRef, TabularData, Value};
use crate::resolver::{AuthMode, ConnectionDescriptor, ConnectionKind};
use crate::{Result, SqlStageError};
use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use std::time::Duration;
use tiberius::{AuthMethod, Client, ColumnData, Config, Query, Row, SqlBrowser};
use tokio::net::TcpStream;
use tokio::sync::Semaphore;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};
use tracing::{debug, trace};

/// SQL Server limits a single `VALUES` list to 1000 rows.
const MAX_ROWS_PER_INSERT: usize = 1000;
/// SQL Server limits a request to 2100 parameters.
const MAX_PARAMS_PER_REQUEST: usize = 2100;

type SqlClient = Client<Compat<TcpStream>>;

/// SQL Server engine with bounded client concurrency.
pub struct SqlServerEngine {
    config: Config,
    named_instance: bool,
    permits: Semaphore,
    pool_timeout: Duration,
    pre_ping: bool,
    array_size: usize,
}

impl SqlServerEngine {
    /// Builds an engine for a SQL Server descriptor.
    ///
    /// Nothing is dialled until the first operation.
    ///
    /// # Errors
    /// Returns error if the descriptor is not a SQL Server descriptor or its
    /// auth path is unavailable on this platform.
    pub fn new(descriptor: &ConnectionDescriptor, options: &EngineOptions) -> Result<Self> {
        if !descriptor.kind().is_sql_server() {
            return Err(SqlStageError::unsupported_feature(
                "SQL Server engine",
                descriptor.kind().to_string(),
            ));
        }

        let endpoint = descriptor.endpoint();
        let mut config = Config::new();
        config.host(&endpoint.host);
        if let Some(database) = &endpoint.database {
            config.database(database);
        }
        if let Some(instance) = &endpoint.instance {
            config.instance_name(instance);
        }
        config.application_name("sqlstage");
        config.trust_cert();
        config.authentication(auth_method(descriptor)?);

        Ok(Self {
            config,
            named_instance: descriptor.kind() == ConnectionKind::NamedInstanceSqlServer,
            permits: Semaphore::new(usize::try_from(options.pool_size).unwrap_or(1)),
            pool_timeout: options.pool_timeout,
            pre_ping: options.pre_ping,
            array_size: usize::try_from(options.array_size).unwrap_or(MAX_ROWS_PER_INSERT),
        })
    }

    async fn open(&self) -> Result<SqlClient> {
        let tcp = if self.named_instance {
            TcpStream::connect_named(&self.config)
                .await
                .map_err(|e| SqlStageError::connection_failed("SQL Browser lookup failed", e))?
        } else {
            TcpStream::connect(self.config.get_addr())
                .await
                .map_err(|e| SqlStageError::connection_failed("TCP connect failed", e))?
        };
        tcp.set_nodelay(true)
            .map_err(|e| SqlStageError::connection_failed("Failed to configure socket", e))?;

        let mut client = Client::connect(self.config.clone(), tcp.compat_write())
            .await
            .map_err(|e| SqlStageError::connection_failed("Login to SQL Server failed", e))?;

        if self.pre_ping {
            client
                .simple_query("SELECT 1")
                .await
                .map_err(|e| SqlStageError::connection_failed("Pre-ping failed", e))?
                .into_results()
                .await
                .map_err(|e| SqlStageError::connection_failed("Pre-ping failed", e))?;
        }

        Ok(client)
    }

    /// Runs `work` with a freshly opened client while holding a pool slot.
    async fn with_client<T, F>(&self, work: F) -> Result<T>
    where
        F: for<'c> FnOnce(
            &'c mut SqlClient,
        )
            -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<T>> + Send + 'c>>,
    {
        let (_permit, mut client) = tokio::time::timeout(self.pool_timeout, async {
            let permit = self.permits.acquire().await.map_err(|_| {
                SqlStageError::configuration("SQL Server client pool is closed")
            })?;
            let client = self.open().await?;
            Ok::<_, SqlStageError>((permit, client))
        })
        .await
        .map_err(|_| {
            SqlStageError::connection_failed(
                "Timed out waiting for a SQL Server client",
                std::io::Error::from(std::io::ErrorKind::TimedOut),
            )
        })??;

        let result = work(&mut client).await;
        if let Err(e) = client.close().await {
            debug!("Closing SQL Server client failed: {}", e);
        }
        result
    }
}

/// Rows per `INSERT` for a table `width` columns wide.
fn batch_rows(array_size: usize, width: usize) -> usize {
    let by_params = MAX_PARAMS_PER_REQUEST
        .checked_div(width)
        .unwrap_or(MAX_ROWS_PER_INSERT);
    array_size.min(MAX_ROWS_PER_INSERT).min(by_params).max(1)
}

fn auth_method(descriptor: &ConnectionDescriptor) -> Result<AuthMethod> {
    match (descriptor.auth(), descriptor.credentials()) {
        #[cfg(windows)]
        (Some(AuthMode::Domain), Some(creds)) => Ok(AuthMethod::windows(
            creds.qualified_username(),
            creds.password(),
        )),
        #[cfg(windows)]
        (Some(AuthMode::Integrated), _) => Ok(AuthMethod::Integrated),
        (Some(AuthMode::Domain), _) => Err(SqlStageError::unsupported_feature(
            "Domain authentication",
            "SQL Server on this platform",
        )),
        _ => Err(SqlStageError::unsupported_feature(
            "Integrated authentication",
            "SQL Server on this platform",
        )),
    }
}

/// Reads the first result set, keeping column names even when it is empty.
async fn read_first_result(client: &mut SqlClient, sql: &str) -> Result<TabularData> {
    let mut stream = client
        .simple_query(sql)
        .await
        .map_err(|e| SqlStageError::query_failed(format!("Query failed: {}", e)))?;

    let columns: Vec<String> = stream
        .columns()
        .await
        .map_err(|e| SqlStageError::query_failed(format!("Reading columns failed: {}", e)))?
        .map(|cols| cols.iter().map(|c| c.name().to_string()).collect())
        .unwrap_or_default();

    let rows = stream
        .into_first_result()
        .await
        .map_err(|e| SqlStageError::query_failed(format!("Reading rows failed: {}", e)))?;

    let mut data = TabularData::new(columns);
    for row in &rows {
        data.push_row(convert_row(row))?;
    }
    trace!("Read {} rows", data.len());
    Ok(data)
}

fn convert_row(row: &Row) -> Vec<Value> {
    row.cells()
        .enumerate()
        .map(|(i, (_column, data))| match data {
            ColumnData::Bit(Some(b)) => Value::Bool(*b),
            ColumnData::U8(Some(v)) => Value::Int(i64::from(*v)),
            ColumnData::I16(Some(v)) => Value::Int(i64::from(*v)),
            ColumnData::I32(Some(v)) => Value::Int(i64::from(*v)),
            ColumnData::I64(Some(v)) => Value::Int(*v),
            ColumnData::F32(Some(v)) => Value::Float(f64::from(*v)),
            ColumnData::F64(Some(v)) => Value::Float(*v),
            ColumnData::Numeric(Some(n)) => Value::Text(n.to_string()),
            ColumnData::String(Some(s)) => Value::Text(s.to_string()),
            ColumnData::Guid(Some(g)) => Value::Text(g.to_string()),
            ColumnData::Binary(Some(b)) => Value::Text(BASE64.encode(b)),
            ColumnData::Xml(Some(xml)) => Value::Text(xml.to_string()),
            ColumnData::DateTime(Some(_))
            | ColumnData::SmallDateTime(Some(_))
            | ColumnData::DateTime2(Some(_)) => row
                .try_get::<chrono::NaiveDateTime, _>(i)
                .ok()
                .flatten()
                .map_or(Value::Null, Value::DateTime),
            ColumnData::DateTimeOffset(Some(_)) => row
                .try_get::<chrono::DateTime<chrono::Utc>, _>(i)
                .ok()
                .flatten()
                .map_or(Value::Null, |dt| Value::DateTime(dt.naive_utc())),
            ColumnData::Date(Some(_)) => row
                .try_get::<chrono::NaiveDate, _>(i)
                .ok()
                .flatten()
                .map_or(Value::Null, |d| Value::Text(d.format("%Y-%m-%d").to_string())),
            ColumnData::Time(Some(_)) => row
                .try_get::<chrono::NaiveTime, _>(i)
                .ok()
                .flatten()
                .map_or(Value::Null, |t| Value::Text(t.format("%H:%M:%S%.f").to_string())),
            _ => Value::Null,
        })
        .collect()
}

fn bind_value(query: &mut Query<'_>, value: &Value) {
    match value {
        Value::Null => query.bind(Option::<String>::None),
        Value::Bool(b) => query.bind(*b),
        Value::Int(i) => query.bind(*i),
        Value::Float(f) => query.bind(*f),
        Value::DateTime(dt) => query.bind(*dt),
        Value::Text(s) => query.bind(s.clone()),
    }
}

fn insert_statement(table: &TableRef, columns: &[String], rows: usize) -> String {
    let column_list = columns
        .iter()
        .map(|c| format!("[{}]", c.replace(']', "]]")))
        .collect::<Vec<_>>()
        .join(", ");

    let mut param = 0_usize;
    let values = (0..rows)
        .map(|_| {
            let placeholders = columns
                .iter()
                .map(|_| {
                    param = param.saturating_add(1);
                    format!("@P{}", param)
                })
                .collect::<Vec<_>>()
                .join(", ");
            format!("({})", placeholders)
        })
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "INSERT INTO {} ({}) VALUES {}",
        table.bracketed(),
        column_list,
        values
    )
}

#[async_trait]
impl Engine for SqlServerEngine {
    async fn query(&self, sql: &str) -> Result<TabularData> {
        let sql = sql.to_string();
        self.with_client(move |client| {
            Box::pin(async move { read_first_result(client, &sql).await })
        })
        .await
    }

    async fn fetch_table(&self, table: &TableRef) -> Result<TabularData> {
        let sql = format!("SELECT * FROM {}", table.bracketed());
        self.with_client(move |client| {
            Box::pin(async move { read_first_result(client, &sql).await })
        })
        .await
    }

    async fn append(
        &self,
        data: &TabularData,
        table: &TableRef,
        if_exists: IfExists,
    ) -> Result<u64> {
        if data.columns().is_empty() {
            return Err(SqlStageError::configuration(
                "Cannot push data without columns",
            ));
        }

        let batch = batch_rows(self.array_size, data.columns().len());
        let data = data.clone();
        let table = table.clone();

        self.with_client(move |client| {
            Box::pin(async move {
                if if_exists == IfExists::Replace {
                    client
                        .execute(format!("DELETE FROM {}", table.bracketed()), &[])
                        .await
                        .map_err(|e| {
                            SqlStageError::query_failed(format!("Clearing {} failed: {}", table, e))
                        })?;
                }

                let mut written = 0_u64;
                for chunk in data.rows().chunks(batch) {
                    let mut query =
                        Query::new(insert_statement(&table, data.columns(), chunk.len()));
                    for value in chunk.iter().flatten() {
                        bind_value(&mut query, value);
                    }
                    let result = query.execute(&mut *client).await.map_err(|e| {
                        SqlStageError::query_failed(format!("Insert into {} failed: {}", table, e))
                    })?;
                    written = written.saturating_add(result.total());
                }
                Ok(written)
            })
        })
        .await
    }

    async fn execute(&self, sql: &str) -> Result<u64> {
        let sql = sql.to_string();
        self.with_client(move |client| {
            Box::pin(async move {
                let result = client
                    .execute(sql, &[])
                    .await
                    .map_err(|e| SqlStageError::query_failed(format!("Statement failed: {}", e)))?;
                Ok(result.total())
            })
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::{ConnectionFields, FieldName, resolve};

    fn descriptor(kind: ConnectionKind, auth: AuthMode) -> ConnectionDescriptor {
        let fields = ConnectionFields::new()
            .with(FieldName::Host, "localhost")
            .with(FieldName::Database, "SALES_DB")
            .with(FieldName::Instance, "SQLEXPRESS")
            .with(FieldName::Domain, "CORP")
            .with(FieldName::DomainUser, "etl")
            .with(FieldName::DomainPassword, "pw");
        resolve(kind, auth, "mssql", &fields)
            .into_result(kind)
            .unwrap()
    }

    #[test]
    fn test_insert_statement_numbers_parameters() {
        let table = TableRef::in_schema("staging", "Sales");
        let columns = vec!["store".to_string(), "sale_value".to_string()];
        assert_eq!(
            insert_statement(&table, &columns, 2),
            "INSERT INTO [staging].[Sales] ([store], [sale_value]) VALUES (@P1, @P2), (@P3, @P4)"
        );
    }

    #[test]
    fn test_batch_rows_respects_limits() {
        assert_eq!(batch_rows(5000, 1), 1000);
        assert_eq!(batch_rows(5000, 6), 350);
        assert_eq!(batch_rows(100, 6), 100);
        assert_eq!(batch_rows(5000, 3000), 1);
    }

    #[cfg(windows)]
    #[test]
    fn test_engine_builds_on_windows() {
        for auth in [AuthMode::Integrated, AuthMode::Domain] {
            let engine = SqlServerEngine::new(
                &descriptor(ConnectionKind::NamedInstanceSqlServer, auth),
                &EngineOptions::default(),
            )
            .unwrap();
            assert!(engine.named_instance);
        }
    }

    #[cfg(not(windows))]
    #[test]
    fn test_windows_auth_unavailable_off_windows() {
        for auth in [AuthMode::Integrated, AuthMode::Domain] {
            let result = SqlServerEngine::new(
                &descriptor(ConnectionKind::NamedInstanceSqlServer, auth),
                &EngineOptions::default(),
            );
            assert!(matches!(
                result,
                Err(SqlStageError::UnsupportedFeature { .. })
            ));
        }
    }
}
