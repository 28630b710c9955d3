//! DuckDB-backed warehouse

use super::queries::WarehouseTables;
use super::WarehouseQuery;
use crate::endpoint::{ADMISSIONS, FOLLOWINGS};
use crate::error::{Error, Result};
use async_trait::async_trait;
use duckdb::{params, Connection, Params};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Mutex;

/// Warehouse queries over a DuckDB database
pub struct DuckDbWarehouse {
    conn: Mutex<Connection>,
    tables: WarehouseTables,
}

impl DuckDbWarehouse {
    /// Open a database file, or an in-memory database when `path` is `None`
    pub fn open(path: Option<&Path>, tables: WarehouseTables) -> Result<Self> {
        let conn = match path {
            Some(path) => Connection::open(path)?,
            None => Connection::open_in_memory()?,
        };
        Ok(Self::from_connection(conn, tables))
    }

    /// Wrap an existing connection
    pub fn from_connection(conn: Connection, tables: WarehouseTables) -> Self {
        Self {
            conn: Mutex::new(conn),
            tables,
        }
    }

    /// Table naming in use
    pub fn tables(&self) -> &WarehouseTables {
        &self.tables
    }

    /// Run statements with no result set, e.g. to seed staging tables
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        let conn = self.lock()?;
        conn.execute_batch(sql)
            .map_err(|e| Error::warehouse(format!("Failed to execute batch: {e}")))
    }

    /// Check the connection answers a trivial query
    pub fn check_connection(&self) -> Result<()> {
        let conn = self.lock()?;
        conn.execute("SELECT 1", [])
            .map_err(|e| Error::warehouse(format!("Connection check failed: {e}")))?;
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::warehouse("warehouse connection lock poisoned"))
    }

    /// Run a single-column id query, skipping null ids
    fn query_ids<P: Params>(&self, sql: &str, params: P) -> Result<Vec<String>> {
        tracing::debug!("Executing warehouse query: {}", sql);
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(sql)
            .map_err(|e| Error::warehouse(format!("Failed to prepare query: {e}")))?;

        let ids = stmt
            .query_map(params, |row| row.get::<_, Option<String>>(0))
            .map_err(|e| Error::warehouse(format!("Failed to run query: {e}")))?
            .filter_map(std::result::Result::transpose)
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| Error::warehouse(format!("Failed to read row: {e}")))?;

        Ok(ids)
    }

    fn children(&self, endpoint: &str, student_id: &str) -> Result<Vec<String>> {
        let sql = self.tables.student_children_sql(endpoint)?;
        self.query_ids(&sql, params![student_id])
    }
}

#[async_trait]
impl WarehouseQuery for DuckDbWarehouse {
    async fn scope_ids(&self, endpoint: &str, grad_year: u16) -> Result<HashSet<String>> {
        let sql = self.tables.scope_ids_sql(endpoint)?;
        let ids = self.query_ids(&sql, params![i64::from(grad_year)])?;
        Ok(ids.into_iter().collect())
    }

    async fn admission_ids(&self, student_id: &str) -> Result<Vec<String>> {
        self.children(ADMISSIONS, student_id)
    }

    async fn following_ids(&self, student_id: &str) -> Result<Vec<String>> {
        self.children(FOLLOWINGS, student_id)
    }
}
