use async_trait::async_trait;
use sqlx::PgPool;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::database::manager::DatabaseError;
use crate::database::query_builder::{
    bind_param_query, bind_param_query_as, bind_param_query_scalar, Condition, DeleteQuery, InsertQuery,
    SelectQuery, SortDirection, SqlResult, UpdateQuery,
};
use crate::types::{Pagination, PathUpdate, Pid, ProtectedPath};

/// Persistent store of protected path records.
///
/// Lookups return records in ascending `pid` order, so when several records
/// share a path the lowest `pid` wins.
#[async_trait]
pub trait ProtectedPathRegistry: Send + Sync {
    /// First record whose path equals either value
    async fn find_by_path_equals(&self, a: &str, b: &str) -> Result<Option<ProtectedPath>, DatabaseError>;

    async fn get(&self, pid: Pid) -> Result<Option<ProtectedPath>, DatabaseError>;

    async fn insert(&self, path: &str, password_hash: &str) -> Result<Pid, DatabaseError>;

    async fn update(&self, pid: Pid, update: PathUpdate) -> Result<(), DatabaseError>;

    async fn delete(&self, pid: Pid) -> Result<(), DatabaseError>;

    async fn list_all(&self, page: Pagination) -> Result<Vec<ProtectedPath>, DatabaseError>;

    /// Cheap reachability probe for health checks
    async fn ping(&self) -> Result<(), DatabaseError> {
        Ok(())
    }
}

fn normalize_stored_path(path: &str) -> String {
    path.trim().to_lowercase()
}

/// Postgres-backed registry over the `protected_pages` table
#[derive(Clone)]
pub struct PgRegistry {
    pool: PgPool,
}

impl PgRegistry {
    pub const TABLE: &'static str = "protected_pages";

    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the table and path index when missing
    pub async fn ensure_schema(&self) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS "protected_pages" (
                "pid" BIGSERIAL PRIMARY KEY,
                "path" TEXT NOT NULL,
                "password" TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;
        sqlx::query(r#"CREATE INDEX IF NOT EXISTS "protected_pages_path_idx" ON "protected_pages" ("path")"#)
            .execute(&self.pool)
            .await?;
        info!("Ensured schema for table: {}", Self::TABLE);
        Ok(())
    }

    async fn select_all(&self, sql: SqlResult) -> Result<Vec<ProtectedPath>, DatabaseError> {
        debug!("registry query: {}", sql.query);
        let mut q = sqlx::query_as::<_, ProtectedPath>(&sql.query);
        for p in sql.params.iter() {
            q = bind_param_query_as(q, p);
        }
        Ok(q.fetch_all(&self.pool).await?)
    }

    async fn select_optional(&self, sql: SqlResult) -> Result<Option<ProtectedPath>, DatabaseError> {
        debug!("registry query: {}", sql.query);
        let mut q = sqlx::query_as::<_, ProtectedPath>(&sql.query);
        for p in sql.params.iter() {
            q = bind_param_query_as(q, p);
        }
        Ok(q.fetch_optional(&self.pool).await?)
    }

    async fn execute(&self, sql: SqlResult) -> Result<u64, DatabaseError> {
        debug!("registry query: {}", sql.query);
        let mut q = sqlx::query(&sql.query);
        for p in sql.params.iter() {
            q = bind_param_query(q, p);
        }
        Ok(q.execute(&self.pool).await?.rows_affected())
    }

    fn select() -> SelectQuery {
        SelectQuery::from(Self::TABLE)
            .columns(["pid", "path", "password"])
            .order_by("pid", SortDirection::Asc)
    }
}

#[async_trait]
impl ProtectedPathRegistry for PgRegistry {
    async fn find_by_path_equals(&self, a: &str, b: &str) -> Result<Option<ProtectedPath>, DatabaseError> {
        let sql = Self::select()
            .condition(Condition::equals_any("path", [a, b]))
            .limit(1, None)
            .to_sql()?;
        self.select_optional(sql).await
    }

    async fn get(&self, pid: Pid) -> Result<Option<ProtectedPath>, DatabaseError> {
        let sql = Self::select().condition(Condition::equals("pid", pid)).limit(1, None).to_sql()?;
        self.select_optional(sql).await
    }

    async fn insert(&self, path: &str, password_hash: &str) -> Result<Pid, DatabaseError> {
        let sql = InsertQuery::into_table(Self::TABLE)
            .value("path", normalize_stored_path(path))
            .value("password", password_hash)
            .returning("pid")
            .to_sql()?;
        let mut q = sqlx::query_scalar::<_, i64>(&sql.query);
        for p in sql.params.iter() {
            q = bind_param_query_scalar(q, p);
        }
        let pid = q.fetch_one(&self.pool).await?;
        Ok(pid)
    }

    async fn update(&self, pid: Pid, update: PathUpdate) -> Result<(), DatabaseError> {
        if update.is_empty() {
            return match self.get(pid).await? {
                Some(_) => Ok(()),
                None => Err(DatabaseError::NotFound(format!("Protected page {} not found", pid))),
            };
        }
        let mut query = UpdateQuery::table(Self::TABLE);
        if let Some(path) = update.path {
            query = query.set("path", normalize_stored_path(&path));
        }
        if let Some(password) = update.password {
            query = query.set("password", password);
        }
        let sql = query.condition(Condition::equals("pid", pid)).to_sql()?;
        match self.execute(sql).await? {
            0 => Err(DatabaseError::NotFound(format!("Protected page {} not found", pid))),
            _ => Ok(()),
        }
    }

    async fn delete(&self, pid: Pid) -> Result<(), DatabaseError> {
        let sql = DeleteQuery::from(Self::TABLE).condition(Condition::equals("pid", pid)).to_sql()?;
        match self.execute(sql).await? {
            0 => Err(DatabaseError::NotFound(format!("Protected page {} not found", pid))),
            _ => Ok(()),
        }
    }

    async fn list_all(&self, page: Pagination) -> Result<Vec<ProtectedPath>, DatabaseError> {
        let sql = Self::select().limit(page.limit, Some(page.offset)).to_sql()?;
        self.select_all(sql).await
    }

    async fn ping(&self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// In-process registry with the same ordering guarantees as [`PgRegistry`]
#[derive(Clone, Default)]
pub struct MemoryRegistry {
    inner: Arc<RwLock<MemoryTable>>,
}

#[derive(Default)]
struct MemoryTable {
    rows: BTreeMap<Pid, ProtectedPath>,
    next_pid: Pid,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record with an explicit pid, replacing any record with that pid
    pub async fn insert_with_pid(&self, pid: Pid, path: &str, password_hash: &str) {
        let mut table = self.inner.write().await;
        table.rows.insert(
            pid,
            ProtectedPath {
                pid,
                path: normalize_stored_path(path),
                password: password_hash.to_string(),
            },
        );
        table.next_pid = table.next_pid.max(pid);
    }
}

#[async_trait]
impl ProtectedPathRegistry for MemoryRegistry {
    async fn find_by_path_equals(&self, a: &str, b: &str) -> Result<Option<ProtectedPath>, DatabaseError> {
        let table = self.inner.read().await;
        Ok(table.rows.values().find(|p| p.path == a || p.path == b).cloned())
    }

    async fn get(&self, pid: Pid) -> Result<Option<ProtectedPath>, DatabaseError> {
        Ok(self.inner.read().await.rows.get(&pid).cloned())
    }

    async fn insert(&self, path: &str, password_hash: &str) -> Result<Pid, DatabaseError> {
        let mut table = self.inner.write().await;
        table.next_pid += 1;
        let pid = table.next_pid;
        table.rows.insert(
            pid,
            ProtectedPath {
                pid,
                path: normalize_stored_path(path),
                password: password_hash.to_string(),
            },
        );
        Ok(pid)
    }

    async fn update(&self, pid: Pid, update: PathUpdate) -> Result<(), DatabaseError> {
        let mut table = self.inner.write().await;
        let row = table
            .rows
            .get_mut(&pid)
            .ok_or_else(|| DatabaseError::NotFound(format!("Protected page {} not found", pid)))?;
        if let Some(path) = update.path {
            row.path = normalize_stored_path(&path);
        }
        if let Some(password) = update.password {
            row.password = password;
        }
        Ok(())
    }

    async fn delete(&self, pid: Pid) -> Result<(), DatabaseError> {
        self.inner
            .write()
            .await
            .rows
            .remove(&pid)
            .map(|_| ())
            .ok_or_else(|| DatabaseError::NotFound(format!("Protected page {} not found", pid)))
    }

    async fn list_all(&self, page: Pagination) -> Result<Vec<ProtectedPath>, DatabaseError> {
        let table = self.inner.read().await;
        Ok(table
            .rows
            .values()
            .skip(page.offset.max(0) as usize)
            .take(page.limit.max(0) as usize)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn find_matches_either_value() {
        let registry = MemoryRegistry::new();
        let pid = registry.insert("/Secret", "hash").await.unwrap();

        let by_alias = registry.find_by_path_equals("/secret", "/node/12").await.unwrap();
        let by_canonical = registry.find_by_path_equals("/about", "/secret").await.unwrap();
        assert_eq!(by_alias.map(|p| p.pid), Some(pid));
        assert_eq!(by_canonical.map(|p| p.pid), Some(pid));
        assert!(registry.find_by_path_equals("/a", "/b").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicates_resolve_to_lowest_pid() {
        let registry = MemoryRegistry::new();
        registry.insert_with_pid(9, "/dup", "h9").await;
        registry.insert_with_pid(4, "/dup", "h4").await;
        for _ in 0..3 {
            let found = registry.find_by_path_equals("/dup", "/dup").await.unwrap().unwrap();
            assert_eq!(found.pid, 4);
        }
    }

    #[tokio::test]
    async fn update_and_delete_missing_pid_report_not_found() {
        let registry = MemoryRegistry::new();
        let err = registry.update(3, PathUpdate { path: Some("/x".into()), password: None }).await;
        assert!(matches!(err, Err(DatabaseError::NotFound(_))));
        assert!(matches!(registry.delete(3).await, Err(DatabaseError::NotFound(_))));
    }

    #[tokio::test]
    async fn update_replaces_only_given_fields() {
        let registry = MemoryRegistry::new();
        let pid = registry.insert("/old", "h1").await.unwrap();
        registry
            .update(pid, PathUpdate { path: Some("/NEW".into()), password: None })
            .await
            .unwrap();
        let row = registry.get(pid).await.unwrap().unwrap();
        assert_eq!(row.path, "/new");
        assert_eq!(row.password, "h1");
    }

    #[tokio::test]
    async fn list_all_pages_in_pid_order() {
        let registry = MemoryRegistry::new();
        for i in 0..5 {
            registry.insert(&format!("/p{}", i), "h").await.unwrap();
        }
        let page = registry.list_all(Pagination::new(2, 1)).await.unwrap();
        let pids: Vec<Pid> = page.iter().map(|p| p.pid).collect();
        assert_eq!(pids, vec![2, 3]);
    }
}
