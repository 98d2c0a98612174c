//! PostgreSQL store.

mod asset;
mod folder;

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use tokio::sync::Mutex;
use tracing::debug;

use assethub_core::error::{AppError, ErrorKind};
use assethub_core::result::AppResult;

use assethub_core::types::{AssetId, FolderId};
use assethub_entity::{Asset, AssetCriteria, Folder, FolderCriteria};

use crate::repositories::{AssetRepository, FolderRepository, StoreTransaction, TransactionScope};

/// Run a query on the store's transaction if it has one, else on the pool.
macro_rules! execute {
    ($store:expr, $query:expr, $method:ident) => {{
        let mut slot = $store.tx.lock().await;
        match slot.as_mut() {
            Some(tx) => $query.$method(&mut **tx).await,
            None => $query.$method(&$store.pool).await,
        }
    }};
}

pub(crate) use execute;

/// Folder and asset rows in PostgreSQL.
///
/// Queries on a store built with [`PgStore::new`] run on the pool. Each
/// [`begin`](TransactionScope::begin) hands out a [`PgTransaction`] that
/// owns its connection.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
    tx: Arc<Mutex<Option<Transaction<'static, Postgres>>>>,
}

impl PgStore {
    /// Create a store over a connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            tx: Arc::new(Mutex::new(None)),
        }
    }
}

pub(crate) fn db_error(message: &'static str) -> impl FnOnce(sqlx::Error) -> AppError {
    move |e| AppError::with_source(ErrorKind::Database, message, e)
}

#[async_trait]
impl TransactionScope for PgStore {
    async fn begin(&self) -> AppResult<Box<dyn StoreTransaction>> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("Failed to begin transaction"))?;
        debug!("Transaction started");
        Ok(Box::new(PgTransaction {
            inner: PgStore {
                pool: self.pool.clone(),
                tx: Arc::new(Mutex::new(Some(tx))),
            },
        }))
    }
}

/// A transaction on its own pooled connection.
#[derive(Debug)]
pub struct PgTransaction {
    inner: PgStore,
}

impl PgTransaction {
    async fn take(&self) -> AppResult<Transaction<'static, Postgres>> {
        self.inner
            .tx
            .lock()
            .await
            .take()
            .ok_or_else(|| AppError::internal("Transaction already finished"))
    }
}

#[async_trait]
impl FolderRepository for PgTransaction {
    async fn find_folders(&self, criteria: &FolderCriteria) -> AppResult<Vec<Folder>> {
        self.inner.find_folders(criteria).await
    }

    async fn count_folders(&self, criteria: &FolderCriteria) -> AppResult<u64> {
        self.inner.count_folders(criteria).await
    }

    async fn save_folder(&self, folder: &Folder) -> AppResult<FolderId> {
        self.inner.save_folder(folder).await
    }

    async fn delete_folders(&self, ids: &[FolderId]) -> AppResult<u64> {
        self.inner.delete_folders(ids).await
    }
}

#[async_trait]
impl AssetRepository for PgTransaction {
    async fn find_assets(&self, criteria: &AssetCriteria) -> AppResult<Vec<Asset>> {
        self.inner.find_assets(criteria).await
    }

    async fn count_assets(&self, criteria: &AssetCriteria) -> AppResult<u64> {
        self.inner.count_assets(criteria).await
    }

    async fn save_asset(&self, asset: &Asset) -> AppResult<AssetId> {
        self.inner.save_asset(asset).await
    }

    async fn delete_asset(&self, id: AssetId) -> AppResult<bool> {
        self.inner.delete_asset(id).await
    }

    async fn delete_assets_in_folders(&self, folder_ids: &[FolderId]) -> AppResult<u64> {
        self.inner.delete_assets_in_folders(folder_ids).await
    }
}

#[async_trait]
impl StoreTransaction for PgTransaction {
    async fn commit(self: Box<Self>) -> AppResult<()> {
        self.take()
            .await?
            .commit()
            .await
            .map_err(db_error("Failed to commit transaction"))?;
        debug!("Transaction committed");
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> AppResult<()> {
        self.take()
            .await?
            .rollback()
            .await
            .map_err(db_error("Failed to roll back transaction"))?;
        debug!("Transaction rolled back");
        Ok(())
    }
}
