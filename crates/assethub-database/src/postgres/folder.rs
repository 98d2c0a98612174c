//! Folder table queries.

use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder};

use assethub_core::error::{AppError, ErrorKind};
use assethub_core::result::AppResult;
use assethub_core::types::FolderId;
use assethub_core::types::param::parse_list_param;
use assethub_entity::folder::{FolderOrder, ParentFilter, PathFilter};
use assethub_entity::{Folder, FolderCriteria};

use super::{PgStore, db_error, execute};
use crate::repositories::FolderRepository;

const FOLDER_COLUMNS: &str = "id, parent_id, backend_id, name, path";

fn push_conditions(qb: &mut QueryBuilder<'static, Postgres>, criteria: &FolderCriteria) {
    qb.push(" WHERE TRUE");

    if !criteria.ids.is_empty() {
        qb.push(" AND id = ANY(")
            .push_bind(criteria.ids.clone())
            .push(")");
    }
    if !criteria.backend_ids.is_empty() {
        qb.push(" AND backend_id = ANY(")
            .push_bind(criteria.backend_ids.clone())
            .push(")");
    }
    match criteria.parent {
        Some(ParentFilter::TopLevel) => {
            qb.push(" AND parent_id IS NULL");
        }
        Some(ParentFilter::Is(parent_id)) => {
            qb.push(" AND parent_id = ").push_bind(parent_id);
        }
        None => {}
    }
    if let Some(name) = &criteria.name {
        qb.push(" AND name = ANY(")
            .push_bind(parse_list_param(name))
            .push(")");
    }
    match &criteria.path {
        Some(PathFilter::Exact(raw)) => {
            qb.push(" AND path = ANY(")
                .push_bind(parse_list_param(raw))
                .push(")");
        }
        Some(PathFilter::Prefix(prefix)) => {
            qb.push(" AND starts_with(path, ")
                .push_bind(prefix.clone())
                .push(")");
        }
        None => {}
    }
}

#[async_trait]
impl FolderRepository for PgStore {
    async fn find_folders(&self, criteria: &FolderCriteria) -> AppResult<Vec<Folder>> {
        let mut qb = QueryBuilder::new(format!("SELECT {FOLDER_COLUMNS} FROM asset_folders"));
        push_conditions(&mut qb, criteria);

        qb.push(match criteria.order {
            FolderOrder::Path => " ORDER BY path ASC, name ASC",
            FolderOrder::Name => " ORDER BY name ASC",
        });
        if let Some(limit) = criteria.limit {
            qb.push(" LIMIT ").push_bind(limit as i64);
        }
        if let Some(offset) = criteria.offset {
            qb.push(" OFFSET ").push_bind(offset as i64);
        }

        execute!(self, qb.build_query_as::<Folder>(), fetch_all)
            .map_err(db_error("Failed to find folders"))
    }

    async fn count_folders(&self, criteria: &FolderCriteria) -> AppResult<u64> {
        let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM asset_folders");
        push_conditions(&mut qb, criteria);

        let count: i64 = execute!(self, qb.build_query_scalar::<i64>(), fetch_one)
            .map_err(db_error("Failed to count folders"))?;
        Ok(count as u64)
    }

    async fn save_folder(&self, folder: &Folder) -> AppResult<FolderId> {
        let sql = match folder.id {
            None => {
                "INSERT INTO asset_folders (parent_id, backend_id, name, path) \
                 VALUES ($1, $2, $3, $4) RETURNING id"
            }
            Some(_) => {
                "INSERT INTO asset_folders (id, parent_id, backend_id, name, path) \
                 VALUES ($5, $1, $2, $3, $4) \
                 ON CONFLICT (id) DO UPDATE SET parent_id = EXCLUDED.parent_id, \
                 backend_id = EXCLUDED.backend_id, name = EXCLUDED.name, \
                 path = EXCLUDED.path, updated_at = NOW() \
                 RETURNING id"
            }
        };
        let mut query = sqlx::query_scalar::<_, FolderId>(sql)
            .bind(folder.parent_id)
            .bind(folder.backend_id)
            .bind(&folder.name)
            .bind(&folder.path);
        if let Some(id) = folder.id {
            query = query.bind(id);
        }

        execute!(self, query, fetch_one).map_err(|e| match e {
            sqlx::Error::Database(ref db_err)
                if db_err.constraint() == Some("asset_folders_backend_path_key") =>
            {
                AppError::conflict(format!("Folder path '{}' already exists", folder.path))
            }
            _ => AppError::with_source(ErrorKind::Database, "Failed to save folder", e),
        })
    }

    async fn delete_folders(&self, ids: &[FolderId]) -> AppResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        let query = sqlx::query("DELETE FROM asset_folders WHERE id = ANY($1)").bind(ids.to_vec());
        let result = execute!(self, query, execute).map_err(db_error("Failed to delete folders"))?;
        Ok(result.rows_affected())
    }
}
