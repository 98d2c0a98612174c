//! Asset table queries.

use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder};

use assethub_core::error::AppError;
use assethub_core::result::AppResult;
use assethub_core::types::param::parse_list_param;
use assethub_core::types::{AssetId, FolderId};
use assethub_entity::{Asset, AssetCriteria};

use super::{PgStore, db_error, execute};
use crate::repositories::AssetRepository;

const ASSET_COLUMNS: &str =
    "id, backend_id, folder_id, filename, kind, size, width, height, date_modified, title";

fn push_conditions(qb: &mut QueryBuilder<'static, Postgres>, criteria: &AssetCriteria) {
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
    if !criteria.folder_ids.is_empty() {
        qb.push(" AND folder_id = ANY(")
            .push_bind(criteria.folder_ids.clone())
            .push(")");
    }
    if let Some(filename) = &criteria.filename {
        qb.push(" AND filename = ANY(")
            .push_bind(parse_list_param(filename))
            .push(")");
    }
    if !criteria.kinds.is_empty() {
        let kinds: Vec<String> = criteria.kinds.iter().map(|k| k.as_str().to_string()).collect();
        qb.push(" AND kind::text = ANY(").push_bind(kinds).push(")");
    }
}

#[async_trait]
impl AssetRepository for PgStore {
    async fn find_assets(&self, criteria: &AssetCriteria) -> AppResult<Vec<Asset>> {
        let mut qb = QueryBuilder::new(format!("SELECT {ASSET_COLUMNS} FROM assets"));
        push_conditions(&mut qb, criteria);
        qb.push(" ORDER BY filename ASC, id ASC");
        if let Some(limit) = criteria.limit {
            qb.push(" LIMIT ").push_bind(limit as i64);
        }
        if let Some(offset) = criteria.offset {
            qb.push(" OFFSET ").push_bind(offset as i64);
        }

        execute!(self, qb.build_query_as::<Asset>(), fetch_all)
            .map_err(db_error("Failed to find assets"))
    }

    async fn count_assets(&self, criteria: &AssetCriteria) -> AppResult<u64> {
        let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM assets");
        push_conditions(&mut qb, criteria);

        let count: i64 = execute!(self, qb.build_query_scalar::<i64>(), fetch_one)
            .map_err(db_error("Failed to count assets"))?;
        Ok(count as u64)
    }

    async fn save_asset(&self, asset: &Asset) -> AppResult<AssetId> {
        let Some(id) = asset.id else {
            let query = sqlx::query_scalar::<_, AssetId>(
                "INSERT INTO assets \
                 (backend_id, folder_id, filename, kind, size, width, height, date_modified, title) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING id",
            )
            .bind(asset.backend_id)
            .bind(asset.folder_id)
            .bind(&asset.filename)
            .bind(asset.kind)
            .bind(asset.size)
            .bind(asset.width)
            .bind(asset.height)
            .bind(asset.date_modified)
            .bind(&asset.title);

            return execute!(self, query, fetch_one).map_err(db_error("Failed to create asset"));
        };

        let query = sqlx::query(
            "UPDATE assets SET backend_id = $2, folder_id = $3, filename = $4, kind = $5, \
             size = $6, width = $7, height = $8, date_modified = $9, title = $10, \
             updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(asset.backend_id)
        .bind(asset.folder_id)
        .bind(&asset.filename)
        .bind(asset.kind)
        .bind(asset.size)
        .bind(asset.width)
        .bind(asset.height)
        .bind(asset.date_modified)
        .bind(&asset.title);

        let result = execute!(self, query, execute).map_err(db_error("Failed to update asset"))?;
        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!(
                "No asset exists with the ID “{id}”."
            )));
        }
        Ok(id)
    }

    async fn delete_asset(&self, id: AssetId) -> AppResult<bool> {
        let query = sqlx::query("DELETE FROM assets WHERE id = $1").bind(id);
        let result = execute!(self, query, execute).map_err(db_error("Failed to delete asset"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_assets_in_folders(&self, folder_ids: &[FolderId]) -> AppResult<u64> {
        if folder_ids.is_empty() {
            return Ok(0);
        }
        let query =
            sqlx::query("DELETE FROM assets WHERE folder_id = ANY($1)").bind(folder_ids.to_vec());
        let result = execute!(self, query, execute).map_err(db_error("Failed to delete assets"))?;
        Ok(result.rows_affected())
    }
}
