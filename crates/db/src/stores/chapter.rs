//! `statistics_chapters` access inside one transaction.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use vnt_core::error::CoreError;
use vnt_core::statistics::{ChapterLink, ChapterStore, Counters};
use vnt_core::types::DbId;

use crate::error::map_db_error;
use crate::models::statistics::StatisticsNode;

/// Column list for statistics_chapters queries.
pub(crate) const NODE_COLUMNS: &str = "\
    id, tree_id, parent_id, title, script_title, is_chapter, \
    total_rows, translated, edited_first_pass, edited_second_pass, \
    last_update, created_at, updated_at";

/// [`ChapterStore`] over a PostgreSQL transaction.
pub struct PgChapterStore {
    tx: Transaction<'static, Postgres>,
}

impl PgChapterStore {
    pub async fn begin(pool: &PgPool) -> Result<Self, CoreError> {
        let tx = pool.begin().await.map_err(map_db_error)?;
        Ok(Self { tx })
    }

    pub async fn commit(self) -> Result<(), CoreError> {
        self.tx.commit().await.map_err(map_db_error)
    }

    /// Serialize writers of one tree until this transaction ends.
    pub async fn lock_tree(&mut self, tree_id: DbId) -> Result<(), CoreError> {
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(tree_id)
            .execute(&mut *self.tx)
            .await
            .map_err(map_db_error)?;
        Ok(())
    }

    /// Tree a node belongs to, looked up before the tree lock is taken.
    pub async fn tree_of(&mut self, node_id: DbId) -> Result<DbId, CoreError> {
        sqlx::query_scalar::<_, DbId>("SELECT tree_id FROM statistics_chapters WHERE id = $1")
            .bind(node_id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(map_db_error)?
            .ok_or(CoreError::NotFound {
                entity: "statistics node",
                id: node_id,
            })
    }

    /// Root node of a tree.
    pub async fn root_of(&mut self, tree_id: DbId) -> Result<DbId, CoreError> {
        sqlx::query_scalar::<_, DbId>(
            "SELECT id FROM statistics_chapters WHERE tree_id = $1 AND parent_id IS NULL",
        )
        .bind(tree_id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(map_db_error)?
        .ok_or(CoreError::NotFound {
            entity: "statistics tree",
            id: tree_id,
        })
    }

    /// Insert a node below `parent_id`. Chapters start at zero; leaves carry
    /// the given counters.
    pub async fn insert_node(
        &mut self,
        tree_id: DbId,
        parent_id: DbId,
        title: &str,
        script_title: &str,
        is_chapter: bool,
        counters: Counters,
    ) -> Result<StatisticsNode, CoreError> {
        let query = format!(
            "INSERT INTO statistics_chapters \
                (tree_id, parent_id, title, script_title, is_chapter, \
                 total_rows, translated, edited_first_pass, edited_second_pass, last_update) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, NOW()) \
             RETURNING {NODE_COLUMNS}"
        );
        sqlx::query_as::<_, StatisticsNode>(&query)
            .bind(tree_id)
            .bind(parent_id)
            .bind(title)
            .bind(script_title)
            .bind(is_chapter)
            .bind(counters.total_rows)
            .bind(counters.translated)
            .bind(counters.edited_first_pass)
            .bind(counters.edited_second_pass)
            .fetch_one(&mut *self.tx)
            .await
            .map_err(map_db_error)
    }

    /// Delete a node; its descendants go with it through the parent FK.
    pub async fn delete_node(&mut self, id: DbId) -> Result<bool, CoreError> {
        let result = sqlx::query("DELETE FROM statistics_chapters WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await
            .map_err(map_db_error)?;
        Ok(result.rows_affected() > 0)
    }

    /// Copy the root's counters onto the `statistics_trees` summary row.
    pub async fn refresh_summary(&mut self, tree_id: DbId) -> Result<(), CoreError> {
        sqlx::query(
            "UPDATE statistics_trees t SET \
                total_rows = c.total_rows, translated = c.translated, \
                edited_first_pass = c.edited_first_pass, \
                edited_second_pass = c.edited_second_pass, \
                last_update = NOW() \
             FROM statistics_chapters c \
             WHERE t.id = $1 AND c.tree_id = t.id AND c.parent_id IS NULL",
        )
        .bind(tree_id)
        .execute(&mut *self.tx)
        .await
        .map_err(map_db_error)?;
        Ok(())
    }
}

#[async_trait]
impl ChapterStore for PgChapterStore {
    async fn link(&mut self, id: DbId) -> Result<ChapterLink, CoreError> {
        let row = sqlx::query_as::<_, (DbId, DbId, Option<DbId>, bool)>(
            "SELECT id, tree_id, parent_id, is_chapter FROM statistics_chapters WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(map_db_error)?;

        let (id, tree_id, parent_id, is_chapter) = row.ok_or(CoreError::NotFound {
            entity: "statistics node",
            id,
        })?;
        Ok(ChapterLink {
            id,
            tree_id,
            parent_id,
            is_chapter,
        })
    }

    async fn child_totals(&mut self, id: DbId) -> Result<Counters, CoreError> {
        // Summed as BIGINT so an overflow is reported by the narrowing below.
        let (total_rows, translated, edited_first_pass, edited_second_pass) =
            sqlx::query_as::<_, (i64, i64, i64, i64)>(
                "SELECT \
                    COALESCE(SUM(total_rows), 0)::BIGINT, \
                    COALESCE(SUM(translated), 0)::BIGINT, \
                    COALESCE(SUM(edited_first_pass), 0)::BIGINT, \
                    COALESCE(SUM(edited_second_pass), 0)::BIGINT \
                 FROM statistics_chapters WHERE parent_id = $1",
            )
            .bind(id)
            .fetch_one(&mut *self.tx)
            .await
            .map_err(map_db_error)?;
        Counters::from_wide_sums(total_rows, translated, edited_first_pass, edited_second_pass)
    }

    async fn store_counters(&mut self, id: DbId, counters: Counters) -> Result<(), CoreError> {
        let result = sqlx::query(
            "UPDATE statistics_chapters SET \
                total_rows = $2, translated = $3, \
                edited_first_pass = $4, edited_second_pass = $5, \
                last_update = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(counters.total_rows)
        .bind(counters.translated)
        .bind(counters.edited_first_pass)
        .bind(counters.edited_second_pass)
        .execute(&mut *self.tx)
        .await
        .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound {
                entity: "statistics node",
                id,
            });
        }
        Ok(())
    }

    async fn set_parent(&mut self, id: DbId, parent_id: DbId) -> Result<(), CoreError> {
        let result = sqlx::query("UPDATE statistics_chapters SET parent_id = $2 WHERE id = $1")
            .bind(id)
            .bind(parent_id)
            .execute(&mut *self.tx)
            .await
            .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound {
                entity: "statistics node",
                id,
            });
        }
        Ok(())
    }

    async fn tree_links(&mut self, tree_id: DbId) -> Result<Vec<ChapterLink>, CoreError> {
        let rows = sqlx::query_as::<_, (DbId, DbId, Option<DbId>, bool)>(
            "SELECT id, tree_id, parent_id, is_chapter FROM statistics_chapters \
             WHERE tree_id = $1 ORDER BY id",
        )
        .bind(tree_id)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(map_db_error)?;

        Ok(rows
            .into_iter()
            .map(|(id, tree_id, parent_id, is_chapter)| ChapterLink {
                id,
                tree_id,
                parent_id,
                is_chapter,
            })
            .collect())
    }
}
