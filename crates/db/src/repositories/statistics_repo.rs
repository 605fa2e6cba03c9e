//! Repository for statistics trees and their nodes.
//!
//! Every write runs in one transaction holding the tree's advisory lock, so
//! concurrent edits of the same tree are serialized and a failed
//! recalculation leaves no partial counters behind. The `statistics_trees`
//! summary is refreshed from the root before commit.

use sqlx::PgPool;
use vnt_core::error::CoreError;
use vnt_core::statistics::{self, ensure_can_parent, ChapterStore, Counters, Recalculation};
use vnt_core::types::DbId;
use vnt_core::validation::validate_input;

use crate::error::{found, map_db_error};
use crate::models::statistics::{
    CreateStatisticsNode, StatisticsNode, StatisticsTree, TreeNode, UpdateTreeNotes,
};
use crate::stores::chapter::NODE_COLUMNS;
use crate::stores::PgChapterStore;

/// Column list for statistics_trees queries.
const TREE_COLUMNS: &str = "\
    id, pictures_statistics, technical_statistics, comment, \
    total_rows, translated, edited_first_pass, edited_second_pass, \
    last_update, created_at, updated_at";

/// Node columns qualified with the `c.` alias, for joins.
const QUALIFIED_NODE_COLUMNS: &str = "\
    c.id, c.tree_id, c.parent_id, c.title, c.script_title, c.is_chapter, \
    c.total_rows, c.translated, c.edited_first_pass, c.edited_second_pass, \
    c.last_update, c.created_at, c.updated_at";

pub struct StatisticsRepo;

impl StatisticsRepo {
    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    pub async fn find_tree(pool: &PgPool, tree_id: DbId) -> Result<StatisticsTree, CoreError> {
        let query = format!("SELECT {TREE_COLUMNS} FROM statistics_trees WHERE id = $1");
        let row = sqlx::query_as::<_, StatisticsTree>(&query)
            .bind(tree_id)
            .fetch_optional(pool)
            .await
            .map_err(map_db_error)?;
        found(row, "statistics tree", tree_id)
    }

    pub async fn find_node(pool: &PgPool, id: DbId) -> Result<StatisticsNode, CoreError> {
        let query = format!("SELECT {NODE_COLUMNS} FROM statistics_chapters WHERE id = $1");
        let row = sqlx::query_as::<_, StatisticsNode>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(map_db_error)?;
        found(row, "statistics node", id)
    }

    /// Root node of a tree.
    pub async fn find_root(pool: &PgPool, tree_id: DbId) -> Result<StatisticsNode, CoreError> {
        let query = format!(
            "SELECT {NODE_COLUMNS} FROM statistics_chapters \
             WHERE tree_id = $1 AND parent_id IS NULL"
        );
        let row = sqlx::query_as::<_, StatisticsNode>(&query)
            .bind(tree_id)
            .fetch_optional(pool)
            .await
            .map_err(map_db_error)?;
        found(row, "statistics tree", tree_id)
    }

    /// Direct children of a node, in insertion order.
    pub async fn children(pool: &PgPool, parent_id: DbId) -> Result<Vec<StatisticsNode>, CoreError> {
        let query = format!(
            "SELECT {NODE_COLUMNS} FROM statistics_chapters WHERE parent_id = $1 ORDER BY id"
        );
        sqlx::query_as::<_, StatisticsNode>(&query)
            .bind(parent_id)
            .fetch_all(pool)
            .await
            .map_err(map_db_error)
    }

    /// Every node of a tree in depth-first order (children in insertion
    /// order), each with its depth below the root.
    pub async fn list_tree(pool: &PgPool, tree_id: DbId) -> Result<Vec<TreeNode>, CoreError> {
        let query = format!(
            "WITH RECURSIVE walk AS ( \
                SELECT c.id, 0 AS level, ARRAY[c.id] AS path \
                FROM statistics_chapters c \
                WHERE c.tree_id = $1 AND c.parent_id IS NULL \
              UNION ALL \
                SELECT c.id, w.level + 1, w.path || c.id \
                FROM statistics_chapters c JOIN walk w ON c.parent_id = w.id \
             ) \
             SELECT {QUALIFIED_NODE_COLUMNS}, w.level \
             FROM walk w JOIN statistics_chapters c ON c.id = w.id \
             ORDER BY w.path"
        );
        sqlx::query_as::<_, TreeNode>(&query)
            .bind(tree_id)
            .fetch_all(pool)
            .await
            .map_err(map_db_error)
    }

    /// Update the free-text notes of a tree.
    pub async fn update_tree_notes(
        pool: &PgPool,
        tree_id: DbId,
        input: &UpdateTreeNotes,
    ) -> Result<StatisticsTree, CoreError> {
        validate_input(input)?;
        let query = format!(
            "UPDATE statistics_trees SET \
                pictures_statistics = COALESCE($2, pictures_statistics), \
                technical_statistics = COALESCE($3, technical_statistics), \
                comment = COALESCE($4, comment) \
             WHERE id = $1 RETURNING {TREE_COLUMNS}"
        );
        let row = sqlx::query_as::<_, StatisticsTree>(&query)
            .bind(tree_id)
            .bind(&input.pictures_statistics)
            .bind(&input.technical_statistics)
            .bind(&input.comment)
            .fetch_optional(pool)
            .await
            .map_err(map_db_error)?;
        found(row, "statistics tree", tree_id)
    }

    // -----------------------------------------------------------------------
    // Writes
    // -----------------------------------------------------------------------

    /// Add a node below an existing chapter and propagate the change.
    pub async fn add_node(
        pool: &PgPool,
        input: &CreateStatisticsNode,
    ) -> Result<(StatisticsNode, Recalculation), CoreError> {
        validate_input(input)?;
        let counters = match (input.is_chapter, input.counters) {
            (false, Some(counters)) => {
                counters.validate()?;
                counters
            }
            _ => Counters::default(),
        };

        let mut store = Self::locked(pool, input.parent_id).await?;
        let parent = store.link(input.parent_id).await?;
        ensure_can_parent(&parent, parent.tree_id)?;

        let title = input.title.as_deref().unwrap_or_default();
        let script_title = input.script_title.as_deref().unwrap_or(title);
        let node = store
            .insert_node(
                parent.tree_id,
                parent.id,
                title,
                script_title,
                input.is_chapter,
                counters,
            )
            .await?;

        let recalculation = statistics::recalculate(&mut store, node.id).await?;
        Self::finish(store, parent.tree_id).await?;

        tracing::info!(
            node_id = node.id,
            tree_id = node.tree_id,
            parent_id = parent.id,
            is_chapter = node.is_chapter,
            "Added statistics node"
        );
        Ok((node, recalculation))
    }

    /// Store raw counters on a leaf and propagate them to the root.
    pub async fn update_leaf_counters(
        pool: &PgPool,
        node_id: DbId,
        counters: Counters,
    ) -> Result<Recalculation, CoreError> {
        let mut store = Self::locked(pool, node_id).await?;
        let tree_id = store.link(node_id).await?.tree_id;
        let recalculation = statistics::update_leaf(&mut store, node_id, counters).await?;
        Self::finish(store, tree_id).await?;
        Ok(recalculation)
    }

    /// Recompute `node_id` and its ancestors from their children.
    pub async fn recalculate(pool: &PgPool, node_id: DbId) -> Result<Recalculation, CoreError> {
        let mut store = Self::locked(pool, node_id).await?;
        let tree_id = store.link(node_id).await?.tree_id;
        let recalculation = statistics::recalculate(&mut store, node_id).await?;
        Self::finish(store, tree_id).await?;
        Ok(recalculation)
    }

    /// Move a node with its subtree below another chapter of the same tree.
    pub async fn move_node(
        pool: &PgPool,
        node_id: DbId,
        new_parent_id: DbId,
    ) -> Result<Vec<Recalculation>, CoreError> {
        let mut store = Self::locked(pool, node_id).await?;
        let tree_id = store.link(node_id).await?.tree_id;
        let recalculations = statistics::move_node(&mut store, node_id, new_parent_id).await?;
        Self::finish(store, tree_id).await?;
        Ok(recalculations)
    }

    /// Delete a node and its subtree, then recompute the former parent's
    /// chain. The root cannot be deleted on its own; it goes with its
    /// translation item.
    pub async fn delete_node(pool: &PgPool, node_id: DbId) -> Result<Recalculation, CoreError> {
        let mut store = Self::locked(pool, node_id).await?;
        let link = store.link(node_id).await?;
        let Some(parent_id) = link.parent_id else {
            return Err(CoreError::Validation(format!(
                "Node {node_id} is the root of its tree and cannot be deleted"
            )));
        };

        store.delete_node(node_id).await?;
        let recalculation = statistics::recalculate(&mut store, parent_id).await?;
        Self::finish(store, link.tree_id).await?;

        tracing::info!(node_id, tree_id = link.tree_id, parent_id, "Deleted statistics node");
        Ok(recalculation)
    }

    /// Recompute every chapter of a tree from its leaves.
    pub async fn rebuild(pool: &PgPool, tree_id: DbId) -> Result<Vec<(DbId, Counters)>, CoreError> {
        let mut store = PgChapterStore::begin(pool).await?;
        store.lock_tree(tree_id).await?;
        store.root_of(tree_id).await?;
        let written = statistics::rebuild(&mut store, tree_id).await?;
        Self::finish(store, tree_id).await?;
        Ok(written)
    }

    /// Open a transaction and take the lock of the tree `node_id` belongs to.
    async fn locked(pool: &PgPool, node_id: DbId) -> Result<PgChapterStore, CoreError> {
        let mut store = PgChapterStore::begin(pool).await?;
        let tree_id = store.tree_of(node_id).await?;
        store.lock_tree(tree_id).await?;
        Ok(store)
    }

    async fn finish(mut store: PgChapterStore, tree_id: DbId) -> Result<(), CoreError> {
        store.refresh_summary(tree_id).await?;
        store.commit().await
    }
}
