//! Translation statistics tree aggregation.
//!
//! A translation's progress is tracked as a tree of statistics nodes. Leaf
//! nodes hold raw counters entered by translators; chapter nodes hold the
//! sum of their direct children. Chapter counters are only correct right
//! after [`recalculate`] (or [`rebuild`]) ran; nothing keeps them in sync
//! implicitly.
//!
//! The functions here work against the [`ChapterStore`] port so they can run
//! inside a database transaction or against an in-memory tree in tests.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::DbId;

/// Title given to the root chapter created together with a statistics tree.
pub const ROOT_TITLE: &str = "Top-level section";

// ---------------------------------------------------------------------------
// Counters
// ---------------------------------------------------------------------------

/// The four progress counters carried by every statistics node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counters {
    pub total_rows: i32,
    pub translated: i32,
    pub edited_first_pass: i32,
    pub edited_second_pass: i32,
}

impl Counters {
    pub fn new(
        total_rows: i32,
        translated: i32,
        edited_first_pass: i32,
        edited_second_pass: i32,
    ) -> Self {
        Self {
            total_rows,
            translated,
            edited_first_pass,
            edited_second_pass,
        }
    }

    /// Raw counters entered for a leaf must not be negative.
    pub fn validate(&self) -> Result<(), CoreError> {
        let fields = [
            ("total_rows", self.total_rows),
            ("translated", self.translated),
            ("edited_first_pass", self.edited_first_pass),
            ("edited_second_pass", self.edited_second_pass),
        ];
        for (name, value) in fields {
            if value < 0 {
                return Err(CoreError::Validation(format!(
                    "{name} must be non-negative, got {value}"
                )));
            }
        }
        Ok(())
    }

    pub fn checked_add(self, other: Counters) -> Option<Counters> {
        Some(Counters {
            total_rows: self.total_rows.checked_add(other.total_rows)?,
            translated: self.translated.checked_add(other.translated)?,
            edited_first_pass: self.edited_first_pass.checked_add(other.edited_first_pass)?,
            edited_second_pass: self.edited_second_pass.checked_add(other.edited_second_pass)?,
        })
    }

    /// Field-wise sum. The sum of no counters is all zeros.
    pub fn sum<'a, I>(items: I) -> Result<Counters, CoreError>
    where
        I: IntoIterator<Item = &'a Counters>,
    {
        items
            .into_iter()
            .try_fold(Counters::default(), |acc, c| acc.checked_add(*c))
            .ok_or_else(sum_overflow)
    }

    /// Narrow sums computed in 64-bit arithmetic, failing the same way
    /// [`Counters::sum`] does when a field does not fit.
    pub fn from_wide_sums(
        total_rows: i64,
        translated: i64,
        edited_first_pass: i64,
        edited_second_pass: i64,
    ) -> Result<Counters, CoreError> {
        let narrow = |value: i64| i32::try_from(value).map_err(|_| sum_overflow());
        Ok(Counters {
            total_rows: narrow(total_rows)?,
            translated: narrow(translated)?,
            edited_first_pass: narrow(edited_first_pass)?,
            edited_second_pass: narrow(edited_second_pass)?,
        })
    }

    /// Completion percentages relative to `total_rows`.
    pub fn progress(&self) -> Progress {
        let pct = |part: i32| {
            if self.total_rows <= 0 {
                0.0
            } else {
                f64::from(part) * 100.0 / f64::from(self.total_rows)
            }
        };
        Progress {
            translated: pct(self.translated),
            edited_first_pass: pct(self.edited_first_pass),
            edited_second_pass: pct(self.edited_second_pass),
        }
    }
}

fn sum_overflow() -> CoreError {
    CoreError::Validation("Counter sum overflows a 32-bit integer".into())
}

/// Completion percentages (0-100) derived from [`Counters`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Progress {
    pub translated: f64,
    pub edited_first_pass: f64,
    pub edited_second_pass: f64,
}

// ---------------------------------------------------------------------------
// Port
// ---------------------------------------------------------------------------

/// The structural part of a statistics node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChapterLink {
    pub id: DbId,
    pub tree_id: DbId,
    pub parent_id: Option<DbId>,
    pub is_chapter: bool,
}

/// Persistence operations the aggregator needs.
#[async_trait]
pub trait ChapterStore: Send {
    /// Load a node's link. Fails with [`CoreError::NotFound`] when absent.
    async fn link(&mut self, id: DbId) -> Result<ChapterLink, CoreError>;

    /// Field-wise sum of the counters of `id`'s direct children.
    /// Returns zeros when the node has no children.
    async fn child_totals(&mut self, id: DbId) -> Result<Counters, CoreError>;

    /// Persist new counters for `id`.
    async fn store_counters(&mut self, id: DbId, counters: Counters) -> Result<(), CoreError>;

    /// Re-attach `id` below `parent_id`.
    async fn set_parent(&mut self, id: DbId, parent_id: DbId) -> Result<(), CoreError>;

    /// Every node of a tree.
    async fn tree_links(&mut self, tree_id: DbId) -> Result<Vec<ChapterLink>, CoreError>;
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

/// Result of walking one ancestor chain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Recalculation {
    /// Chapters written, in walk order (starting node first, root last).
    pub persisted: Vec<(DbId, Counters)>,
    /// Last node visited, i.e. the tree root.
    pub root_id: DbId,
}

/// Recompute `node_id` (if it is a chapter) from its direct children, then
/// do the same for every ancestor up to the root.
///
/// Exactly one write happens per chapter on the path; leaves are only read.
pub async fn recalculate<S>(store: &mut S, node_id: DbId) -> Result<Recalculation, CoreError>
where
    S: ChapterStore + ?Sized,
{
    let mut visited = HashSet::new();
    let mut outcome = Recalculation {
        persisted: Vec::new(),
        root_id: node_id,
    };
    let mut current = Some(node_id);

    while let Some(id) = current {
        if !visited.insert(id) {
            return Err(CoreError::CorruptTree { node_id: id });
        }
        let link = store.link(id).await?;
        if link.is_chapter {
            let totals = store.child_totals(id).await?;
            store.store_counters(id, totals).await?;
            outcome.persisted.push((id, totals));
        }
        outcome.root_id = id;
        current = link.parent_id;
    }

    tracing::debug!(
        node_id,
        root_id = outcome.root_id,
        persisted = outcome.persisted.len(),
        "Recalculated statistics chain"
    );
    Ok(outcome)
}

/// Store raw counters on a leaf and propagate them up the tree.
///
/// Chapter counters are derived, so writing them directly is refused.
pub async fn update_leaf<S>(
    store: &mut S,
    node_id: DbId,
    counters: Counters,
) -> Result<Recalculation, CoreError>
where
    S: ChapterStore + ?Sized,
{
    counters.validate()?;
    let link = store.link(node_id).await?;
    if link.is_chapter {
        return Err(CoreError::Validation(format!(
            "Node {node_id} is a chapter; its counters are computed from its children"
        )));
    }
    store.store_counters(node_id, counters).await?;

    match link.parent_id {
        Some(parent_id) => recalculate(store, parent_id).await,
        None => Ok(Recalculation {
            persisted: Vec::new(),
            root_id: node_id,
        }),
    }
}

/// Ids of every ancestor of `node_id`, nearest first.
pub async fn ancestors<S>(store: &mut S, node_id: DbId) -> Result<Vec<DbId>, CoreError>
where
    S: ChapterStore + ?Sized,
{
    let mut chain = Vec::new();
    let mut visited = HashSet::from([node_id]);
    let mut current = store.link(node_id).await?.parent_id;

    while let Some(id) = current {
        if !visited.insert(id) {
            return Err(CoreError::CorruptTree { node_id: id });
        }
        chain.push(id);
        current = store.link(id).await?.parent_id;
    }
    Ok(chain)
}

/// Check that `parent` may receive a new child.
pub fn ensure_can_parent(parent: &ChapterLink, tree_id: DbId) -> Result<(), CoreError> {
    if parent.tree_id != tree_id {
        return Err(CoreError::Validation(format!(
            "Node {} belongs to tree {}, not tree {tree_id}",
            parent.id, parent.tree_id
        )));
    }
    if !parent.is_chapter {
        return Err(CoreError::Validation(format!(
            "Node {} is not a chapter and cannot have children",
            parent.id
        )));
    }
    Ok(())
}

/// Move `node_id` (with its subtree) below `new_parent_id` and recompute
/// both the old and the new ancestor chains.
///
/// Roots cannot be moved, nodes cannot leave their tree, and a node cannot
/// be moved below itself or one of its descendants.
pub async fn move_node<S>(
    store: &mut S,
    node_id: DbId,
    new_parent_id: DbId,
) -> Result<Vec<Recalculation>, CoreError>
where
    S: ChapterStore + ?Sized,
{
    let node = store.link(node_id).await?;
    let Some(old_parent_id) = node.parent_id else {
        return Err(CoreError::Validation(format!(
            "Node {node_id} is the root of its tree and cannot be moved"
        )));
    };
    if old_parent_id == new_parent_id {
        return Ok(Vec::new());
    }

    let new_parent = store.link(new_parent_id).await?;
    ensure_can_parent(&new_parent, node.tree_id)?;
    if new_parent_id == node_id || ancestors(store, new_parent_id).await?.contains(&node_id) {
        return Err(CoreError::Validation(format!(
            "Node {node_id} cannot be moved below its own descendant {new_parent_id}"
        )));
    }

    store.set_parent(node_id, new_parent_id).await?;
    tracing::info!(node_id, old_parent_id, new_parent_id, "Moved statistics node");

    Ok(vec![
        recalculate(store, old_parent_id).await?,
        recalculate(store, new_parent_id).await?,
    ])
}

/// Recompute every chapter of a tree, deepest first, so the chapter
/// invariant holds for the whole tree afterwards.
pub async fn rebuild<S>(store: &mut S, tree_id: DbId) -> Result<Vec<(DbId, Counters)>, CoreError>
where
    S: ChapterStore + ?Sized,
{
    let links = store.tree_links(tree_id).await?;
    let depths = depths(&links)?;

    let mut chapters: Vec<&ChapterLink> = links.iter().filter(|l| l.is_chapter).collect();
    chapters.sort_by_key(|l| (std::cmp::Reverse(depths[&l.id]), l.id));

    let mut written = Vec::with_capacity(chapters.len());
    for chapter in chapters {
        let totals = store.child_totals(chapter.id).await?;
        store.store_counters(chapter.id, totals).await?;
        written.push((chapter.id, totals));
    }

    tracing::info!(tree_id, chapters = written.len(), "Rebuilt statistics tree");
    Ok(written)
}

/// Depth of every node (root = 0), computed from parent links alone.
fn depths(links: &[ChapterLink]) -> Result<HashMap<DbId, usize>, CoreError> {
    let parents: HashMap<DbId, Option<DbId>> =
        links.iter().map(|l| (l.id, l.parent_id)).collect();
    let mut depths: HashMap<DbId, usize> = HashMap::with_capacity(links.len());

    for link in links {
        let mut path = Vec::new();
        let mut seen = HashSet::new();
        let mut current = Some(link.id);
        let mut base = 0;

        while let Some(id) = current {
            if let Some(known) = depths.get(&id) {
                base = known + 1;
                break;
            }
            if !seen.insert(id) {
                return Err(CoreError::CorruptTree { node_id: id });
            }
            path.push(id);
            // A parent outside this tree's node set ends the walk.
            current = parents.get(&id).copied().flatten();
            if current.is_some_and(|p| !parents.contains_key(&p)) {
                current = None;
            }
        }

        for (offset, id) in path.iter().rev().enumerate() {
            depths.insert(*id, base + offset);
        }
    }
    Ok(depths)
}

/// Label used when listing nodes in a flat select box: one `---` per level
/// below `base_level`, then the script title.
pub fn indented_label(script_title: &str, level: i32, base_level: i32) -> String {
    let depth = usize::try_from(level - base_level).unwrap_or(0);
    format!("{} {script_title}", "---".repeat(depth))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
