//! Breadth-first subtree relocation.
//!
//! A node's identity is its path, so moving a subtree means re-keying every node in it. The walk
//! is split into a plan phase, which reads the table and may fail on allocation, and a commit
//! phase, which only moves entries into chain space reserved up front. Either the whole subtree
//! moves or nothing does.

use std::collections::VecDeque;

use crate::error::{Error, Result};
use crate::path::{Direction, Path};
use crate::table::{Entry, PathTable};

/// Outcome of [`relocate`].
#[derive(Debug)]
pub struct Relocation<K, V> {
    /// Nodes re-keyed, the subtree root included.
    pub moved: usize,
    /// Entry that sat at the source path and was overwritten by a relocated descendant.
    ///
    /// When this is `None` the source path still holds that entry and the caller is
    /// responsible for removing it.
    pub displaced: Option<Entry<K, V>>,
}

/// Moves the subtree rooted at `source` so that it is rooted at `target` instead.
///
/// `target` must already hold an entry: the subtree root's key and value are swapped into it, so
/// afterwards `source` holds whatever `target` held before. Every descendant is re-keyed by
/// replaying its turns below `source` under `target`. The source path itself is never removed
/// here; see [`Relocation::displaced`].
///
/// # Panics
///
/// If `target` is a strict descendant of `source`.
pub fn relocate<K, V>(
    table: &mut PathTable<K, V>,
    source: Path,
    target: Path,
) -> Result<Relocation<K, V>> {
    assert!(
        source == target || !source.is_prefix_of(target),
        "cannot relocate subtree {source} into its own descendant {target}"
    );
    if !table.contains(source) || !table.contains(target) {
        return Err(Error::NotFound);
    }
    if source == target {
        return Ok(Relocation {
            moved: 0,
            displaced: None,
        });
    }

    let plan = plan(table, source, target)?;
    table.reserve_slots(plan.iter().skip(1).map(|&(_, new)| new))?;

    table.swap(source, target)?;
    let mut displaced = None;
    for &(old, new) in &plan[1..] {
        if let Some(prev) = table.rekey(old, new)? {
            debug_assert_eq!(new, source, "relocation overwrote a live node at {new}");
            displaced = Some(prev);
        }
    }

    tracing::trace!(%source, %target, moved = plan.len(), "relocated subtree");
    Ok(Relocation {
        moved: plan.len(),
        displaced,
    })
}

/// (old path, new path) for every node under `source`, in breadth-first order. Each new path
/// replays the node's turns below `source` starting at `target`.
fn plan<K, V>(table: &PathTable<K, V>, source: Path, target: Path) -> Result<Vec<(Path, Path)>> {
    let mut queue = VecDeque::new();
    let mut plan = Vec::new();
    queue.push_back(source);

    while let Some(old) = queue.pop_front() {
        let new = old.rebase(source, target).ok_or(Error::DepthExceeded {
            depth: usize::from(target.depth()) + usize::from(old.depth() - source.depth()),
        })?;
        plan.try_reserve(1).map_err(|_| Error::alloc(1))?;
        plan.push((old, new));

        for dir in [Direction::Left, Direction::Right] {
            if let Some(child) = old.child(dir).filter(|&p| table.contains(p)) {
                queue.try_reserve(1).map_err(|_| Error::alloc(1))?;
                queue.push_back(child);
            }
        }
    }
    Ok(plan)
}
