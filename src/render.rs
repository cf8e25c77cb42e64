use std::collections::VecDeque;
use std::fmt;

use crate::path::{Direction, Path};
use crate::PathTree;

/// Level-order dump of a [`PathTree`], one line per node with its path.
///
/// Produced by [`PathTree::render`]. Children are listed right first, and a missing child shows
/// up as `(nil)` directly under its parent's line.
pub struct Render<'a, K, V> {
    tree: &'a PathTree<K, V>,
}

impl<K: fmt::Display, V: fmt::Display> PathTree<K, V> {
    pub fn render(&self) -> Render<'_, K, V> {
        Render { tree: self }
    }
}

impl<K: fmt::Display, V: fmt::Display> fmt::Display for Render<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tree = self.tree;
        writeln!(f, "Binary Search Tree (size: {})", tree.len())?;
        let Some(root) = tree.root_path() else {
            return writeln!(f, "  (empty)");
        };

        // (path, line prefix, is a left child)
        let mut queue: VecDeque<(Path, String, bool)> = VecDeque::new();
        queue.push_back((root, String::new(), true));
        while let Some((path, prefix, is_left)) = queue.pop_front() {
            let entry = tree.entry_at(path);
            writeln!(f, "{prefix}├── {}: {} (path: {path})", entry.key, entry.value)?;

            let child_prefix = format!("{prefix}{}", if is_left { "│   " } else { "    " });
            for dir in [Direction::Right, Direction::Left] {
                match tree.child_path(path, dir) {
                    Some(child) => {
                        queue.push_back((child, child_prefix.clone(), dir == Direction::Left))
                    }
                    None => writeln!(f, "{child_prefix}├── (nil)")?,
                }
            }
        }
        Ok(())
    }
}
