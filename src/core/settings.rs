//! # Settings Tree
//!
//! An ordered key/child tree holding the parsed settings file. A node whose
//! children have no grandchildren doubles as a list of values: `make: [a, b]`
//! is the node `make` with the leaf children `a` and `b`.
//!
//! The tree is built once from the settings file and then only read. Lookups
//! never fall back to the node itself: a missing key is reported as `None`.

use std::fmt;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SettingsError {
    #[error("Invalid settings path '{0}': path segments must not be empty")]
    InvalidPath(String),

    #[error("Could not interpret the value(s) {values:?} at '{path}' as {expected}")]
    Cast {
        path: String,
        values: Vec<String>,
        expected: &'static str,
    },
}

pub type SettingsResult<T> = Result<T, SettingsError>;

/// A named node owning an ordered list of child nodes.
#[derive(Debug, Clone)]
pub struct SettingsNode {
    key: String,
    children: Vec<SettingsNode>,
}

/// Joins a key path for diagnostics, e.g. `make/build/jobs`.
pub fn display_path<K: AsRef<str>>(path: &[K]) -> String {
    path.iter()
        .map(|k| k.as_ref())
        .collect::<Vec<_>>()
        .join("/")
}

impl SettingsNode {
    /// Creates an empty node. The key cannot be changed afterwards.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            children: Vec::new(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// The children of this node, in insertion order.
    pub fn children(&self) -> &[SettingsNode] {
        &self.children
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    // --- Navigation ---

    /// Returns the direct child named `key`, if any.
    pub fn child(&self, key: &str) -> Option<&SettingsNode> {
        self.children.iter().find(|c| c.key == key)
    }

    fn child_mut(&mut self, key: &str) -> Option<&mut SettingsNode> {
        self.children.iter_mut().find(|c| c.key == key)
    }

    /// Follows `path` from this node. An empty path yields the node itself.
    pub fn child_at<K: AsRef<str>>(&self, path: &[K]) -> Option<&SettingsNode> {
        path.iter()
            .try_fold(self, |node, key| node.child(key.as_ref()))
    }

    fn child_at_mut<K: AsRef<str>>(&mut self, path: &[K]) -> Option<&mut SettingsNode> {
        let mut node = self;
        for key in path {
            node = node.child_mut(key.as_ref())?;
        }
        Some(node)
    }

    /// Returns true when every segment of `path` exists.
    pub fn contains<K: AsRef<str>>(&self, path: &[K]) -> bool {
        self.child_at(path).is_some()
    }

    // --- Mutation (construction phase only) ---

    /// Descends along `path`, creating missing nodes, and appends `value` as a leaf.
    pub fn add<K: AsRef<str>>(&mut self, path: &[K], value: impl Into<String>) -> SettingsResult<()> {
        self.add_values(path, [value])
    }

    /// Descends along `path`, creating missing nodes, and appends every value as a leaf.
    ///
    /// Values accumulate: adding to an existing path appends, duplicates included.
    pub fn add_values<K, V, I>(&mut self, path: &[K], values: I) -> SettingsResult<()>
    where
        K: AsRef<str>,
        V: Into<String>,
        I: IntoIterator<Item = V>,
    {
        let node = self.ensure_path(path)?;
        node.children
            .extend(values.into_iter().map(|v| SettingsNode::new(v)));
        Ok(())
    }

    /// Creates every missing node along `path` and returns the last one.
    pub fn ensure_path<K: AsRef<str>>(&mut self, path: &[K]) -> SettingsResult<&mut SettingsNode> {
        if path.iter().any(|k| k.as_ref().is_empty()) {
            return Err(SettingsError::InvalidPath(display_path(path)));
        }

        let mut node = self;
        for key in path {
            let key = key.as_ref();
            let position = match node.children.iter().position(|c| c.key == key) {
                Some(position) => position,
                None => {
                    node.children.push(SettingsNode::new(key));
                    node.children.len() - 1
                }
            };
            node = match node.children.get_mut(position) {
                Some(child) => child,
                None => return Err(SettingsError::InvalidPath(display_path(path))),
            };
        }
        Ok(node)
    }

    /// Removes the subtree at `path`.
    ///
    /// An empty path cannot be cleared and returns false. A missing path is
    /// already clear and returns true.
    pub fn clear<K: AsRef<str>>(&mut self, path: &[K]) -> bool {
        let Some((last, parents)) = path.split_last() else {
            log::debug!("Refusing to clear a settings node from itself");
            return false;
        };
        let Some(parent) = self.child_at_mut(parents) else {
            return true;
        };
        parent.children.retain(|c| c.key != last.as_ref());
        true
    }

    /// Replaces whatever is stored at `path` with `values`.
    pub fn replace<K, V, I>(&mut self, path: &[K], values: I) -> SettingsResult<()>
    where
        K: AsRef<str>,
        V: Into<String>,
        I: IntoIterator<Item = V>,
    {
        self.clear(path);
        self.add_values(path, values)
    }

    /// Overlays `other` onto this node, one child key at a time.
    ///
    /// For every child of `other`, the same-keyed child here is replaced by a
    /// deep copy of it. Children of this node that `other` does not mention survive.
    pub fn overwrite(&mut self, other: &SettingsNode) {
        for incoming in &other.children {
            match self.child_mut(&incoming.key) {
                Some(existing) => existing.children = incoming.children.clone(),
                None => self.children.push(incoming.clone()),
            }
        }
    }

    // --- Value access ---

    /// The keys of the direct children, or `None` when there are none.
    pub fn values(&self) -> Option<Vec<String>> {
        if self.children.is_empty() {
            return None;
        }
        Some(self.children.iter().map(|c| c.key.clone()).collect())
    }

    /// The values stored at `path`, or `None` if the path is missing or empty.
    pub fn get<K: AsRef<str>>(&self, path: &[K]) -> Option<Vec<String>> {
        self.child_at(path).and_then(SettingsNode::values)
    }

    /// The values stored at `path`, or `default` if there are none.
    pub fn get_or<K: AsRef<str>>(&self, path: &[K], default: Vec<String>) -> Vec<String> {
        self.get(path).unwrap_or(default)
    }

    fn write_tree(&self, f: &mut fmt::Formatter<'_>, indent: &str) -> fmt::Result {
        let marker = if self.children.is_empty() { "" } else { ":" };
        writeln!(f, "{}- {}{}", indent, self.key, marker)?;
        let nested = format!("{}  ", indent);
        for child in &self.children {
            child.write_tree(f, &nested)?;
        }
        Ok(())
    }
}

/// Structural equality: same key and, for every child, a same-keyed match in `other`.
impl PartialEq for SettingsNode {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
            && self.children.len() == other.children.len()
            && self
                .children
                .iter()
                .all(|child| other.child(&child.key).is_some_and(|theirs| theirs == child))
    }
}

impl Eq for SettingsNode {}

impl fmt::Display for SettingsNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_tree(f, "")
    }
}
