use std::collections::BTreeMap;

use myrmidon_actors::Pid;

use crate::names::NameRegistry;

const SEPARATOR: char = '/';

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PathError {
    #[error("Path must start with '/': {:?}", _0)]
    NotAbsolute(String),

    #[error("Path contains an empty segment: {:?}", _0)]
    EmptySegment(String),
}

#[derive(Debug, Default)]
pub(crate) struct Paths(BTreeMap<String, Pid>);

impl NameRegistry {
    /// Bind a hierarchical path such as `/workers/io/0` to `pid` (last write wins).
    pub fn register_path(&self, path: &str, pid: Pid) -> Result<(), PathError> {
        let path = normalize(path)?;
        log::trace!("[reg] path {} -> {}", path, pid);
        self.0.paths.write().0.insert(path, pid);
        Ok(())
    }

    pub fn unregister_path(&self, path: &str) -> Option<Pid> {
        let path = normalize(path).ok()?;
        self.0.paths.write().0.remove(&path)
    }

    /// Unregister `path` only if it is still bound to `pid`.
    pub(crate) fn unbind_path(&self, path: &str, pid: Pid) -> bool {
        let Ok(path) = normalize(path) else { return false };
        let mut paths = self.0.paths.write();
        if paths.0.get(&path) != Some(&pid) {
            return false
        }
        paths.0.remove(&path);
        true
    }

    pub fn whereis_path(&self, path: &str) -> Option<Pid> {
        let path = normalize(path).ok()?;
        self.0.paths.read().0.get(&path).copied()
    }

    /// Every path below `prefix`, at any depth, in lexicographic order.
    pub fn list_children(&self, prefix: &str) -> Vec<(String, Pid)> {
        self.descendants(prefix, |_| true)
    }

    /// The paths exactly one level below `prefix`.
    pub fn list_children_direct(&self, prefix: &str) -> Vec<(String, Pid)> {
        self.descendants(prefix, |rest| !rest.contains(SEPARATOR))
    }

    fn descendants<F>(&self, prefix: &str, filter: F) -> Vec<(String, Pid)>
    where
        F: Fn(&str) -> bool,
    {
        let Ok(prefix) = normalize(prefix) else { return vec![] };
        let base = if prefix.len() == 1 { prefix } else { format!("{}{}", prefix, SEPARATOR) };

        self.0
            .paths
            .read()
            .0
            .range(base.to_owned()..)
            .take_while(|(path, _)| path.starts_with(&base))
            .filter(|(path, _)| path.len() > base.len() && filter(&path[base.len()..]))
            .map(|(path, pid)| (path.to_owned(), *pid))
            .collect()
    }
}

/// `"/a/b/"` -> `"/a/b"`; the root stays `"/"`.
pub(crate) fn normalize(path: &str) -> Result<String, PathError> {
    if !path.starts_with(SEPARATOR) {
        return Err(PathError::NotAbsolute(path.to_owned()))
    }
    let trimmed = path.trim_end_matches(SEPARATOR);
    if trimmed.is_empty() {
        return Ok(SEPARATOR.to_string())
    }
    if trimmed[1..].split(SEPARATOR).any(str::is_empty) {
        return Err(PathError::EmptySegment(path.to_owned()))
    }
    Ok(trimmed.to_owned())
}
