//! Extraction path tracker: the `ARCHIVE:x -> MESSAGE:y` trail shown in logs.

use std::fmt;
use std::ops::{Deref, DerefMut};

use tracing::info;

/// Kind of container a trail node stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    Archive,
    Message,
}

/// One `(kind, name)` step of the trail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrailNode {
    pub kind: ContainerKind,
    pub name: String,
}

impl fmt::Display for TrailNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self.kind {
            ContainerKind::Archive => "ARCHIVE",
            ContainerKind::Message => "MESSAGE",
        };
        write!(f, "{label}:{}", self.name)
    }
}

/// Stack of the containers currently open, innermost last.
#[derive(Debug, Default)]
pub struct ExtractionPath {
    nodes: Vec<TrailNode>,
}

impl ExtractionPath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enter_archive(&mut self, name: &str) -> TrailGuard<'_> {
        self.enter(ContainerKind::Archive, name)
    }

    pub fn enter_message(&mut self, name: &str) -> TrailGuard<'_> {
        self.enter(ContainerKind::Message, name)
    }

    fn enter(&mut self, kind: ContainerKind, name: &str) -> TrailGuard<'_> {
        self.nodes.push(TrailNode {
            kind,
            name: name.to_string(),
        });
        info!("PROCESSING: {}", self);
        TrailGuard { path: self }
    }

    pub fn depth(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[TrailNode] {
        &self.nodes
    }
}

impl fmt::Display for ExtractionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, node) in self.nodes.iter().enumerate() {
            if i > 0 {
                f.write_str(" -> ")?;
            }
            write!(f, "{node}")?;
        }
        Ok(())
    }
}

/// Scope handle for one trail node; pops it when dropped.
///
/// Nested scopes go through the guard (it dereferences to the path), so the
/// borrow checker forces inner nodes to be released before outer ones.
pub struct TrailGuard<'a> {
    path: &'a mut ExtractionPath,
}

impl Deref for TrailGuard<'_> {
    type Target = ExtractionPath;

    fn deref(&self) -> &ExtractionPath {
        &*self.path
    }
}

impl DerefMut for TrailGuard<'_> {
    fn deref_mut(&mut self) -> &mut ExtractionPath {
        &mut *self.path
    }
}

impl Drop for TrailGuard<'_> {
    fn drop(&mut self) {
        self.path.nodes.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_outermost_first() {
        let mut path = ExtractionPath::new();
        let mut archive = path.enter_archive("archive.zip");
        let message = archive.enter_message("a.eml");
        assert_eq!(message.to_string(), "ARCHIVE:archive.zip -> MESSAGE:a.eml");
        assert_eq!(message.depth(), 2);
    }

    #[test]
    fn test_guard_pops_its_node() {
        let mut path = ExtractionPath::new();
        {
            let mut archive = path.enter_archive("archive.zip");
            {
                let _first = archive.enter_message("first.eml");
            }
            let second = archive.enter_message("second.eml");
            assert_eq!(second.to_string(), "ARCHIVE:archive.zip -> MESSAGE:second.eml");
        }
        assert!(path.is_empty());
    }

    #[test]
    fn test_guard_pops_on_error_path() {
        fn nested(path: &mut ExtractionPath) -> Result<(), String> {
            let mut zip = path.enter_archive("outer.zip");
            let _eml = zip.enter_message("inner.eml");
            Err("parse failure".to_string())
        }

        let mut path = ExtractionPath::new();
        assert!(nested(&mut path).is_err());
        assert!(path.is_empty());
    }
}
