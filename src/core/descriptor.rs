//! # Field Descriptors
//!
//! A `FieldDescriptor` is everything the form knows about one field of the
//! model: where it lives (`FieldPath`), how it is labelled, the schema
//! fragment it was declared with and how that fragment was classified.
//!
//! Descriptors are derived once when a node is built and never edited
//! afterwards. The only exception is `rebase`, used when a collection entry
//! is removed and the entries behind it move up one index.

use std::fmt;

use serde_json::Value;

use crate::core::classify::Classification;

/// One step in a `FieldPath`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PathSegment {
    /// Object property: `.name`
    Field(String),
    /// Collection entry: `[3]`
    Index(usize),
}

/// Location of a field inside the model, e.g. `edition.engine` or `tags[2]`.
///
/// The root path (no segments) addresses the model itself.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldPath {
    segments: Vec<PathSegment>,
}

impl FieldPath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn last(&self) -> Option<&PathSegment> {
        self.segments.last()
    }

    /// Path of a named property below this one.
    pub fn child(&self, name: &str) -> Self {
        let mut next = self.clone();
        next.segments.push(PathSegment::Field(name.to_string()));
        next
    }

    /// Path of a collection entry below this one.
    pub fn index(&self, idx: usize) -> Self {
        let mut next = self.clone();
        next.segments.push(PathSegment::Index(idx));
        next
    }

    pub fn parent(&self) -> Option<Self> {
        if self.is_root() {
            return None;
        }
        let mut parent = self.clone();
        parent.segments.pop();
        Some(parent)
    }

    /// True when `prefix` addresses this path or one of its ancestors.
    pub fn starts_with(&self, prefix: &FieldPath) -> bool {
        self.segments.starts_with(&prefix.segments)
    }

    /// Replace the leading `from` segments with `to`. Paths outside `from`
    /// are returned unchanged.
    pub fn rebased(&self, from: &FieldPath, to: &FieldPath) -> Self {
        if !self.starts_with(from) {
            return self.clone();
        }
        let mut segments = to.segments.clone();
        segments.extend_from_slice(&self.segments[from.segments.len()..]);
        Self { segments }
    }

    /// Parse dot/bracket notation: `user.addresses[0].city`.
    pub fn parse(s: &str) -> Self {
        let mut segments = Vec::new();
        let mut current = String::new();
        let mut chars = s.chars().peekable();

        while let Some(ch) = chars.next() {
            match ch {
                '.' => {
                    if !current.is_empty() {
                        segments.push(PathSegment::Field(std::mem::take(&mut current)));
                    }
                }
                '[' => {
                    if !current.is_empty() {
                        segments.push(PathSegment::Field(std::mem::take(&mut current)));
                    }
                    let mut index = String::new();
                    for c in chars.by_ref() {
                        if c == ']' {
                            break;
                        }
                        index.push(c);
                    }
                    if let Ok(idx) = index.parse::<usize>() {
                        segments.push(PathSegment::Index(idx));
                    }
                }
                _ => current.push(ch),
            }
        }

        if !current.is_empty() {
            segments.push(PathSegment::Field(current));
        }

        Self { segments }
    }

    /// Convert a JSON pointer (`/edition/engine`, `/tags/0`) into a path.
    ///
    /// All-digit tokens are read as collection indices; struct fields never
    /// consist of digits only.
    pub fn from_json_pointer(pointer: &str) -> Self {
        let segments = pointer
            .split('/')
            .skip(1)
            .filter(|token| !token.is_empty())
            .map(|token| {
                let token = token.replace("~1", "/").replace("~0", "~");
                match token.parse::<usize>() {
                    Ok(idx) if token.bytes().all(|b| b.is_ascii_digit()) => {
                        PathSegment::Index(idx)
                    }
                    _ => PathSegment::Field(token),
                }
            })
            .collect();
        Self { segments }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            return f.write_str("(root)");
        }
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                PathSegment::Field(name) if i == 0 => write!(f, "{name}")?,
                PathSegment::Field(name) => write!(f, ".{name}")?,
                PathSegment::Index(idx) => write!(f, "[{idx}]")?,
            }
        }
        Ok(())
    }
}

/// Schema-derived description of a single field.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldDescriptor {
    pub path: FieldPath,
    /// Property name, or `#n` for collection entries.
    pub name: String,
    /// Text shown above the widget.
    pub label: String,
    pub description: Option<String>,
    /// The field's schema fragment after reference resolution.
    pub annotation: Value,
    /// `None` only when a definition- or format-specific constructor took
    /// over an annotation the classifier does not support.
    pub classification: Option<Classification>,
    pub default: Option<Value>,
    pub required: bool,
    /// Name of the schema definition the annotation referenced, if any.
    pub definition: Option<String>,
    pub format: Option<String>,
}

impl FieldDescriptor {
    /// Move this descriptor from `from` to `to` (see `FieldPath::rebased`).
    pub fn rebase(&mut self, from: &FieldPath, to: &FieldPath) {
        self.path = self.path.rebased(from, to);
        if let Some(PathSegment::Index(idx)) = self.path.last()
            && self.name.starts_with('#')
        {
            self.name = format!("#{idx}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_building() {
        let path = FieldPath::root().child("edition").child("engine");
        assert_eq!(path.to_string(), "edition.engine");
        assert_eq!(path.depth(), 2);
    }

    #[test]
    fn test_path_with_index() {
        let path = FieldPath::root().child("tags").index(2).child("name");
        assert_eq!(path.to_string(), "tags[2].name");
    }

    #[test]
    fn test_parse_round_trips_display() {
        let path = FieldPath::parse("servers[0].ports");
        assert_eq!(path.depth(), 3);
        assert_eq!(path.to_string(), "servers[0].ports");
    }

    #[test]
    fn test_json_pointer() {
        let path = FieldPath::from_json_pointer("/tags/1/a~1b");
        assert_eq!(
            path.segments(),
            &[
                PathSegment::Field("tags".into()),
                PathSegment::Index(1),
                PathSegment::Field("a/b".into()),
            ]
        );
        assert!(FieldPath::from_json_pointer("").is_root());
    }

    #[test]
    fn test_starts_with_and_parent() {
        let path = FieldPath::parse("a.b[0]");
        assert!(path.starts_with(&FieldPath::parse("a.b")));
        assert!(!path.starts_with(&FieldPath::parse("a.c")));
        assert_eq!(path.parent(), Some(FieldPath::parse("a.b")));
        assert_eq!(FieldPath::root().parent(), None);
    }

    #[test]
    fn test_rebased_moves_entry() {
        let path = FieldPath::parse("tags[3].name");
        let moved = path.rebased(&FieldPath::parse("tags[3]"), &FieldPath::parse("tags[2]"));
        assert_eq!(moved.to_string(), "tags[2].name");

        let untouched = FieldPath::parse("other");
        assert_eq!(
            untouched.rebased(&FieldPath::parse("tags[3]"), &FieldPath::parse("tags[2]")),
            untouched
        );
    }

    #[test]
    fn test_root_display() {
        assert_eq!(FieldPath::root().to_string(), "(root)");
    }
}
