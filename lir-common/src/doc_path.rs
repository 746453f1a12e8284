//! Location tracking inside an LIR document
//!
//! A `DocPath` records how the deserializer reached the node it is
//! currently reading: the top-level section, the named or indexed
//! entities along the way, and finally the field. Every load error
//! carries one so the caller can tell exactly which part of the
//! document was malformed.

use std::fmt;

/// One step from the document root towards a node
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// Top-level section (`globals`, `structs`, `externs`, `functions`)
    Section(String),
    /// Entity addressed by name, e.g. function `main` or block `bb0`
    Named { kind: String, name: String },
    /// Entity addressed by position, e.g. instruction 3
    Indexed { kind: String, index: usize },
    /// Field of an object
    Field(String),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Section(name) => write!(f, "{}", name),
            PathSegment::Named { kind, name } => write!(f, "{} `{}`", kind, name),
            PathSegment::Indexed { kind, index } => write!(f, "{} {}", kind, index),
            PathSegment::Field(name) => write!(f, "field `{}`", name),
        }
    }
}

/// Path from the document root to a node (empty means the root itself)
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct DocPath {
    segments: Vec<PathSegment>,
}

impl DocPath {
    /// The document root
    pub fn root() -> Self {
        Self::default()
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Extend with a top-level section
    pub fn section(&self, name: &str) -> Self {
        self.push(PathSegment::Section(name.to_string()))
    }

    /// Extend with an entity addressed by name
    pub fn named(&self, kind: &str, name: &str) -> Self {
        self.push(PathSegment::Named {
            kind: kind.to_string(),
            name: name.to_string(),
        })
    }

    /// Extend with an entity addressed by position
    pub fn indexed(&self, kind: &str, index: usize) -> Self {
        self.push(PathSegment::Indexed {
            kind: kind.to_string(),
            index,
        })
    }

    /// Extend with an object field
    pub fn field(&self, name: &str) -> Self {
        self.push(PathSegment::Field(name.to_string()))
    }

    /// Drop the last segment (the root is its own parent)
    pub fn parent(&self) -> Self {
        let mut segments = self.segments.clone();
        segments.pop();
        Self { segments }
    }

    fn push(&self, segment: PathSegment) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment);
        Self { segments }
    }
}

impl fmt::Display for DocPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return write!(f, "<document root>");
        }
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", segment)?;
        }
        Ok(())
    }
}
