//! Node identities: backend ids, surrogate ids and display ids

use std::fmt;
use uuid::Uuid;

use super::document::FormDocument;

/// Where a node's id comes from.
///
/// A node that has been persisted carries the backend's id; a node created in
/// this session carries a surrogate the backend uses to wire up dependencies
/// on first save.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeIdentity {
    Backend(i64),
    Local(i64),
}

impl NodeIdentity {
    /// The numeric id regardless of origin
    pub fn raw(self) -> i64 {
        match self {
            Self::Backend(id) | Self::Local(id) => id,
        }
    }

    pub fn backend_id(self) -> Option<i64> {
        match self {
            Self::Backend(id) => Some(id),
            Self::Local(_) => None,
        }
    }

    pub fn surrogate_id(self) -> Option<i64> {
        match self {
            Self::Local(id) => Some(id),
            Self::Backend(_) => None,
        }
    }

    pub fn is_backend(self) -> bool {
        matches!(self, Self::Backend(_))
    }

    /// Adopt the id the backend issued. Only a surrogate can be promoted;
    /// a backend identity is left as is and false is returned.
    pub fn promote(&mut self, backend_id: i64) -> bool {
        match self {
            Self::Local(_) => {
                *self = Self::Backend(backend_id);
                true
            }
            Self::Backend(_) => false,
        }
    }
}

impl fmt::Display for NodeIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Backend(id) => write!(f, "#{id}"),
            Self::Local(id) => write!(f, "~{id}"),
        }
    }
}

/// Process-local key for a section, question or option.
///
/// Never persisted. Mutations address nodes by display id because section
/// and question backend ids come from separate sequences and can coincide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DisplayId(Uuid);

impl DisplayId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for DisplayId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DisplayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Hands out surrogate ids for new nodes.
///
/// Stateless: the next id is derived from the document as it is now, so a
/// reload or a batch of edits can never leave a stale counter behind.
pub struct IdentityAssigner;

impl IdentityAssigner {
    /// Smallest id above every backend and surrogate id in the document
    /// (and above the seed surrogate `1`)
    pub fn next(document: &FormDocument) -> i64 {
        document
            .node_identities()
            .map(NodeIdentity::raw)
            .fold(1, i64::max)
            + 1
    }
}
