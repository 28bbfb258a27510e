#![forbid(unsafe_code)]

//! Association-type table.
//!
//! Edge labels are registered under the decimal strings `"0"`, `"1"`, ...
//! The table resolves them once per connection and afterwards maps an
//! [`AssocType`] to its label handle by direct indexing.

use tracing::debug;

use crate::backend::Backend;
use crate::types::{AssocType, LabelHandle, Result, TaoError};

/// Immutable mapping from association-type codes to backend label handles.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TypeTable {
    labels: Vec<LabelHandle>,
}

impl TypeTable {
    /// Builds a table from already-resolved handles, indexed by type code.
    pub fn from_handles(labels: Vec<LabelHandle>) -> Self {
        Self { labels }
    }

    /// Looks up `"0"`, `"1"`, ... until the backend reports a missing label.
    pub fn scan(backend: &dyn Backend) -> Result<Self> {
        let mut labels = Vec::new();
        while let Some(handle) = backend.resolve_edge_label(&labels.len().to_string())? {
            labels.push(handle);
        }
        debug!(atypes = labels.len(), "schema.scan");
        Ok(Self { labels })
    }

    /// Resolves exactly `"0".."total-1"`; any missing label is a configuration error.
    pub fn declared(backend: &dyn Backend, total: u32) -> Result<Self> {
        let mut labels = Vec::with_capacity(total as usize);
        for atype in 0..total {
            let handle = backend
                .resolve_edge_label(&atype.to_string())?
                .ok_or_else(|| {
                    TaoError::config(format!(
                        "association type {atype} declared but not registered in backend"
                    ))
                })?;
            labels.push(handle);
        }
        debug!(atypes = labels.len(), "schema.declared");
        Ok(Self { labels })
    }

    /// Builds the table from configuration, probing when no total is declared.
    pub fn discover(backend: &dyn Backend, declared_total: Option<u32>) -> Result<Self> {
        match declared_total {
            Some(total) => Self::declared(backend, total),
            None => Self::scan(backend),
        }
    }

    /// Returns the label handle for `atype`.
    pub fn resolve(&self, atype: AssocType) -> Result<LabelHandle> {
        self.labels
            .get(atype.0 as usize)
            .copied()
            .ok_or(TaoError::UnknownAtype {
                atype,
                known: self.labels.len(),
            })
    }

    /// Number of association types.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Whether no association types were discovered.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}
