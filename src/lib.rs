//! Read-path query layer for TAO-style objects and associations over a
//! transactional property-graph backend.
//!
//! A [`Connection`] owns the single backend handle for the process and the
//! association-type table discovered on first use. Each [`Session`] pins one
//! read-only snapshot, answers object and association queries against it, and
//! can be renewed to advance the visible version.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod backend;
pub mod cli;
pub mod config;
pub mod connection;
pub mod query;
pub mod schema;
pub mod session;
pub mod types;
pub mod warmup;

pub use config::{NeighborSortKey, ObjectAttrs, SchemaConfig, TaoConfig, WarmupConfig};
pub use connection::{Connection, Connector};
pub use query::Assoc;
pub use schema::TypeTable;
pub use session::Session;
pub use types::{AssocType, ErrorKind, NodeId, Result, TaoError};
pub use warmup::{warmup, WarmupOptions, WarmupPhase, WarmupReport};
