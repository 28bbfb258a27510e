#![forbid(unsafe_code)]

//! Snapshot sessions.
//!
//! A [`Session`] owns exactly one read-only backend transaction at a time.
//! Every query issued through the session observes that transaction's
//! snapshot. [`Session::renew`] commits the current transaction and starts a
//! fresh one, which both advances the visible version and releases whatever
//! working set the old transaction accumulated.
//!
//! Query results are plain values, so they stay valid across renewal.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::backend::{Backend, ReadTxn};
use crate::config::TaoConfig;
use crate::connection::Connection;
use crate::schema::TypeTable;
use crate::types::{IdMap, Result, TaoError};

/// A read-only view of the graph pinned to one snapshot.
///
/// Sessions are single-threaded: renewal and queries must not overlap. Use one
/// session per caller; isolation between sessions is whatever the backend's
/// transactions provide.
pub struct Session {
    backend: Arc<dyn Backend>,
    types: Arc<TypeTable>,
    config: Arc<TaoConfig>,
    ids: IdMap,
    txn: Option<Box<dyn ReadTxn>>,
    renewals: u64,
}

impl Session {
    /// Opens a session, establishing the connection on first use.
    pub fn open(conn: &Connection) -> Result<Self> {
        let (backend, types, config) = conn.establish()?;
        let txn = backend.begin_read()?;
        debug!(version = txn.version(), "session.open");
        let ids = config.schema.id_map();
        Ok(Self {
            backend,
            types,
            config,
            ids,
            txn: Some(txn),
            renewals: 0,
        })
    }

    /// Commits the current snapshot and starts a new one.
    ///
    /// If the commit fails the error is returned and the session is left
    /// without a snapshot; calling `renew` again starts a fresh one.
    pub fn renew(&mut self) -> Result<()> {
        if let Some(txn) = self.txn.take() {
            let version = txn.version();
            if let Err(err) = txn.commit() {
                warn!(version, error = %err, "session.renew commit failed");
                return Err(err);
            }
        }
        let txn = self.backend.begin_read()?;
        self.renewals += 1;
        debug!(version = txn.version(), renewals = self.renewals, "session.renew");
        self.txn = Some(txn);
        Ok(())
    }

    /// Commits the current snapshot and ends the session.
    pub fn close(mut self) -> Result<()> {
        match self.txn.take() {
            Some(txn) => {
                debug!(version = txn.version(), "session.close");
                txn.commit()
            }
            None => Ok(()),
        }
    }

    /// Number of successful renewals since the session opened.
    pub fn renewals(&self) -> u64 {
        self.renewals
    }

    /// Backend version observed by the active snapshot.
    pub fn snapshot_version(&self) -> Result<u64> {
        Ok(self.txn()?.version())
    }

    /// Association-type table shared with the connection.
    pub fn type_table(&self) -> &TypeTable {
        &self.types
    }

    /// Configuration the session was opened with.
    pub fn config(&self) -> &TaoConfig {
        &self.config
    }

    pub(crate) fn ids(&self) -> IdMap {
        self.ids
    }

    pub(crate) fn txn(&self) -> Result<&dyn ReadTxn> {
        self.txn
            .as_deref()
            .ok_or_else(|| TaoError::backend("session has no active snapshot"))
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Some(txn) = self.txn.take() {
            txn.discard();
        }
    }
}
