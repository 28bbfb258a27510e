#![forbid(unsafe_code)]

//! Process-scope connection to the graph backend.
//!
//! A [`Connection`] is built once and handed by reference to everything that
//! opens sessions. The first session establishes the backend through the
//! injected [`Connector`] and discovers the [`TypeTable`]; every later session
//! reuses both. Nothing is opened twice until [`Connection::shutdown`].

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info};

use crate::backend::Backend;
use crate::config::TaoConfig;
use crate::schema::TypeTable;
use crate::session::Session;
use crate::types::{Result, TaoError};

/// Opens the physical backend connection.
pub trait Connector: Send + Sync {
    /// Connects using `config`. Called at most once per [`Connection`].
    fn connect(&self, config: &TaoConfig) -> Result<Arc<dyn Backend>>;
}

impl<F> Connector for F
where
    F: Fn(&TaoConfig) -> Result<Arc<dyn Backend>> + Send + Sync,
{
    fn connect(&self, config: &TaoConfig) -> Result<Arc<dyn Backend>> {
        self(config)
    }
}

enum ConnState {
    Idle,
    Open {
        backend: Arc<dyn Backend>,
        types: Option<Arc<TypeTable>>,
    },
    Closed,
}

/// Shared connection state: one backend and one type table per process.
pub struct Connection {
    connector: Box<dyn Connector>,
    config: Arc<TaoConfig>,
    state: Mutex<ConnState>,
}

impl Connection {
    /// Creates an unopened connection. The backend is contacted on first use.
    pub fn new(connector: impl Connector + 'static, config: TaoConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            connector: Box::new(connector),
            config: Arc::new(config),
            state: Mutex::new(ConnState::Idle),
        })
    }

    /// Creates a connection around an already-constructed backend.
    pub fn with_backend(backend: Arc<dyn Backend>, config: TaoConfig) -> Result<Self> {
        Self::new(
            move |_: &TaoConfig| -> Result<Arc<dyn Backend>> { Ok(Arc::clone(&backend)) },
            config,
        )
    }

    /// Configuration shared by every session.
    pub fn config(&self) -> &TaoConfig {
        &self.config
    }

    /// Opens a new snapshot session.
    pub fn session(&self) -> Result<Session> {
        Session::open(self)
    }

    /// Whether the backend has been established and not shut down.
    pub fn is_open(&self) -> bool {
        matches!(*self.state.lock(), ConnState::Open { .. })
    }

    /// Returns the type table, establishing the connection if needed.
    pub fn type_table(&self) -> Result<Arc<TypeTable>> {
        self.establish().map(|(_, types, _)| types)
    }

    pub(crate) fn establish(&self) -> Result<(Arc<dyn Backend>, Arc<TypeTable>, Arc<TaoConfig>)> {
        let mut state = self.state.lock();
        if matches!(*state, ConnState::Idle) {
            info!(name = %self.config.name, "connection.open");
            let backend = self.connector.connect(&self.config)?;
            *state = ConnState::Open {
                backend,
                types: None,
            };
        }
        let ConnState::Open { backend, types } = &mut *state else {
            return Err(TaoError::backend("connection is shut down"));
        };
        let table = match types {
            Some(table) => Arc::clone(table),
            None => {
                let table = Arc::new(TypeTable::discover(
                    backend.as_ref(),
                    self.config.schema.atype_total,
                )?);
                debug!(atypes = table.len(), "connection.type_table");
                *types = Some(Arc::clone(&table));
                table
            }
        };
        Ok((Arc::clone(backend), table, Arc::clone(&self.config)))
    }

    /// Releases the backend. Sessions opened afterwards fail; calling twice is a no-op.
    pub fn shutdown(&self) -> Result<()> {
        let previous = std::mem::replace(&mut *self.state.lock(), ConnState::Closed);
        match previous {
            ConnState::Open { backend, .. } => {
                info!(name = %self.config.name, "connection.shutdown");
                backend.shutdown()
            }
            ConnState::Idle | ConnState::Closed => Ok(()),
        }
    }
}
