#![forbid(unsafe_code)]

//! Configuration consumed by connections, sessions and the warmup scanner.
//!
//! Loaded from TOML:
//!
//! ```toml
//! name = "tao"
//!
//! [schema]
//! atype_total = 3
//! property_total = 4
//! zero_indexed = true
//! object_attrs = "indexed"
//! neighbor_sort = "association"
//!
//! [warmup]
//! progress_interval = 10000
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::types::{IdMap, Result, TaoError};

/// How `obj_get` enumerates a node's attributes.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, Eq, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub enum ObjectAttrs {
    /// `attr0..attr{property_total-1}` in index order.
    #[default]
    Indexed,
    /// Every property the vertex carries, in backend key order.
    PropertyKeys,
}

/// Which timestamp orders `neighbors_by_type`.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, Eq, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub enum NeighborSortKey {
    /// The association's own timestamp.
    #[default]
    Association,
    /// The destination node's timestamp attribute.
    Destination,
}

/// Schema facts about the backing graph.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SchemaConfig {
    /// Declared association-type count. When absent the type table is discovered by name.
    pub atype_total: Option<u32>,
    /// Number of indexed attributes per node.
    pub property_total: u32,
    /// Whether application ids start at zero (backend ids are shifted by one).
    pub zero_indexed: bool,
    /// Prefix of attribute property keys.
    pub attr_prefix: String,
    /// Property key holding timestamps.
    pub timestamp_key: String,
    /// Attribute enumeration mode for object reads.
    pub object_attrs: ObjectAttrs,
    /// Sort key for typed neighbor listings.
    pub neighbor_sort: NeighborSortKey,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            atype_total: None,
            property_total: 0,
            zero_indexed: true,
            attr_prefix: "attr".to_string(),
            timestamp_key: "timestamp".to_string(),
            object_attrs: ObjectAttrs::Indexed,
            neighbor_sort: NeighborSortKey::Association,
        }
    }
}

impl SchemaConfig {
    /// Property key for attribute `idx`.
    pub fn attr_key(&self, idx: u32) -> String {
        format!("{}{idx}", self.attr_prefix)
    }

    /// Id mapping implied by `zero_indexed`.
    pub fn id_map(&self) -> IdMap {
        IdMap::new(u64::from(self.zero_indexed))
    }
}

/// Warmup scanner settings.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct WarmupConfig {
    /// Units between progress reports.
    pub progress_interval: u64,
}

impl Default for WarmupConfig {
    fn default() -> Self {
        Self {
            progress_interval: 10_000,
        }
    }
}

/// Top-level configuration.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct TaoConfig {
    /// Keyspace or graph name handed to the connector.
    pub name: String,
    /// Schema facts.
    pub schema: SchemaConfig,
    /// Warmup settings.
    pub warmup: WarmupConfig,
}

impl Default for TaoConfig {
    fn default() -> Self {
        Self {
            name: "tao".to_string(),
            schema: SchemaConfig::default(),
            warmup: WarmupConfig::default(),
        }
    }
}

impl TaoConfig {
    /// Reads and validates a TOML configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| {
            TaoError::config(format!("failed to read {}: {source}", path.display()))
        })?;
        let config: Self = toml::from_str(&contents).map_err(|source| {
            TaoError::config(format!("failed to parse {}: {source}", path.display()))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Parses and validates a TOML document.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents)
            .map_err(|source| TaoError::config(format!("failed to parse config: {source}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Serializes the configuration back to TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|source| TaoError::config(format!("failed to serialize config: {source}")))
    }

    /// Checks invariants serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(TaoError::config("name must not be empty"));
        }
        if self.schema.attr_prefix.is_empty() {
            return Err(TaoError::config("schema.attr_prefix must not be empty"));
        }
        if self.schema.timestamp_key.is_empty() {
            return Err(TaoError::config("schema.timestamp_key must not be empty"));
        }
        if self.warmup.progress_interval == 0 {
            return Err(TaoError::config("warmup.progress_interval must be positive"));
        }
        Ok(())
    }

    /// Sets the graph name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Declares the association-type count instead of probing.
    pub fn atype_total(mut self, total: u32) -> Self {
        self.schema.atype_total = Some(total);
        self
    }

    /// Sets the number of indexed attributes per node.
    pub fn property_total(mut self, total: u32) -> Self {
        self.schema.property_total = total;
        self
    }

    /// Sets whether application ids start at zero.
    pub fn zero_indexed(mut self, zero_indexed: bool) -> Self {
        self.schema.zero_indexed = zero_indexed;
        self
    }

    /// Sets the object attribute enumeration mode.
    pub fn object_attrs(mut self, mode: ObjectAttrs) -> Self {
        self.schema.object_attrs = mode;
        self
    }

    /// Sets the typed-neighbor sort key.
    pub fn neighbor_sort(mut self, key: NeighborSortKey) -> Self {
        self.schema.neighbor_sort = key;
        self
    }

    /// Sets the warmup progress cadence.
    pub fn progress_interval(mut self, interval: u64) -> Self {
        self.warmup.progress_interval = interval;
        self
    }
}
