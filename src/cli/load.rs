//! CSV loading into the in-memory backend.
//!
//! Node files carry an `id` column plus one column per attribute; every
//! non-id column becomes a string property named after its header. Edge files
//! carry `src`, `dst`, `atype` and `timestamp`; remaining columns become
//! string edge properties. Ids in both files are application ids and are
//! shifted by the configured offset on the way in; timestamps are stored as
//! integers under the configured timestamp key.

use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord};
use tracing::info;

use crate::backend::memory::{MemBackend, MemWriter};
use crate::config::SchemaConfig;
use crate::types::{IdMap, LabelHandle, NodeId, PropValue, Result, TaoError};

/// Largest atype an edge file may use; every label up to it is registered.
pub const MAX_ATYPE: u32 = u16::MAX as u32;

/// Files to load.
#[derive(Debug, Clone, Default)]
pub struct LoadConfig {
    /// Node CSV path.
    pub nodes: Option<PathBuf>,
    /// Edge CSV path.
    pub edges: Option<PathBuf>,
}

/// Totals from a load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    /// Nodes inserted.
    pub nodes: u64,
    /// Edges inserted.
    pub edges: u64,
    /// Backend version after the load committed.
    pub version: u64,
}

struct EdgeRecord {
    src: NodeId,
    dst: NodeId,
    atype: u32,
    props: Vec<(String, PropValue)>,
}

/// Loads both files in one write batch.
///
/// Edge labels `"0"` through the largest atype seen are registered so the
/// type table can discover them without gaps.
pub fn load_csv(
    backend: &MemBackend,
    schema: &SchemaConfig,
    cfg: &LoadConfig,
) -> Result<LoadSummary> {
    let ids = schema.id_map();
    let mut summary = LoadSummary::default();
    let mut writer = backend.writer()?;

    if let Some(path) = &cfg.nodes {
        summary.nodes = load_nodes(&mut writer, ids, path)?;
    }
    if let Some(path) = &cfg.edges {
        let edges = read_edges(path, &schema.timestamp_key)?;
        let max_atype = edges.iter().map(|e| e.atype).max();
        let labels: Vec<LabelHandle> = match max_atype {
            Some(max) => (0..=max)
                .map(|atype| writer.define_label(&atype.to_string()))
                .collect(),
            None => Vec::new(),
        };
        for edge in edges {
            writer.add_edge(
                ids.to_vertex(edge.src)?,
                ids.to_vertex(edge.dst)?,
                labels[edge.atype as usize],
                edge.props,
            )?;
            summary.edges += 1;
        }
    }

    summary.version = writer.commit()?;
    info!(
        nodes = summary.nodes,
        edges = summary.edges,
        version = summary.version,
        "load.csv"
    );
    Ok(summary)
}

fn load_nodes(writer: &mut MemWriter<'_>, ids: IdMap, path: &Path) -> Result<u64> {
    let mut reader = open_reader(path)?;
    let headers = reader.headers().map_err(|err| csv_error(path, err))?.clone();
    let id_index = find_column(&headers, "id", path)?;
    let mut count = 0u64;
    for record in reader.records() {
        let record = record.map_err(|err| csv_error(path, err))?;
        let id = parse_field::<u64>(&record, id_index, "id", path)?;
        let props = extra_props(&headers, &record, &[id_index]);
        writer.add_vertex(ids.to_vertex(NodeId(id))?, props)?;
        count += 1;
    }
    Ok(count)
}

fn read_edges(path: &Path, timestamp_key: &str) -> Result<Vec<EdgeRecord>> {
    let mut reader = open_reader(path)?;
    let headers = reader.headers().map_err(|err| csv_error(path, err))?.clone();
    let src_index = find_column(&headers, "src", path)?;
    let dst_index = find_column(&headers, "dst", path)?;
    let atype_index = find_column(&headers, "atype", path)?;
    let ts_index = find_column(&headers, "timestamp", path)?;
    let fixed = [src_index, dst_index, atype_index, ts_index];

    let mut edges = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|err| csv_error(path, err))?;
        let atype = parse_field::<u32>(&record, atype_index, "atype", path)?;
        if atype > MAX_ATYPE {
            return Err(TaoError::config(format!(
                "atype {atype} exceeds {MAX_ATYPE} in {} line {}",
                path.display(),
                record.position().map_or(0, |p| p.line())
            )));
        }
        let timestamp = parse_field::<i64>(&record, ts_index, "timestamp", path)?;
        let mut props = vec![(timestamp_key.to_string(), PropValue::Int(timestamp))];
        props.extend(extra_props(&headers, &record, &fixed));
        edges.push(EdgeRecord {
            src: NodeId(parse_field(&record, src_index, "src", path)?),
            dst: NodeId(parse_field(&record, dst_index, "dst", path)?),
            atype,
            props,
        });
    }
    Ok(edges)
}

fn open_reader(path: &Path) -> Result<csv::Reader<std::fs::File>> {
    ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|err| csv_error(path, err))
}

fn find_column(headers: &StringRecord, name: &str, path: &Path) -> Result<usize> {
    headers
        .iter()
        .position(|h| h.eq_ignore_ascii_case(name))
        .ok_or_else(|| {
            TaoError::config(format!("column '{name}' not found in {}", path.display()))
        })
}

fn parse_field<T: std::str::FromStr>(
    record: &StringRecord,
    idx: usize,
    name: &str,
    path: &Path,
) -> Result<T> {
    let raw = record
        .get(idx)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| {
            TaoError::config(format!("missing value for column '{name}' in {}", path.display()))
        })?;
    raw.parse().map_err(|_| {
        TaoError::config(format!(
            "invalid {name} '{raw}' in {} line {}",
            path.display(),
            record.position().map_or(0, |p| p.line())
        ))
    })
}

fn extra_props(
    headers: &StringRecord,
    record: &StringRecord,
    skip: &[usize],
) -> Vec<(String, PropValue)> {
    headers
        .iter()
        .enumerate()
        .filter(|(idx, _)| !skip.contains(idx))
        .filter_map(|(idx, name)| {
            record
                .get(idx)
                .map(|value| (name.to_string(), PropValue::from(value)))
        })
        .collect()
}

fn csv_error(path: &Path, err: csv::Error) -> TaoError {
    TaoError::backend(format!("failed to read {}: {err}", path.display()))
}
