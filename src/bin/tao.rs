//! Binary entry point for the `tao` query tool.
#![forbid(unsafe_code)]

use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use rustc_hash::FxHashSet;
use tao_assoc::{
    backend::memory::MemBackend,
    cli::{load_csv, resolve_config, LoadConfig},
    warmup, Assoc, AssocType, Connection, NodeId, Session, WarmupOptions, WarmupReport,
};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(
    name = "tao",
    version,
    about = "Query TAO objects and associations over a property graph",
    disable_help_subcommand = true
)]
struct Cli {
    #[command(flatten)]
    data: DataArgs,

    #[arg(
        long,
        global = true,
        value_enum,
        default_value_t = OutputFormat::Text,
        help = "Output format for query results"
    )]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct DataArgs {
    #[arg(
        long,
        global = true,
        value_name = "FILE",
        help = "TOML configuration (defaults to <config_dir>/tao/config.toml)"
    )]
    config: Option<PathBuf>,

    #[arg(
        long,
        global = true,
        value_name = "FILE",
        help = "CSV file of nodes: id, then attribute columns"
    )]
    nodes: Option<PathBuf>,

    #[arg(
        long,
        global = true,
        value_name = "FILE",
        help = "CSV file of associations: src,dst,atype,timestamp"
    )]
    edges: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    #[command(about = "Print every attribute of a node")]
    ObjGet {
        #[arg(value_name = "ID")]
        id: u64,
    },

    #[command(about = "List destinations of all outgoing edges")]
    Neighbors {
        #[arg(value_name = "ID")]
        id: u64,
    },

    #[command(about = "List neighbors whose attribute matches a value")]
    NeighborsByAttr {
        #[arg(value_name = "ID")]
        id: u64,
        #[arg(value_name = "ATTR")]
        attr: u32,
        #[arg(value_name = "VALUE")]
        value: String,
    },

    #[command(about = "List destinations of one association type, most recent first")]
    NeighborsByType {
        #[arg(value_name = "ID")]
        id: u64,
        #[arg(value_name = "ATYPE")]
        atype: u32,
    },

    #[command(about = "Find nodes by attribute value through the index")]
    FindNodes {
        #[arg(value_name = "ATTR")]
        attr: u32,
        #[arg(value_name = "VALUE")]
        value: String,
        #[arg(
            long,
            value_name = "ATTR=VALUE",
            value_parser = parse_predicate,
            help = "Second predicate; results are intersected"
        )]
        and: Option<(u32, String)>,
    },

    #[command(about = "Window of associations, most recent first")]
    AssocRange {
        #[arg(value_name = "ID")]
        id: u64,
        #[arg(value_name = "ATYPE")]
        atype: u32,
        #[arg(value_name = "OFFSET", allow_negative_numbers = true)]
        offset: i64,
        #[arg(value_name = "LENGTH")]
        length: usize,
    },

    #[command(about = "Associations to given destinations within a time interval")]
    AssocGet {
        #[arg(value_name = "ID")]
        id: u64,
        #[arg(value_name = "ATYPE")]
        atype: u32,
        #[arg(
            long = "dst",
            value_name = "ID,ID",
            value_delimiter = ',',
            required = true,
            help = "Destination ids to keep"
        )]
        dst: Vec<u64>,
        #[arg(long, allow_negative_numbers = true, default_value_t = i64::MIN)]
        low: i64,
        #[arg(long, allow_negative_numbers = true, default_value_t = i64::MAX)]
        high: i64,
    },

    #[command(about = "Count associations of one type")]
    AssocCount {
        #[arg(value_name = "ID")]
        id: u64,
        #[arg(value_name = "ATYPE")]
        atype: u32,
    },

    #[command(about = "Associations within a time interval, most recent first")]
    AssocTimeRange {
        #[arg(value_name = "ID")]
        id: u64,
        #[arg(value_name = "ATYPE")]
        atype: u32,
        #[arg(value_name = "LOW", allow_negative_numbers = true)]
        low: i64,
        #[arg(value_name = "HIGH", allow_negative_numbers = true)]
        high: i64,
        #[arg(long, default_value_t = usize::MAX, help = "Maximum associations returned")]
        limit: usize,
    },

    #[command(about = "Scan every node and edge once")]
    Warmup {
        #[arg(
            long,
            value_name = "N",
            value_parser = clap::value_parser!(u64).range(1..),
            help = "Override the progress interval (positive)"
        )]
        progress_interval: Option<u64>,
    },
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() {
    install_tracing_subscriber();
    if let Err(err) = run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn install_tracing_subscriber() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let config = resolve_config(cli.data.config.as_deref())?;

    let backend = Arc::new(MemBackend::new());
    load_csv(
        &backend,
        &config.schema,
        &LoadConfig {
            nodes: cli.data.nodes.clone(),
            edges: cli.data.edges.clone(),
        },
    )?;
    let conn = Connection::with_backend(backend, config)?;
    let mut session = conn.session()?;
    dispatch(&cli, &mut session)?;
    session.close()?;
    conn.shutdown()?;
    Ok(())
}

fn dispatch(cli: &Cli, session: &mut Session) -> Result<(), Box<dyn Error>> {
    let format = cli.format;
    match &cli.command {
        Command::ObjGet { id } => {
            let attrs = session.obj_get(NodeId(*id))?;
            emit(format, &attrs, || {
                for attr in &attrs {
                    println!("{attr}");
                }
            })?;
        }
        Command::Neighbors { id } => {
            let ids = session.neighbors(NodeId(*id))?;
            emit_ids(format, &ids)?;
        }
        Command::NeighborsByAttr { id, attr, value } => {
            let ids = session.neighbors_by_attribute(NodeId(*id), *attr, value)?;
            emit_ids(format, &ids)?;
        }
        Command::NeighborsByType { id, atype } => {
            let ids = session.neighbors_by_type(NodeId(*id), AssocType(*atype))?;
            emit_ids(format, &ids)?;
        }
        Command::FindNodes { attr, value, and } => {
            let found = match and {
                Some((attr2, value2)) => session.find_nodes_by_attributes(
                    (*attr, value.as_str()),
                    (*attr2, value2.as_str()),
                )?,
                None => session.find_nodes_by_attribute(*attr, value)?,
            };
            let mut ids: Vec<NodeId> = found.into_iter().collect();
            ids.sort_unstable();
            emit_ids(format, &ids)?;
        }
        Command::AssocRange {
            id,
            atype,
            offset,
            length,
        } => {
            let assocs = session.assoc_range(NodeId(*id), AssocType(*atype), *offset, *length)?;
            emit_assocs(format, &assocs)?;
        }
        Command::AssocGet {
            id,
            atype,
            dst,
            low,
            high,
        } => {
            let dst_ids: FxHashSet<NodeId> = dst.iter().copied().map(NodeId).collect();
            let assocs =
                session.assoc_get(NodeId(*id), AssocType(*atype), &dst_ids, *low, *high)?;
            emit_assocs(format, &assocs)?;
        }
        Command::AssocCount { id, atype } => {
            let count = session.assoc_count(NodeId(*id), AssocType(*atype))?;
            emit(format, &count, || println!("{count}"))?;
        }
        Command::AssocTimeRange {
            id,
            atype,
            low,
            high,
            limit,
        } => {
            let assocs =
                session.assoc_time_range(NodeId(*id), AssocType(*atype), *low, *high, *limit)?;
            emit_assocs(format, &assocs)?;
        }
        Command::Warmup { progress_interval } => {
            let report = run_warmup(session, *progress_interval)?;
            emit(format, &report, || print_warmup_text(&report))?;
        }
    }
    Ok(())
}

fn run_warmup(
    session: &mut Session,
    progress_interval: Option<u64>,
) -> Result<WarmupReport, Box<dyn Error>> {
    let mut options = WarmupOptions::from_config(&session.config().warmup);
    if let Some(interval) = progress_interval {
        options.progress_interval = interval;
    }

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
    );
    spinner.set_message("warming up");
    spinner.enable_steady_tick(Duration::from_millis(120));

    let progress = spinner.clone();
    let options = options.on_progress(move |phase, count| {
        progress.set_message(format!("processed {count} {phase}"));
    });
    let result = warmup(session, options);
    spinner.finish_and_clear();
    Ok(result?)
}

fn parse_predicate(raw: &str) -> Result<(u32, String), String> {
    let (attr, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("invalid predicate '{raw}', expected ATTR=VALUE"))?;
    let attr = attr
        .trim()
        .parse()
        .map_err(|_| format!("invalid attribute index '{}'", attr.trim()))?;
    Ok((attr, value.to_string()))
}

fn emit<T, F>(format: OutputFormat, value: &T, printer: F) -> Result<(), Box<dyn Error>>
where
    T: serde::Serialize,
    F: Fn(),
{
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(value)?;
            println!("{json}");
        }
        OutputFormat::Text => printer(),
    }
    Ok(())
}

fn emit_ids(format: OutputFormat, ids: &[NodeId]) -> Result<(), Box<dyn Error>> {
    emit(format, &ids, || {
        for id in ids {
            println!("{id}");
        }
    })
}

fn emit_assocs(format: OutputFormat, assocs: &[Assoc]) -> Result<(), Box<dyn Error>> {
    emit(format, &assocs, || {
        for assoc in assocs {
            println!(
                "{} {} {} {}",
                assoc.src, assoc.atype, assoc.dst, assoc.timestamp
            );
        }
    })
}

fn print_warmup_text(report: &WarmupReport) {
    println!(
        "Warmup visited {} nodes ({} properties) and {} edges ({} properties) in {:.2} ms",
        report.nodes,
        report.node_properties,
        report.edges,
        report.edge_properties,
        report.elapsed.as_secs_f64() * 1_000.0
    );
}
