//! 轮询一次仿真的客户端日志，输出各实体序列与聚合结果（JSON）

use clap::Parser;
use dashlog_rs::aggregate::{AggregateMode, AggregateReport, AggregatedUnit, ClientSummary};
use dashlog_rs::ingest::IngestionSession;
use dashlog_rs::log::{Watermark, event_log_path, read_event_log};
use dashlog_rs::series::UnitSeries;
use dashlog_rs::unit::{UnitKind, UnitTable};
use dashlog_rs::{IngestError, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(
    name = "dash-ingest",
    about = "Tail DASH client logs of a running simulation and aggregate them"
)]
struct Args {
    /// Directory holding sim<N>_cl<M>_<algo>_output.txt files
    #[arg(long)]
    dir: PathBuf,

    /// Simulation id (the N in sim<N>_...)
    #[arg(long)]
    sim_id: u32,

    /// Units to ingest and aggregate (bl, tp, eff, bul, segSize, qualLevel); defaults to all
    #[arg(long = "unit")]
    units: Vec<String>,

    /// Aggregated presets (avgTp, avgBl, avgSegSize, avgQualLevel, totalEff)
    #[arg(long = "aggregate")]
    presets: Vec<String>,

    /// Aggregation mode for --unit: average, sum or stacked_sum
    #[arg(long, default_value = "average")]
    mode: String,

    /// Number of polls before writing the report
    #[arg(long, default_value_t = 1)]
    polls: u32,

    /// Pause between polls (ms)
    #[arg(long, default_value_t = 1000)]
    interval_ms: u64,

    /// Custom unit table (JSON)
    #[arg(long)]
    unit_table: Option<PathBuf>,

    /// Use the live-view unit table
    #[arg(long)]
    live: bool,

    /// Event log with BottleneckRate events; defaults to <dir>/sim<N>_event_log.txt
    #[arg(long)]
    event_log: Option<PathBuf>,

    /// Output JSON file; prints to stdout when omitted
    #[arg(long)]
    out_json: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct EntityReport<'a> {
    name: &'a str,
    client: u32,
    algorithm: &'a str,
    rows: usize,
    watermark: Option<Watermark>,
    series: BTreeMap<UnitKind, UnitSeries>,
}

#[derive(Debug, Serialize)]
struct NamedAggregate {
    name: String,
    #[serde(flatten)]
    report: AggregateReport,
}

#[derive(Debug, Serialize)]
struct Report<'a> {
    sim_id: u32,
    polls: u32,
    entities: Vec<EntityReport<'a>>,
    aggregates: Vec<NamedAggregate>,
    summaries: Vec<ClientSummary>,
    failures: Vec<String>,
}

fn run(args: Args) -> Result<()> {
    let table = match (&args.unit_table, args.live) {
        (Some(path), _) => UnitTable::from_json_file(path)?,
        (None, true) => UnitTable::live(),
        (None, false) => UnitTable::standard(),
    };

    let presets = args
        .presets
        .iter()
        .map(|p| AggregatedUnit::lookup(p))
        .collect::<Result<Vec<_>>>()?;
    let mut units = if args.units.is_empty() && presets.is_empty() {
        table.kinds().collect::<Vec<_>>()
    } else {
        args.units
            .iter()
            .map(|u| UnitKind::parse(u))
            .collect::<Result<Vec<_>>>()?
    };
    let aggregate_units = units.clone();
    for p in &presets {
        if !units.contains(&p.unit) {
            units.push(p.unit);
        }
    }
    for &u in &units {
        table.get(u)?;
    }
    let mode = AggregateMode::parse(&args.mode)?;

    let mut session = IngestionSession::new(table);
    let event_log = args
        .event_log
        .clone()
        .unwrap_or_else(|| event_log_path(&args.dir, args.sim_id));

    let wants_efficiency = units.contains(&UnitKind::Efficiency);

    // 单次轮询失败只影响这一轮，下一轮照常重试
    let mut failures = Vec::new();
    for poll in 0..args.polls {
        if poll > 0 {
            std::thread::sleep(Duration::from_millis(args.interval_ms));
        }
        failures.clear();
        match session.poll_dir(&args.dir, args.sim_id, &units) {
            Ok(report) => {
                info!(
                    poll,
                    entities = report.entities,
                    new_rows = report.new_rows,
                    "📥 轮询完成"
                );
                failures.extend(
                    report
                        .failures
                        .iter()
                        .map(|(path, e)| format!("{}: {e}", path.display())),
                );
            }
            Err(e) => {
                warn!(poll, error = %e, "轮询失败，跳过本轮");
                failures.push(format!("{}: {e}", args.dir.display()));
            }
        }

        if wants_efficiency {
            match read_event_log(&event_log) {
                Ok(schedule) => session.set_bottleneck_schedule(schedule),
                Err(e) => {
                    warn!(poll, error = %e, "读取事件日志失败，沿用上一轮的带宽表");
                    failures.push(e.to_string());
                }
            }
        }
    }

    let mut aggregates = Vec::new();
    for &unit in &aggregate_units {
        aggregates.push(NamedAggregate {
            name: unit.name().to_string(),
            report: session.aggregate(unit, mode)?,
        });
    }
    for p in &presets {
        aggregates.push(NamedAggregate {
            name: p.name.to_string(),
            report: session.aggregate(p.unit, p.mode)?,
        });
    }

    let entities = session
        .entities()
        .into_iter()
        .map(|r| EntityReport {
            name: &r.id.name,
            client: r.id.client,
            algorithm: &r.id.algorithm,
            rows: r.row_count(),
            watermark: r.watermark(),
            series: r
                .units()
                .filter_map(|u| {
                    let s = if u == UnitKind::Efficiency {
                        session.efficiency(&r.id.name)?
                    } else {
                        r.series(u)?.clone()
                    };
                    Some((u, s))
                })
                .collect(),
        })
        .collect();

    let report = Report {
        sim_id: args.sim_id,
        polls: args.polls,
        entities,
        aggregates,
        summaries: session.summaries(),
        failures,
    };
    let json = serde_json::to_string_pretty(&report).expect("serialize report");
    match &args.out_json {
        Some(path) => {
            fs::write(path, json).map_err(|source| IngestError::Io {
                path: path.clone(),
                source,
            })?;
            eprintln!("wrote report to {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_file(true)
        .with_line_number(true)
        .with_target(true)
        .init();

    let args = Args::parse();
    if let Err(e) = run(args) {
        eprintln!("dash-ingest: {e}");
        std::process::exit(1);
    }
}
