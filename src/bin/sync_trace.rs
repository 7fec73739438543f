use anyhow::{Context, Result as AnyhowResult};
use clap::Parser;
use modal_sync::app::{Command, Completion, HostCommand, Outbound, Reconciler};
use modal_sync::config::SyncConfig;
use modal_sync::model::event::{HostEvent, ModalEvent};
use modal_sync::services::tracing_setup;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Replay a recorded host/modal event trace through the reconciler
#[derive(Parser, Debug)]
#[command(name = "sync-trace")]
#[command(about = "Replay a JSON-lines event trace and print the commands it produces", long_about = None)]
#[command(version)]
struct Args {
    /// Trace file, one record per line ("-" or omitted for stdin)
    #[arg(value_name = "TRACE")]
    trace: Option<PathBuf>,

    /// Path to sync configuration file
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Path to log file (default: stderr)
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Acknowledge every tracked command as soon as it is emitted
    #[arg(long)]
    auto_ack: bool,

    /// Print collected diagnostics to stderr after the replay
    #[arg(long)]
    diagnostics: bool,

    /// Print the configuration JSON schema and exit
    #[arg(long)]
    dump_schema: bool,
}

/// One line of a trace
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
enum TraceRecord {
    Host { at_ms: u64, event: HostEvent },
    Modal { at_ms: u64, event: ModalEvent },
    Completion { at_ms: u64, completion: Completion },
    Tick { at_ms: u64 },
}

impl TraceRecord {
    fn at_ms(&self) -> u64 {
        match self {
            TraceRecord::Host { at_ms, .. }
            | TraceRecord::Modal { at_ms, .. }
            | TraceRecord::Completion { at_ms, .. }
            | TraceRecord::Tick { at_ms } => *at_ms,
        }
    }
}

/// One line of output
#[derive(Debug, Serialize)]
struct Emitted<'a> {
    at_ms: u64,
    #[serde(flatten)]
    outbound: &'a Outbound,
}

struct Replay {
    reconciler: Reconciler,
    start: Instant,
    auto_ack: bool,
}

impl Replay {
    fn new(config: SyncConfig, auto_ack: bool) -> Self {
        Self {
            reconciler: Reconciler::new(config),
            start: Instant::now(),
            auto_ack,
        }
    }

    /// Feed one record and return everything emitted as a consequence
    fn step(&mut self, record: TraceRecord) -> Vec<Outbound> {
        let now = self.start + Duration::from_millis(record.at_ms());
        let out = match record {
            TraceRecord::Host { event, .. } => self.reconciler.handle_host(event, now),
            TraceRecord::Modal { event, .. } => self.reconciler.handle_modal(event, now),
            TraceRecord::Completion { completion, .. } => self.reconciler.complete(completion, now),
            TraceRecord::Tick { .. } => self.reconciler.tick(now),
        };
        if !self.auto_ack {
            return out;
        }

        let mut emitted = Vec::new();
        let mut queue: VecDeque<Outbound> = out.into();
        while let Some(outbound) = queue.pop_front() {
            if let Some(generation) = outbound.generation {
                let completion = match outbound.command {
                    // No host to ask: keep the last known range
                    Command::Host(HostCommand::QueryVisibleRange { view }) => {
                        Completion::VisibleRange {
                            view,
                            generation,
                            range: None,
                        }
                    }
                    _ => Completion::Applied {
                        view: outbound.view,
                        generation,
                    },
                };
                queue.extend(self.reconciler.complete(completion, now));
            }
            emitted.push(outbound);
        }
        emitted
    }
}

fn load_config(path: Option<&PathBuf>) -> AnyhowResult<SyncConfig> {
    match path {
        Some(path) => SyncConfig::load_from_file(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(SyncConfig::default()),
    }
}

fn open_trace(path: Option<&PathBuf>) -> AnyhowResult<Box<dyn BufRead>> {
    match path {
        Some(path) if path.as_os_str() != "-" => {
            let file = std::fs::File::open(path)
                .with_context(|| format!("opening trace {}", path.display()))?;
            Ok(Box::new(BufReader::new(file)))
        }
        _ => Ok(Box::new(BufReader::new(std::io::stdin()))),
    }
}

fn main() -> AnyhowResult<()> {
    let args = Args::parse();

    if args.dump_schema {
        println!("{}", SyncConfig::schema_json()?);
        return Ok(());
    }

    tracing_setup::init_global(args.log_file.as_deref())?;
    let config = load_config(args.config.as_ref())?;
    let mut replay = Replay::new(config, args.auto_ack);

    let reader = open_trace(args.trace.as_ref())?;
    let stdout = std::io::stdout();
    let mut stdout = stdout.lock();

    for (index, line) in reader.lines().enumerate() {
        let line = line.context("reading trace")?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let record: TraceRecord = serde_json::from_str(line)
            .with_context(|| format!("trace line {}", index + 1))?;
        let at_ms = record.at_ms();
        for outbound in replay.step(record) {
            let emitted = Emitted {
                at_ms,
                outbound: &outbound,
            };
            writeln!(stdout, "{}", serde_json::to_string(&emitted)?)?;
        }
    }

    if args.diagnostics {
        for diagnostic in replay.reconciler.diagnostics().iter() {
            let offset = diagnostic.at.saturating_duration_since(replay.start);
            eprintln!("[{:>6}ms] {}", offset.as_millis(), diagnostic.error);
        }
    }
    tracing::info!(
        "replay finished, settled: {}",
        replay.reconciler.is_settled()
    );
    Ok(())
}
