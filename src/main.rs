use anyhow::{Context as _, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use std::path::PathBuf;
use std::process::ExitCode;

use stepsort::{
    Config, HistoryEntry, NavState, Navigator, Recorder, StepKind, StepSortResult, TraceFile,
    highlight_index, parse_values, random_values, write_timeline,
};

mod cli_logger;

use cli_logger::CliLogger;

#[derive(Debug, Parser)]
#[command(name = "stepsort", version, about = "Record, step through and replay an instrumented counting sort")]
struct Cli {
    /// Emit single-line JSON instead of pretty output.
    #[arg(long, global = true)]
    json: bool,
    #[arg(long, global = true)]
    no_color: bool,
    #[arg(long, global = true, default_value = "stepsort.toml")]
    config: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Args)]
struct InputArgs {
    /// Values to sort, comma or space separated.
    #[arg(value_name = "VALUES", allow_negative_numbers = true)]
    values: Vec<String>,
    /// Generate this many random values in 0..20 instead.
    #[arg(long, conflicts_with = "values")]
    random: Option<usize>,
    /// Seed for `--random`; the same seed always yields the same values.
    #[arg(long, default_value_t = 0)]
    seed: u64,
}

impl InputArgs {
    fn resolve(&self) -> StepSortResult<Vec<i64>> {
        if let Some(count) = self.random {
            return Ok(random_values(count, self.seed));
        }
        parse_values(&self.values.join(" "))
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Record a sort and print a summary of the trace.
    Record {
        #[command(flatten)]
        input: InputArgs,
        /// Write the full trace file here.
        #[arg(long)]
        out: Option<PathBuf>,
        /// Write a flat JSON timeline here.
        #[arg(long)]
        timeline: Option<PathBuf>,
    },
    /// Advance logical steps and print what was visited.
    Step {
        #[command(flatten)]
        input: InputArgs,
        #[arg(long, default_value_t = 1)]
        count: usize,
        /// Advance until the sort completes.
        #[arg(long, conflicts_with = "count")]
        all: bool,
    },
    /// Rebuild navigator state at a step index by replaying from the start.
    Replay {
        #[command(flatten)]
        input: InputArgs,
        #[arg(long)]
        to: usize,
    },
    /// Check that a trace file re-records identically.
    Verify {
        #[arg(value_name = "TRACE")]
        trace: PathBuf,
    },
}

#[derive(Debug, Serialize)]
struct RecordSummary {
    input: Vec<i64>,
    sorted: Vec<i64>,
    min: i64,
    max: i64,
    range: usize,
    steps: usize,
    checksum: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    trace_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    timeline_path: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EntryView {
    pub index: usize,
    pub kind: StepKind,
    pub description: String,
    pub highlight: Option<usize>,
}

impl EntryView {
    fn new(entry: &HistoryEntry, min: i64, input: &[i64]) -> Self {
        Self {
            index: entry.index,
            kind: entry.record.kind(),
            description: entry.record.describe(min),
            highlight: highlight_index(&entry.record, input),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct NavigationReport {
    pub state: NavState,
    pub current_step: usize,
    pub total_steps: usize,
    pub visited: Vec<EntryView>,
    pub history: Vec<EntryView>,
    pub discovered_buckets: Vec<usize>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let logger = CliLogger::new(cli.json, cli.no_color);
    match run(&cli, &logger) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            logger.print_error(&format!("{err:#}"));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli, logger: &CliLogger) -> Result<()> {
    let config = Config::load_optional(&cli.config);
    match &cli.command {
        Command::Record { input, out, timeline } => {
            let values = input.resolve()?;
            let recording = Recorder::new(config.max_range).record(&values)?;
            if let Some(path) = out {
                TraceFile::new(&recording)?
                    .write_json(path)
                    .with_context(|| format!("writing trace {}", path.display()))?;
            }
            if let Some(path) = timeline {
                write_timeline(&recording, path)
                    .with_context(|| format!("writing timeline {}", path.display()))?;
            }
            let summary = RecordSummary {
                range: recording.range(),
                steps: recording.steps.len(),
                checksum: recording.checksum()?,
                trace_path: out.as_ref().map(|p| p.display().to_string()),
                timeline_path: timeline.as_ref().map(|p| p.display().to_string()),
                input: recording.input,
                sorted: recording.sorted,
                min: recording.min,
                max: recording.max,
            };
            logger.print_serialized(&summary)
        }

        Command::Step { input, count, all } => {
            let values = input.resolve()?;
            let mut nav = Navigator::from_config(&config);
            nav.start(&values)?;
            let min = nav.recording().map(|r| r.min).unwrap_or_default();

            let requested = if *all { usize::MAX } else { *count };
            let mut visited = Vec::new();
            let mut advanced = 0usize;
            {
                let mut observer = |e: &HistoryEntry| visited.push(EntryView::new(e, min, &values));
                while advanced < requested && nav.state() == NavState::Stepping {
                    nav.advance_one_with(&mut observer)?;
                    advanced += 1;
                }
            }
            if !*all && advanced < requested {
                logger.print_warning(&format!(
                    "sort completed after {advanced} of {requested} requested steps"
                ));
            }
            logger.print_navigation(&report(&nav, &config, &values, visited))
        }

        Command::Replay { input, to } => {
            let values = input.resolve()?;
            let mut nav = Navigator::from_config(&config);
            nav.start(&values)?;
            let min = nav.recording().map(|r| r.min).unwrap_or_default();
            let replay = nav.replay_to(*to)?;
            let visited = replay
                .consumed
                .iter()
                .map(|e| EntryView::new(e, min, &values))
                .collect();
            logger.print_navigation(&report(&nav, &config, &values, visited))
        }

        Command::Verify { trace } => {
            let file = TraceFile::read_json(trace)
                .with_context(|| format!("reading trace {}", trace.display()))?;
            file.verify(&Recorder::new(config.max_range))?;
            logger.print_serialized(&serde_json::json!({
                "ok": true,
                "trace": trace.display().to_string(),
                "trace_id": file.trace_id,
                "steps": file.steps.len(),
                "checksum": file.checksum,
            }))
        }
    }
}

fn report(nav: &Navigator, config: &Config, input: &[i64], visited: Vec<EntryView>) -> NavigationReport {
    let min = nav.recording().map(|r| r.min).unwrap_or_default();
    NavigationReport {
        state: nav.state(),
        current_step: nav.current_step(),
        total_steps: nav.steps().len(),
        visited,
        history: nav
            .visible_history(config.history_capacity)
            .iter()
            .map(|e| EntryView::new(e, min, input))
            .collect(),
        discovered_buckets: nav.discovered_buckets(),
    }
}
