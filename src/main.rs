use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing::{error, info};

use nexus_streams::processors::{
    run_processor, DataProcessor, LogProcessor, NumericProcessor, TextProcessor,
};
use nexus_streams::{logging, metrics, records, Config, Criteria, PipelineManager, StreamDispatcher};

#[derive(Parser)]
#[command(name = "nexus")]
#[command(about = "Classify, filter and aggregate loosely-typed records")]
#[command(version = "0.1.0")]
struct Cli {
    /// Optional TOML settings file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print a Prometheus metrics snapshot after the command
    #[arg(long, global = true)]
    metrics: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Dispatch a mixed batch into the sensor, transaction and event streams
    Streams {
        /// JSON array of records
        #[arg(long)]
        input: PathBuf,
        /// Criterion for sensor readings, e.g. ">30"
        #[arg(long, allow_hyphen_values = true)]
        sensor_filter: Option<String>,
        /// Criterion for transaction operations, e.g. "<0"
        #[arg(long, allow_hyphen_values = true)]
        transaction_filter: Option<String>,
        /// Criterion on event token length, e.g. ">4"
        #[arg(long, allow_hyphen_values = true)]
        event_filter: Option<String>,
    },
    /// Route encoded records through the three-stage pipelines
    Pipeline {
        /// JSON array of records
        #[arg(long)]
        input: PathBuf,
    },
    /// Run a single-record processor over each record
    Process {
        #[arg(long, value_enum)]
        kind: ProcessorKind,
        /// JSON array of records
        #[arg(long)]
        input: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ProcessorKind {
    Numeric,
    Text,
    Log,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => Config::default(),
    };
    let _guard = logging::init_logging(&config.logging);
    if cli.metrics {
        metrics::init_metrics();
    }

    match cli.command {
        Commands::Streams {
            input,
            sensor_filter,
            transaction_filter,
            event_filter,
        } => {
            let batch = records::load_records(&input)
                .with_context(|| format!("reading records from {}", input.display()))?;
            let criteria = Criteria {
                sensor: sensor_filter,
                transaction: transaction_filter,
                event: event_filter,
            };
            let mut dispatcher = StreamDispatcher::new(&config.streams);
            let report = dispatcher.dispatch(&batch, &criteria)?;
            print!("{report}");
        }
        Commands::Pipeline { input } => {
            let batch = records::load_records(&input)
                .with_context(|| format!("reading records from {}", input.display()))?;
            let mut manager = PipelineManager::new(&config.pipeline);
            let report = manager.process_data(&batch);
            for output in &report.outputs {
                println!("{output}");
            }
            let context = manager.context();
            println!(
                "Chain result: {} records processed through 3-stage pipeline ({} failed, {} skipped)",
                context.total, context.failures, report.skipped
            );
            println!("Lineage: {}", context.lineage_report());
            println!(
                "Performance: {}% efficiency, {:.3}s total processing time",
                context.efficiency(),
                context.elapsed.as_secs_f64()
            );
        }
        Commands::Process { kind, input } => {
            let batch = records::load_records(&input)
                .with_context(|| format!("reading records from {}", input.display()))?;
            let processor: Box<dyn DataProcessor> = match kind {
                ProcessorKind::Numeric => Box::new(NumericProcessor),
                ProcessorKind::Text => Box::new(TextProcessor),
                ProcessorKind::Log => Box::new(LogProcessor),
            };
            info!("Running {} processor over {} records", processor.name(), batch.len());
            for (index, record) in batch.iter().enumerate() {
                match run_processor(processor.as_ref(), record) {
                    Ok(line) => println!("Result {}: {}", index + 1, line),
                    Err(e) => {
                        error!("Record {} rejected by {} processor: {}", index, processor.name(), e);
                        println!("Result {}: {}", index + 1, e);
                    }
                }
            }
        }
    }

    if let Some(rendered) = metrics::render() {
        print!("{rendered}");
    }
    Ok(())
}
