//! KVPulse CLI entry point

use anyhow::{Context, Result};
use kvpulse::config::cli::Cli;
use kvpulse::config::workload::{EngineType, OutputFormat};
use kvpulse::config::{toml, validator, Config};
use kvpulse::engine::noop::NoOpAdapter;
use kvpulse::engine::reference::ReferenceAdapter;
use kvpulse::engine::KvAdapter;
use kvpulse::generator::workload::PhasedWorkload;
use kvpulse::output::json::{write_json, JsonReport, JsonRun};
use kvpulse::output::text;
use kvpulse::{RunOptions, Session};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<()> {
    let cli = Cli::parse_args();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| cli.log_level().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = toml::parse_toml_file(&cli.config)?;
    let config = toml::merge_cli_with_config(&cli, config)?;
    validator::validate_config(&config).context("Configuration validation failed")?;

    let json_to_stdout = config.output.format == OutputFormat::Json && config.output.json_path.is_none();
    if !json_to_stdout {
        text::print_configuration(&config);
    }

    if cli.dry_run {
        println!("Dry run mode - configuration validated successfully");
        return Ok(());
    }

    match config.run.engine {
        EngineType::Reference => run_benchmark(&config, ReferenceAdapter::new()),
        EngineType::NoOp => run_benchmark(&config, NoOpAdapter),
    }
}

/// Load the initial population, then run the phased workload `runs` times
fn run_benchmark<A: KvAdapter>(config: &Config, adapter: A) -> Result<()> {
    let seed = config.run.seed.unwrap_or_else(rand::random);
    info!(seed, engine = %config.run.engine, "Preparing workload");

    let workload = PhasedWorkload::new(config.workload.clone(), seed)?;
    let session = Session::new(config.run.threads, adapter)?;
    let options = RunOptions::from(&config.run);

    let text_output = config.output.format == OutputFormat::Text;
    let mut report = JsonReport::new(config, seed);

    let load = session.load(&workload.bulk_load()).context("Bulk load failed")?;
    if text_output {
        text::print_load(&load);
    }
    report.load = Some(JsonRun::from_result(0, &load));

    for run in 0..config.run.runs {
        let result = session
            .run_workload(&workload, &options)
            .with_context(|| format!("Run {} failed", run + 1))?;
        if text_output {
            text::print_results(run, &result);
        }
        report.runs.push(JsonRun::from_result(run, &result));
    }

    if config.output.format == OutputFormat::Json {
        write_json(&report, config.output.json_path.as_deref())?;
        if let Some(ref path) = config.output.json_path {
            info!(path = %path.display(), "JSON report written");
        }
    }

    Ok(())
}
