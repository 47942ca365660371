mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::Cli;
use rotator_core::{
    discover, print_summary, progress, write_json, DiscoveryConfig, OnnxOrientationClassifier,
    OrientationClassifier, PipelineConfig, RotationPipeline, RotatorConfig, RunReporter,
};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(code) => code,
        Err(error) => {
            eprintln!("Error: {:#}", error);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();
}

fn run(cli: &Cli) -> Result<ExitCode> {
    let images = scan(cli)?;
    if images.is_empty() {
        return Ok(ExitCode::FAILURE);
    }

    let config = match &cli.config {
        Some(path) => RotatorConfig::load(path)?,
        None => RotatorConfig::load_or_default()?,
    };
    let model_id = cli.model.as_deref().unwrap_or(&config.default_model);
    let model = config.model(Some(model_id))?;
    let classifier = OnnxOrientationClassifier::from_config(&config, &model)
        .with_context(|| format!("failed to set up model {}", model.name))?;
    info!("processing {} image(s) with {}", images.len(), model.name);

    correct_images(cli, &images, classifier, model_id)
}

/// Prints the scan banner and returns the candidates.
fn scan(cli: &Cli) -> Result<Vec<PathBuf>> {
    let discovery = DiscoveryConfig::new(cli.recursive()).with_backups(cli.include_backups);
    let images = discover(&cli.directory, &discovery)?;

    println!("Scanning for images in: {}", cli.directory.display());
    if images.is_empty() {
        println!("No supported image files found");
    } else {
        println!("Found {} image(s)", images.len());
    }
    Ok(images)
}

/// Runs the pipeline over `images` and maps the totals to the exit code.
fn correct_images<C: OrientationClassifier>(
    cli: &Cli,
    images: &[PathBuf],
    classifier: C,
    model_id: &str,
) -> Result<ExitCode> {
    if cli.dry_run {
        println!("DRY RUN - No changes will be made");
    }

    let pipeline_config = PipelineConfig::default()
        .with_backup(cli.backup())
        .with_dry_run(cli.dry_run);
    let mut pipeline = RotationPipeline::new(classifier, pipeline_config);
    let reporter = RunReporter::new(images.len(), cli.dry_run, cli.verbose);

    let progress_bar = progress::image_progress(images.len(), !cli.no_progress);
    let summary = pipeline.run(images, reporter, &progress_bar);
    progress_bar.finish_with_message("Processing complete");

    print_summary(&summary);

    if let Some(report_path) = &cli.report {
        write_json(&summary, model_id, report_path)
            .with_context(|| format!("failed to write report {}", report_path.display()))?;
        println!("JSON report written to {}", report_path.display());
    }

    Ok(if summary.has_errors() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
