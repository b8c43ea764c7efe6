use std::{path::PathBuf, sync::Arc};

use anyhow::Context;
use clap::Parser;
use ms_core::{
	clock::SystemClock,
	config,
	fs::LocalFileSystem,
	job::JobRunner,
	providers::{ExifMetadataProvider, FilenameTimestampHeuristics},
	report::{FileReportWriter, ReportSink},
	watcher::JobWatcher,
};
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Sort your photos and videos into folders based on their metadata.
#[derive(Debug, Parser)]
#[command(name = "mediasort", version, about)]
struct Args {
	/// Full path to the mediasort configuration file. Use --generate-config
	/// to produce a sample.
	#[arg(short, long)]
	config_path: Option<PathBuf>,

	/// Only run the named job from the config, then exit.
	#[arg(short, long)]
	job_name: Option<String>,

	/// After running all jobs, block and re-run them whenever new files
	/// appear in their source directories.
	#[arg(short, long)]
	watch: bool,

	/// Compute every destination but perform no file operations.
	#[arg(short, long)]
	dry_run: bool,

	/// Write a sample configuration file to the current directory, then exit.
	#[arg(short, long)]
	generate_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	tracing_subscriber::fmt()
		.with_env_filter(
			EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
		)
		.init();

	let args = Args::parse();

	if args.generate_config {
		let path = config::write_sample_config("ExampleConfig.json").await?;
		println!("Sample config written to {}", path.display());
		return Ok(());
	}

	let config_path = args
		.config_path
		.context("--config-path is required unless --generate-config is given")?;
	let config = config::load_config(&config_path).await?;

	let cancel = CancellationToken::new();
	tokio::spawn({
		let cancel = cancel.clone();
		async move {
			if tokio::signal::ctrl_c().await.is_ok() {
				info!("Shutting down...");
				cancel.cancel();
			}
		}
	});

	let runner = Arc::new(JobRunner::new(
		Arc::new(LocalFileSystem),
		Arc::new(ExifMetadataProvider),
		Arc::new(FilenameTimestampHeuristics),
	));
	let report_writer = Arc::new(FileReportWriter::new(Arc::new(SystemClock)));

	if let Some(job_name) = &args.job_name {
		let report = runner
			.run_job_by_name(&config, job_name, args.dry_run, &cancel)
			.await;
		let path = report_writer.write_report(&report).await?;
		println!("Job report written to {}", path.display());
		return Ok(());
	}

	let reports = runner.run_all_jobs(&config, args.dry_run, &cancel).await;
	let path = report_writer.write_reports(&reports).await?;
	println!("Job reports written to {}", path.display());

	if args.watch {
		let watcher = JobWatcher::new(
			Arc::clone(&runner),
			Arc::clone(&report_writer) as Arc<dyn ReportSink>,
		);

		watcher.start_watching(&config, args.dry_run, &cancel).await;
		cancel.cancelled().await;
		watcher.stop_all().await;
	}

	Ok(())
}
