use std::{io, path::PathBuf, sync::Arc};

use async_trait::async_trait;
use tokio::fs;

use crate::{
	clock::Clock,
	job::{JobReport, OperationResult, Outcome},
};

/// Where completed job reports go. The watcher hands every finished run's
/// report to a sink; the default sink renders them to disk.
#[async_trait]
pub trait ReportSink: Send + Sync {
	/// Persist one report, returning where it landed.
	async fn write_report(&self, report: &JobReport) -> io::Result<PathBuf>;
}

/// Renders reports as human-readable text files named after the time of the
/// run, one directory for all of them.
pub struct FileReportWriter {
	directory: PathBuf,
	clock: Arc<dyn Clock>,
}

impl FileReportWriter {
	#[must_use]
	pub fn new(clock: Arc<dyn Clock>) -> Self {
		Self::with_directory(std::env::temp_dir().join("mediasort"), clock)
	}

	#[must_use]
	pub fn with_directory(directory: PathBuf, clock: Arc<dyn Clock>) -> Self {
		Self { directory, clock }
	}

	/// Write several reports into one file, in order.
	pub async fn write_reports(&self, reports: &[JobReport]) -> io::Result<PathBuf> {
		let path = self.report_path();
		fs::create_dir_all(&self.directory).await?;

		let mut rendered = String::new();
		for report in reports {
			rendered.push_str(&render_report(report));
			rendered.push('\n');
		}

		fs::write(&path, rendered).await?;

		Ok(path)
	}

	fn report_path(&self) -> PathBuf {
		self.directory.join(format!(
			"JobReport_{}.log",
			self.clock.now().format("%Y-%m-%d %H.%M.%S%.3f")
		))
	}
}

#[async_trait]
impl ReportSink for FileReportWriter {
	async fn write_report(&self, report: &JobReport) -> io::Result<PathBuf> {
		let path = self.report_path();
		fs::create_dir_all(&self.directory).await?;

		fs::write(&path, render_report(report)).await?;

		Ok(path)
	}
}

fn render_report(report: &JobReport) -> String {
	let errors = report.with_outcome(Outcome::Error).collect::<Vec<_>>();
	let skipped = report.with_outcome(Outcome::Skipped).collect::<Vec<_>>();
	let successes = report.with_outcome(Outcome::Success).collect::<Vec<_>>();
	let no_exif = report.without_exif_data().collect::<Vec<_>>();

	let mut lines = vec![
		format!("Job Name: {}", report.job_name),
		format!("Operation: {}", report.operation),
		format!("Dry Run: {}", report.dry_run),
		format!("Total Files: {}", report.results.len()),
		format!("Successes: {}", successes.len()),
		format!("Errors: {}", errors.len()),
		format!("Skipped: {}", skipped.len()),
		format!("No Exif: {}", no_exif.len()),
	];

	for (title, results) in [
		("Error Files", errors),
		("Skipped Files", skipped),
		("No Exif Files", no_exif),
		("Success Files", successes),
	] {
		lines.push(String::new());
		lines.push(format!("#### {title} ####"));
		lines.push(String::new());
		lines.extend(results.iter().map(|result| render_result(result)));
	}

	lines.push(String::new());
	lines.join("\n")
}

fn render_result(result: &OperationResult) -> String {
	format!(
		"Source: {}\tDestination: {}",
		result.source.display(),
		result.destination.display()
	)
}
