use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::SortOperation;

/// Outcome of a single file operation. Derived, never ambiguous: a result is
/// exactly one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Outcome {
	Success,
	Skipped,
	Error,
}

/// What happened to one candidate file during a job run.
#[derive(Debug, Clone, Serialize)]
pub struct OperationResult {
	pub source: PathBuf,
	/// Computed destination; may be empty when the failure happened before a
	/// destination could be determined.
	pub destination: PathBuf,
	pub outcome: Outcome,
	pub had_exif_data: bool,
}

impl OperationResult {
	pub fn success(source: &Path, destination: PathBuf, had_exif_data: bool) -> Self {
		Self {
			source: source.to_path_buf(),
			destination,
			outcome: Outcome::Success,
			had_exif_data,
		}
	}

	pub fn skipped(source: &Path, destination: PathBuf, had_exif_data: bool) -> Self {
		Self {
			source: source.to_path_buf(),
			destination,
			outcome: Outcome::Skipped,
			had_exif_data,
		}
	}

	pub fn error(source: &Path, destination: PathBuf, had_exif_data: bool) -> Self {
		Self {
			source: source.to_path_buf(),
			destination,
			outcome: Outcome::Error,
			had_exif_data,
		}
	}
}

/// Accumulated record of one job run, handed to the report sink once the run
/// completes (or is cancelled, in which case it covers the work done so far).
#[derive(Debug, Clone, Serialize)]
pub struct JobReport {
	pub job_name: String,
	pub operation: SortOperation,
	pub dry_run: bool,
	pub results: Vec<OperationResult>,
}

impl JobReport {
	#[must_use]
	pub fn new(job_name: String, operation: SortOperation, dry_run: bool) -> Self {
		Self {
			job_name,
			operation,
			dry_run,
			results: Vec::new(),
		}
	}

	pub fn with_outcome(&self, outcome: Outcome) -> impl Iterator<Item = &OperationResult> {
		self.results
			.iter()
			.filter(move |result| result.outcome == outcome)
	}

	pub fn without_exif_data(&self) -> impl Iterator<Item = &OperationResult> {
		self.results.iter().filter(|result| !result.had_exif_data)
	}
}
