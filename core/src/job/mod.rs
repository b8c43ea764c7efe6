use std::{
	collections::HashSet,
	io,
	path::{Path, PathBuf},
	sync::Arc,
};

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::{
	config::{OverwriteAction, SortConfig, SortJob, SortOperation},
	fs::FileSystem,
	path_transform::{self, PathTransformError},
	providers::{FileClassification, FilenameTimestampProvider, MetadataProvider},
};

mod report;

pub use report::{JobReport, OperationResult, Outcome};

/// What the runner does about an already-occupied destination path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverwriteBehavior {
	Proceed,
	Skip,
	Rename,
}

/// The overwrite decision table. A free destination always proceeds; an
/// occupied one follows the configured action.
#[must_use]
pub const fn decide_overwrite(
	destination_exists: bool,
	action: OverwriteAction,
) -> OverwriteBehavior {
	match (destination_exists, action) {
		(false, _) | (true, OverwriteAction::Overwrite) => OverwriteBehavior::Proceed,
		(true, OverwriteAction::Skip) => OverwriteBehavior::Skip,
		(true, OverwriteAction::New) => OverwriteBehavior::Rename,
	}
}

/// Executes sort jobs one at a time.
///
/// All runs, whether invoked directly or via the watcher, serialize through
/// the runner's run lock, so two jobs can never interleave their file
/// operations. Share a single runner (behind an [`Arc`]) to get that
/// guarantee process-wide.
pub struct JobRunner {
	fs: Arc<dyn FileSystem>,
	metadata: Arc<dyn MetadataProvider>,
	filename_timestamps: Arc<dyn FilenameTimestampProvider>,
	run_lock: Mutex<()>,
}

impl JobRunner {
	pub fn new(
		fs: Arc<dyn FileSystem>,
		metadata: Arc<dyn MetadataProvider>,
		filename_timestamps: Arc<dyn FilenameTimestampProvider>,
	) -> Self {
		Self {
			fs,
			metadata,
			filename_timestamps,
			run_lock: Mutex::new(()),
		}
	}

	/// Run one job to completion, returning the report of everything done.
	///
	/// Failures on individual files are recorded and skipped, never
	/// propagated; cancellation and job-level failures yield a partial
	/// report. The run lock is released on every exit path.
	pub async fn run_job(
		&self,
		job: &SortJob,
		dry_run: bool,
		cancel: &CancellationToken,
	) -> JobReport {
		let mut report = JobReport::new(job.name.clone(), job.operation, dry_run);

		let _guard = tokio::select! {
			guard = self.run_lock.lock() => guard,
			() = cancel.cancelled() => {
				info!(job = %job.name, "Job run cancelled while waiting for the run lock");
				return report;
			}
		};

		info!(job = %job.name, dry_run, "Starting job run");

		let candidates = match self.collect_candidates(job, cancel).await {
			Ok(candidates) => candidates,
			Err(e) => {
				error!(job = %job.name, "Failed to enumerate source files: {e}");
				return report;
			}
		};

		for (index, file) in candidates.iter().enumerate() {
			if cancel.is_cancelled() {
				info!(job = %job.name, "Job run cancelled");
				break;
			}

			info!(
				job = %job.name,
				file = %file.display(),
				index = index + 1,
				total = candidates.len(),
				"Processing file",
			);

			report
				.results
				.push(self.perform_file_operation(job, dry_run, file).await);
		}

		info!(job = %job.name, results = report.results.len(), "Job run finished");

		report
	}

	/// Look a job up by name (case-insensitive) and run it. An unknown name
	/// yields an empty report tagged with an unknown operation, not an error.
	pub async fn run_job_by_name(
		&self,
		config: &SortConfig,
		job_name: &str,
		dry_run: bool,
		cancel: &CancellationToken,
	) -> JobReport {
		match config.job_by_name(job_name) {
			Some(job) => self.run_job(job, dry_run, cancel).await,
			None => {
				error!(job = job_name, "Job not found in config");
				JobReport::new(job_name.to_string(), SortOperation::Unknown, dry_run)
			}
		}
	}

	/// Run every job in the config, in config order.
	pub async fn run_all_jobs(
		&self,
		config: &SortConfig,
		dry_run: bool,
		cancel: &CancellationToken,
	) -> Vec<JobReport> {
		let mut reports = Vec::with_capacity(config.jobs.len());

		for job in &config.jobs {
			reports.push(self.run_job(job, dry_run, cancel).await);
		}

		reports
	}

	async fn collect_candidates(
		&self,
		job: &SortJob,
		cancel: &CancellationToken,
	) -> io::Result<Vec<PathBuf>> {
		let include = job.include_extensions_expanded();
		let exclude = job.exclude_extensions_expanded();

		let mut candidates = Vec::new();
		let mut seen = HashSet::new();

		for extension in &include {
			if cancel.is_cancelled() {
				break;
			}

			for file in self
				.fs
				.files_with_extension(&job.source_directory, extension)
				.await?
			{
				if is_excluded(&file, &exclude) {
					continue;
				}
				// Overlapping include sets (`*` plus a literal) must not
				// enumerate a file twice.
				if seen.insert(file.clone()) {
					candidates.push(file);
				}
			}
		}

		Ok(candidates)
	}

	async fn perform_file_operation(
		&self,
		job: &SortJob,
		dry_run: bool,
		file: &Path,
	) -> OperationResult {
		let classification = self.classify(job, file).await;
		let had_exif_data = matches!(classification, FileClassification::ExifDated(_));

		let mut destination = match self.destination_for(job, file, &classification).await {
			Ok(destination) => destination,
			Err(e) => {
				warn!(file = %file.display(), "Failed to compute destination: {e}");
				return OperationResult::error(file, PathBuf::new(), had_exif_data);
			}
		};

		if dry_run {
			info!(
				source = %file.display(),
				destination = %destination.display(),
				"Dry run, skipping file operation",
			);
			return OperationResult::skipped(file, destination, had_exif_data);
		}

		match decide_overwrite(self.fs.exists(&destination).await, job.overwrite_action) {
			OverwriteBehavior::Skip => {
				warn!(destination = %destination.display(), "Destination exists, skipping");
				return OperationResult::skipped(file, destination, had_exif_data);
			}
			OverwriteBehavior::Rename => {
				warn!(destination = %destination.display(), "Destination exists, renaming");
				destination = path_transform::unique_path(self.fs.as_ref(), &destination).await;
			}
			OverwriteBehavior::Proceed => {}
		}

		match self.apply_operation(job, file, &destination).await {
			Ok(()) => OperationResult::success(file, destination, had_exif_data),
			Err(e) => {
				warn!(
					source = %file.display(),
					destination = %destination.display(),
					"File operation failed: {e}",
				);
				OperationResult::error(file, destination, had_exif_data)
			}
		}
	}

	async fn classify(&self, job: &SortJob, file: &Path) -> FileClassification {
		if let Some(metadata) = self.metadata.file_metadata(file).await {
			return FileClassification::ExifDated(metadata);
		}

		if job.use_timestamp {
			if let Some(date) = self.filename_timestamps.timestamp_for(file).await {
				return FileClassification::TimestampDated(date);
			}
		}

		FileClassification::Unclassified
	}

	async fn destination_for(
		&self,
		job: &SortJob,
		file: &Path,
		classification: &FileClassification,
	) -> Result<PathBuf, PathTransformError> {
		let source = file.to_string_lossy();

		match classification {
			FileClassification::ExifDated(metadata) => path_transform::render(
				&source,
				&job.destination_file,
				metadata.date_taken,
				metadata.camera_model.as_deref(),
			)
			.map(PathBuf::from),

			FileClassification::TimestampDated(date) => {
				path_transform::render(&source, &job.destination_no_exif_file, *date, None)
					.map(PathBuf::from)
			}

			// No overwrite policy applies here; the fallback destination is
			// uniquified up front instead.
			FileClassification::Unclassified => {
				let fallback = job
					.no_exif_directory
					.join(file.file_name().unwrap_or_default());

				Ok(path_transform::unique_path(self.fs.as_ref(), &fallback).await)
			}
		}
	}

	async fn apply_operation(
		&self,
		job: &SortJob,
		source: &Path,
		destination: &Path,
	) -> io::Result<()> {
		if let Some(parent) = destination.parent() {
			self.fs.create_dir_all(parent).await?;
		}

		info!(
			operation = %job.operation,
			source = %source.display(),
			destination = %destination.display(),
			"Applying file operation",
		);

		match job.operation {
			SortOperation::Move => self.fs.move_file(source, destination, true).await,
			SortOperation::Copy => self.fs.copy_file(source, destination, true).await,
			SortOperation::Unknown => Ok(()),
		}
	}
}

fn is_excluded(file: &Path, exclude: &[String]) -> bool {
	file.extension().is_some_and(|extension| {
		let extension = extension.to_string_lossy().to_lowercase();
		exclude.iter().any(|candidate| *candidate == extension)
	})
}
