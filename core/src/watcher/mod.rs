use std::{sync::Arc, time::Duration};

use async_channel as chan;
use notify::{Config as NotifyConfig, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::{
	sync::{Mutex, Semaphore},
	task::JoinHandle,
	time::{sleep_until, Instant},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};
use uuid::Uuid;

use crate::{
	config::{SortConfig, SortJob},
	job::JobRunner,
	report::ReportSink,
};

pub const DEFAULT_DEBOUNCE_WINDOW: Duration = Duration::from_secs(5);

#[derive(Debug, thiserror::Error)]
pub enum WatcherError {
	#[error("failed to create filesystem watch: {0}")]
	Notify(#[from] notify::Error),
}

/// One live watch: the notify handle keeping the OS watch alive, plus the
/// channel that tells the job's event loop to stop.
struct WatchRegistration {
	id: Uuid,
	job_name: String,
	// Dropping the watcher tears down the underlying OS watch.
	_watcher: RecommendedWatcher,
	stop_tx: chan::Sender<()>,
	handle: JoinHandle<()>,
}

/// Watches every job's source directory and re-runs the job when files
/// appear, coalescing event bursts with a trailing-edge debounce.
///
/// Each job gets its own watch, event loop, debounce deadline and run guard;
/// the runs themselves still serialize through the shared [`JobRunner`] lock.
pub struct JobWatcher {
	runner: Arc<JobRunner>,
	report_sink: Arc<dyn ReportSink>,
	debounce_window: Duration,
	registrations: Mutex<Vec<WatchRegistration>>,
}

impl JobWatcher {
	#[must_use]
	pub fn new(runner: Arc<JobRunner>, report_sink: Arc<dyn ReportSink>) -> Self {
		Self {
			runner,
			report_sink,
			debounce_window: DEFAULT_DEBOUNCE_WINDOW,
			registrations: Mutex::new(Vec::new()),
		}
	}

	/// Shorten (or lengthen) the quiescence window. Mostly for tests.
	#[must_use]
	pub fn with_debounce_window(mut self, window: Duration) -> Self {
		self.debounce_window = window;
		self
	}

	/// Tear down any previous registrations, then start one watch per job.
	///
	/// A registration that fails to initialize (say, a missing source
	/// directory) is logged and dropped; the other jobs' watches are
	/// unaffected.
	pub async fn start_watching(&self, config: &SortConfig, dry_run: bool, cancel: &CancellationToken) {
		self.stop_all().await;

		let mut registrations = self.registrations.lock().await;

		for job in &config.jobs {
			match self.watch_job(job, dry_run, cancel) {
				Ok(registration) => {
					info!(
						job = %job.name,
						source = %job.source_directory.display(),
						"Watching source directory",
					);
					registrations.push(registration);
				}
				Err(e) => {
					error!(job = %job.name, "Failed to start watching source directory: {e}");
				}
			}
		}
	}

	/// Dispose every active registration and pending debounce. Safe to call
	/// with no active watches.
	pub async fn stop_all(&self) {
		let mut registrations = self.registrations.lock().await;

		for registration in registrations.drain(..) {
			debug!(id = %registration.id, job = %registration.job_name, "Stopping watch");

			if registration.stop_tx.send(()).await.is_err() {
				trace!(job = %registration.job_name, "Watch loop already finished");
			}

			if let Err(e) = registration.handle.await {
				error!(job = %registration.job_name, "Failed to join watch loop: {e}");
			}
		}
	}

	fn watch_job(
		&self,
		job: &SortJob,
		dry_run: bool,
		cancel: &CancellationToken,
	) -> Result<WatchRegistration, WatcherError> {
		let id = Uuid::new_v4();
		let include = job.include_extensions_expanded();

		let (events_tx, events_rx) = chan::unbounded();
		let (stop_tx, stop_rx) = chan::bounded(1);

		let mut watcher = RecommendedWatcher::new(
			move |result: notify::Result<Event>| {
				// Unbounded channel, so this never blocks the notify thread.
				if events_tx.send_blocking(result).is_err() {
					trace!("Dropping filesystem event for a stopped watch");
				}
			},
			NotifyConfig::default(),
		)?;
		watcher.watch(&job.source_directory, RecursiveMode::Recursive)?;

		let handle = tokio::spawn(debounce_events(DebounceLoop {
			id,
			job: job.clone(),
			include,
			dry_run,
			runner: Arc::clone(&self.runner),
			report_sink: Arc::clone(&self.report_sink),
			window: self.debounce_window,
			events_rx,
			stop_rx,
			cancel: cancel.clone(),
		}));

		Ok(WatchRegistration {
			id,
			job_name: job.name.clone(),
			_watcher: watcher,
			stop_tx,
			handle,
		})
	}
}

struct DebounceLoop {
	id: Uuid,
	job: SortJob,
	include: Vec<String>,
	dry_run: bool,
	runner: Arc<JobRunner>,
	report_sink: Arc<dyn ReportSink>,
	window: Duration,
	events_rx: chan::Receiver<notify::Result<Event>>,
	stop_rx: chan::Receiver<()>,
	cancel: CancellationToken,
}

/// Single consumer over one job's event stream.
///
/// A relevant event (re)arms the debounce deadline, so the run fires only
/// after a full quiet window following the last event. Triggers observed
/// while a run is in flight are dropped outright, never queued, which keeps
/// event storms from stacking redundant runs.
async fn debounce_events(
	DebounceLoop {
		id,
		job,
		include,
		dry_run,
		runner,
		report_sink,
		window,
		events_rx,
		stop_rx,
		cancel,
	}: DebounceLoop,
) {
	let run_guard = Arc::new(Semaphore::new(1));
	let mut deadline: Option<Instant> = None;

	loop {
		// `deadline` is copied in so the event arm below can re-arm it while
		// this future is still held by the select.
		let timer = async move {
			match deadline {
				Some(at) => sleep_until(at).await,
				None => std::future::pending().await,
			}
		};

		tokio::select! {
			event = events_rx.recv() => match event {
				Ok(Ok(event)) => {
					if !is_relevant_event(&event, &include) {
						continue;
					}

					if run_guard.available_permits() == 0 {
						trace!(%id, job = %job.name, "Dropping trigger while a run is in flight");
						continue;
					}

					trace!(%id, job = %job.name, "Arming debounce timer");
					deadline = Some(Instant::now() + window);
				}
				Ok(Err(e)) => warn!(%id, job = %job.name, "Filesystem watch error: {e}"),
				Err(_) => break,
			},

			() = timer => {
				deadline = None;

				let Ok(permit) = Arc::clone(&run_guard).try_acquire_owned() else {
					trace!(%id, job = %job.name, "Dropping debounce fire while a run is in flight");
					continue;
				};

				debug!(%id, job = %job.name, "Debounce window elapsed, running job");

				let job = job.clone();
				let runner = Arc::clone(&runner);
				let report_sink = Arc::clone(&report_sink);
				let cancel = cancel.clone();

				tokio::spawn(async move {
					let report = runner.run_job(&job, dry_run, &cancel).await;

					if let Err(e) = report_sink.write_report(&report).await {
						error!(job = %job.name, "Failed to write job report: {e}");
					}

					drop(permit);
				});
			},

			_ = stop_rx.recv() => {
				debug!(%id, job = %job.name, "Watch loop stopping");
				break;
			}

			() = cancel.cancelled() => {
				debug!(%id, job = %job.name, "Watch loop cancelled");
				break;
			}
		}
	}
}

fn is_relevant_event(event: &Event, include: &[String]) -> bool {
	if !matches!(event.kind, EventKind::Create(_)) {
		return false;
	}

	event.paths.iter().any(|path| {
		path.extension().is_some_and(|extension| {
			let extension = extension.to_string_lossy().to_lowercase();
			include
				.iter()
				.any(|candidate| *candidate == extension || candidate == "*")
		})
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	use std::{io, path::{Path, PathBuf}};

	use async_trait::async_trait;
	use chrono::{NaiveDate, NaiveDateTime};
	use tempfile::TempDir;
	use tokio::time::sleep;

	use crate::{
		config::{OverwriteAction, SortOperation},
		fs::LocalFileSystem,
		job::JobReport,
		providers::{FileMetadata, FilenameTimestampProvider, MetadataProvider},
	};

	struct CollectingSink(Mutex<Vec<JobReport>>);

	#[async_trait]
	impl ReportSink for CollectingSink {
		async fn write_report(&self, report: &JobReport) -> io::Result<PathBuf> {
			self.0.lock().await.push(report.clone());
			Ok(PathBuf::new())
		}
	}

	struct FixedMetadata;

	#[async_trait]
	impl MetadataProvider for FixedMetadata {
		async fn file_metadata(&self, _path: &Path) -> Option<FileMetadata> {
			Some(FileMetadata {
				date_taken: date_taken(),
				camera_model: Some("Nikon".to_string()),
				location: None,
			})
		}
	}

	struct NoTimestamp;

	#[async_trait]
	impl FilenameTimestampProvider for NoTimestamp {
		async fn timestamp_for(&self, _path: &Path) -> Option<NaiveDateTime> {
			None
		}
	}

	fn date_taken() -> NaiveDateTime {
		NaiveDate::from_ymd_opt(2021, 9, 27)
			.and_then(|date| date.and_hms_opt(7, 22, 0))
			.expect("valid test date")
	}

	fn job(name: &str, source: &Path, destination: &TempDir) -> SortJob {
		SortJob {
			name: name.to_string(),
			source_directory: source.to_path_buf(),
			destination_file: format!(
				"{}/{{year}}/{{filename}}.{{extension}}",
				destination.path().join(name).display()
			),
			no_exif_directory: destination.path().join("no-exif"),
			include_extensions: vec!["jpg".to_string()],
			operation: SortOperation::Copy,
			overwrite_action: OverwriteAction::Skip,
			..Default::default()
		}
	}

	fn watcher_with_sink(window: Duration) -> (JobWatcher, Arc<CollectingSink>) {
		let sink = Arc::new(CollectingSink(Mutex::new(Vec::new())));
		let runner = Arc::new(JobRunner::new(
			Arc::new(LocalFileSystem),
			Arc::new(FixedMetadata),
			Arc::new(NoTimestamp),
		));

		let watcher = JobWatcher::new(runner, Arc::clone(&sink) as Arc<dyn ReportSink>)
			.with_debounce_window(window);

		(watcher, sink)
	}

	#[tokio::test]
	async fn burst_of_events_triggers_exactly_one_run() {
		let source = tempfile::tempdir().expect("tempdir");
		let destination = tempfile::tempdir().expect("tempdir");
		let (watcher, sink) = watcher_with_sink(Duration::from_millis(200));
		let cancel = CancellationToken::new();

		let config = SortConfig {
			jobs: vec![job("images", source.path(), &destination)],
		};
		watcher.start_watching(&config, false, &cancel).await;

		for name in ["a.jpg", "b.jpg", "c.jpg"] {
			tokio::fs::write(source.path().join(name), b"x")
				.await
				.expect("write");
			sleep(Duration::from_millis(20)).await;
		}

		// Wait out the debounce window plus the run itself.
		sleep(Duration::from_millis(800)).await;

		let reports = sink.0.lock().await;
		assert_eq!(reports.len(), 1, "burst must coalesce into a single run");
		assert_eq!(reports[0].results.len(), 3);

		drop(reports);
		watcher.stop_all().await;
	}

	#[tokio::test]
	async fn jobs_debounce_independently() {
		let source_a = tempfile::tempdir().expect("tempdir");
		let source_b = tempfile::tempdir().expect("tempdir");
		let destination = tempfile::tempdir().expect("tempdir");
		let (watcher, sink) = watcher_with_sink(Duration::from_millis(200));
		let cancel = CancellationToken::new();

		let config = SortConfig {
			jobs: vec![
				job("images", source_a.path(), &destination),
				job("videos", source_b.path(), &destination),
			],
		};
		watcher.start_watching(&config, false, &cancel).await;

		tokio::fs::write(source_a.path().join("a.jpg"), b"x")
			.await
			.expect("write");
		tokio::fs::write(source_b.path().join("b.jpg"), b"x")
			.await
			.expect("write");

		sleep(Duration::from_millis(800)).await;

		let reports = sink.0.lock().await;
		assert_eq!(reports.len(), 2, "each job runs once");

		let mut names = reports
			.iter()
			.map(|report| report.job_name.clone())
			.collect::<Vec<_>>();
		names.sort();
		assert_eq!(names, ["images", "videos"]);

		drop(reports);
		watcher.stop_all().await;
	}

	#[tokio::test]
	async fn irrelevant_extensions_do_not_trigger_runs() {
		let source = tempfile::tempdir().expect("tempdir");
		let destination = tempfile::tempdir().expect("tempdir");
		let (watcher, sink) = watcher_with_sink(Duration::from_millis(100));
		let cancel = CancellationToken::new();

		let config = SortConfig {
			jobs: vec![job("images", source.path(), &destination)],
		};
		watcher.start_watching(&config, false, &cancel).await;

		tokio::fs::write(source.path().join("notes.txt"), b"x")
			.await
			.expect("write");

		sleep(Duration::from_millis(400)).await;

		assert!(sink.0.lock().await.is_empty());

		watcher.stop_all().await;
	}

	#[tokio::test]
	async fn stop_all_is_idempotent() {
		let source = tempfile::tempdir().expect("tempdir");
		let destination = tempfile::tempdir().expect("tempdir");
		let (watcher, _sink) = watcher_with_sink(Duration::from_millis(100));
		let cancel = CancellationToken::new();

		watcher.stop_all().await;

		let config = SortConfig {
			jobs: vec![job("images", source.path(), &destination)],
		};
		watcher.start_watching(&config, false, &cancel).await;
		// Re-starting replaces the previous registrations wholesale.
		watcher.start_watching(&config, false, &cancel).await;

		assert_eq!(watcher.registrations.lock().await.len(), 1);

		watcher.stop_all().await;
		watcher.stop_all().await;

		assert!(watcher.registrations.lock().await.is_empty());
	}

	#[tokio::test]
	async fn missing_source_directory_does_not_break_other_watches() {
		let source = tempfile::tempdir().expect("tempdir");
		let destination = tempfile::tempdir().expect("tempdir");
		let (watcher, sink) = watcher_with_sink(Duration::from_millis(100));
		let cancel = CancellationToken::new();

		let config = SortConfig {
			jobs: vec![
				job("broken", Path::new("/definitely/not/here"), &destination),
				job("images", source.path(), &destination),
			],
		};
		watcher.start_watching(&config, false, &cancel).await;

		assert_eq!(watcher.registrations.lock().await.len(), 1);

		tokio::fs::write(source.path().join("a.jpg"), b"x")
			.await
			.expect("write");
		sleep(Duration::from_millis(500)).await;

		assert_eq!(sink.0.lock().await.len(), 1);

		watcher.stop_all().await;
	}
}
