use std::path::Path;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use ms_media_metadata::{filename_timestamp, ExifFields};
use tokio::task::spawn_blocking;
use tracing::debug;

/// Metadata extracted for a single media file.
#[derive(Debug, Clone, PartialEq)]
pub struct FileMetadata {
	pub date_taken: NaiveDateTime,
	pub camera_model: Option<String>,
	pub location: Option<(f64, f64)>,
}

/// How a file will be dated for destination templating.
///
/// Produced by consulting the providers in fixed priority order: embedded
/// metadata first, then (when the job opts in) the filename-timestamp
/// heuristic, else unclassified.
#[derive(Debug, Clone, PartialEq)]
pub enum FileClassification {
	ExifDated(FileMetadata),
	TimestampDated(NaiveDateTime),
	Unclassified,
}

/// Best-effort embedded-metadata extraction; files without usable metadata
/// yield `None`, never an error.
#[async_trait]
pub trait MetadataProvider: Send + Sync {
	async fn file_metadata(&self, path: &Path) -> Option<FileMetadata>;
}

/// Best-effort filename-embedded-timestamp recovery.
#[async_trait]
pub trait FilenameTimestampProvider: Send + Sync {
	async fn timestamp_for(&self, path: &Path) -> Option<NaiveDateTime>;
}

/// Default [`MetadataProvider`] backed by EXIF data.
///
/// A date taken is required for the metadata to count; camera model and
/// location ride along when present.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExifMetadataProvider;

#[async_trait]
impl MetadataProvider for ExifMetadataProvider {
	async fn file_metadata(&self, path: &Path) -> Option<FileMetadata> {
		match ExifFields::from_path(path).await {
			Ok(Some(fields)) => fields.date_taken.map(|date_taken| FileMetadata {
				date_taken,
				camera_model: fields.camera_model,
				location: fields.location,
			}),
			Ok(None) => None,
			Err(e) => {
				debug!(path = %path.display(), "Failed to read embedded metadata: {e}");
				None
			}
		}
	}
}

/// Default [`FilenameTimestampProvider`] over the well-known filename
/// schemes, with the file's modification time as fallback.
#[derive(Debug, Default, Clone, Copy)]
pub struct FilenameTimestampHeuristics;

#[async_trait]
impl FilenameTimestampProvider for FilenameTimestampHeuristics {
	async fn timestamp_for(&self, path: &Path) -> Option<NaiveDateTime> {
		let path = path.to_owned();

		spawn_blocking(move || filename_timestamp(&path))
			.await
			.ok()
			.flatten()
	}
}
