use std::{
	fmt,
	path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::extensions::expand_extensions;

#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("config path must not be empty")]
	EmptyPath,
	#[error("failed to read config file {}: {source}", .path.display())]
	Read {
		path: PathBuf,
		source: std::io::Error,
	},
	#[error("failed to parse config file {}: {source}", .path.display())]
	Parse {
		path: PathBuf,
		source: serde_json::Error,
	},
	#[error("failed to write config file {}: {source}", .path.display())]
	Write {
		path: PathBuf,
		source: std::io::Error,
	},
}

/// The operation a job performs on each matched file.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOperation {
	Move,
	Copy,
	#[default]
	Unknown,
}

impl fmt::Display for SortOperation {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			Self::Move => "Move",
			Self::Copy => "Copy",
			Self::Unknown => "Unknown",
		})
	}
}

/// What to do when a computed destination path is already occupied.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OverwriteAction {
	#[default]
	Overwrite,
	Skip,
	/// Keep both files by renaming the incoming one with a unique suffix.
	New,
}

/// One declarative sorting rule: which files to pick up, how to classify
/// them, and where they should land.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SortJob {
	/// Unique within a config; jobs are looked up by name case-insensitively.
	pub name: String,
	pub source_directory: PathBuf,
	/// Destination template for files carrying EXIF metadata.
	pub destination_file: String,
	/// Destination template for files dated via a filename timestamp.
	pub destination_no_exif_file: String,
	/// Directory receiving files that could not be classified at all.
	pub no_exif_directory: PathBuf,
	/// Raw include specifiers: literal extensions or `mimetype: <pattern>`
	/// directives.
	pub include_extensions: Vec<String>,
	pub exclude_extensions: Vec<String>,
	pub operation: SortOperation,
	pub overwrite_action: OverwriteAction,
	/// Whether to fall back to filename-embedded timestamps for files
	/// without EXIF data.
	pub use_timestamp: bool,
}

impl SortJob {
	#[must_use]
	pub fn include_extensions_expanded(&self) -> Vec<String> {
		expand_extensions(&self.include_extensions)
	}

	#[must_use]
	pub fn exclude_extensions_expanded(&self) -> Vec<String> {
		expand_extensions(&self.exclude_extensions)
	}
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SortConfig {
	pub jobs: Vec<SortJob>,
}

impl SortConfig {
	#[must_use]
	pub fn job_by_name(&self, name: &str) -> Option<&SortJob> {
		self.jobs
			.iter()
			.find(|job| job.name.eq_ignore_ascii_case(name))
	}
}

/// Load a [`SortConfig`] from a JSON file.
///
/// A blank path is a caller error; a missing file yields the default (empty)
/// config, matching the behavior of a freshly installed instance.
pub async fn load_config(path: impl AsRef<Path>) -> Result<SortConfig, ConfigError> {
	let path = path.as_ref();

	if path.as_os_str().is_empty() {
		return Err(ConfigError::EmptyPath);
	}

	if !tokio::fs::try_exists(path).await.unwrap_or(false) {
		info!(path = %path.display(), "Config file not found, using empty config");
		return Ok(SortConfig::default());
	}

	let raw = tokio::fs::read_to_string(path)
		.await
		.map_err(|source| ConfigError::Read {
			path: path.to_path_buf(),
			source,
		})?;

	serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
		path: path.to_path_buf(),
		source,
	})
}

/// The config written by `--generate-config`: one job per broad media kind,
/// exercising mimetype directives, overwrite policies and template tokens.
#[must_use]
pub fn sample_config() -> SortConfig {
	use crate::path_transform::{CAMERA, DAY, EXTENSION, FILENAME, HOUR, MINUTE, MONTH, YEAR};

	let dated_tree = |root: &str| {
		format!("Sorted/{root}/{YEAR}/{MONTH}/{DAY}/{CAMERA}/{HOUR}{MINUTE} - {FILENAME}.{EXTENSION}")
	};

	SortConfig {
		jobs: vec![
			SortJob {
				name: "Images".to_string(),
				operation: SortOperation::Move,
				source_directory: PathBuf::from("Sync/Camera"),
				destination_file: dated_tree("Images"),
				no_exif_directory: PathBuf::from("Sorted/NoExif/Images"),
				include_extensions: vec![
					"png".to_string(),
					"jpg".to_string(),
					"jpeg".to_string(),
					"mimetype: image/*".to_string(),
				],
				exclude_extensions: vec!["djv".to_string(), "djvu".to_string()],
				overwrite_action: OverwriteAction::Overwrite,
				..Default::default()
			},
			SortJob {
				name: "Videos".to_string(),
				operation: SortOperation::Move,
				source_directory: PathBuf::from("Sync/Camera"),
				destination_file: dated_tree("Videos"),
				no_exif_directory: PathBuf::from("Sorted/NoExif/Videos"),
				include_extensions: vec![
					"mp4".to_string(),
					"avi".to_string(),
					"m4v".to_string(),
					"mov".to_string(),
					"mimetype: video/*".to_string(),
				],
				overwrite_action: OverwriteAction::New,
				..Default::default()
			},
			SortJob {
				name: "Others".to_string(),
				operation: SortOperation::Move,
				source_directory: PathBuf::from("Sync/Camera"),
				destination_file: format!(
					"Sorted/Files/{YEAR}/{MONTH}/{DAY}/{HOUR}{MINUTE} - {FILENAME}.{EXTENSION}"
				),
				no_exif_directory: PathBuf::from("Sorted/NoExif/Files"),
				include_extensions: vec!["*".to_string()],
				exclude_extensions: vec![
					"png".to_string(),
					"jpg".to_string(),
					"jpeg".to_string(),
					"mp4".to_string(),
					"avi".to_string(),
					"m4v".to_string(),
					"mov".to_string(),
					"mimetype: image/*".to_string(),
					"mimetype: video/*".to_string(),
				],
				overwrite_action: OverwriteAction::Skip,
				..Default::default()
			},
		],
	}
}

/// Serialize the sample config to `path`, returning the path written.
pub async fn write_sample_config(path: impl AsRef<Path>) -> Result<PathBuf, ConfigError> {
	let path = path.as_ref();

	let serialized = serde_json::to_string_pretty(&sample_config()).map_err(|source| {
		ConfigError::Parse {
			path: path.to_path_buf(),
			source,
		}
	})?;

	tokio::fs::write(path, serialized)
		.await
		.map_err(|source| ConfigError::Write {
			path: path.to_path_buf(),
			source,
		})?;

	Ok(path.to_path_buf())
}
