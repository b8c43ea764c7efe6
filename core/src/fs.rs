use std::{
	io,
	path::{Path, PathBuf},
};

use async_trait::async_trait;
use tokio::fs;

/// Filesystem capability used by the job runner and path uniquification.
///
/// The contract mirrors what sorting actually needs: existence probes,
/// recursive enumeration with extension filtering, and move/copy with an
/// overwrite flag. Everything else stays with the caller.
#[async_trait]
pub trait FileSystem: Send + Sync {
	async fn exists(&self, path: &Path) -> bool;

	async fn create_dir_all(&self, path: &Path) -> io::Result<()>;

	async fn move_file(&self, source: &Path, destination: &Path, overwrite: bool)
		-> io::Result<()>;

	async fn copy_file(&self, source: &Path, destination: &Path, overwrite: bool)
		-> io::Result<()>;

	/// Recursively enumerate files under `directory` whose extension equals
	/// `extension` (case-insensitive, without a dot; `"*"` matches any file
	/// that has an extension). Hidden entries and symlinks are skipped.
	async fn files_with_extension(
		&self,
		directory: &Path,
		extension: &str,
	) -> io::Result<Vec<PathBuf>>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFileSystem;

#[async_trait]
impl FileSystem for LocalFileSystem {
	async fn exists(&self, path: &Path) -> bool {
		fs::try_exists(path).await.unwrap_or(false)
	}

	async fn create_dir_all(&self, path: &Path) -> io::Result<()> {
		fs::create_dir_all(path).await
	}

	async fn move_file(
		&self,
		source: &Path,
		destination: &Path,
		overwrite: bool,
	) -> io::Result<()> {
		if !overwrite && fs::try_exists(destination).await? {
			return Err(io::Error::new(
				io::ErrorKind::AlreadyExists,
				"destination already exists",
			));
		}

		match fs::rename(source, destination).await {
			Ok(()) => Ok(()),
			// Renames cannot cross mount points; fall back to copy + remove.
			Err(_) => {
				fs::copy(source, destination).await?;
				fs::remove_file(source).await
			}
		}
	}

	async fn copy_file(
		&self,
		source: &Path,
		destination: &Path,
		overwrite: bool,
	) -> io::Result<()> {
		if !overwrite && fs::try_exists(destination).await? {
			return Err(io::Error::new(
				io::ErrorKind::AlreadyExists,
				"destination already exists",
			));
		}

		fs::copy(source, destination).await.map(|_| ())
	}

	async fn files_with_extension(
		&self,
		directory: &Path,
		extension: &str,
	) -> io::Result<Vec<PathBuf>> {
		let mut found = Vec::new();
		let mut pending = vec![directory.to_path_buf()];

		while let Some(current) = pending.pop() {
			let mut entries = fs::read_dir(&current).await?;

			while let Some(entry) = entries.next_entry().await? {
				let file_type = entry.file_type().await?;

				if should_skip(&entry, &file_type).await {
					continue;
				}

				if file_type.is_dir() {
					pending.push(entry.path());
				} else if extension_matches(&entry.path(), extension) {
					found.push(entry.path());
				}
			}
		}

		// read_dir order is platform-dependent; keep results reproducible.
		found.sort();

		Ok(found)
	}
}

async fn should_skip(entry: &fs::DirEntry, file_type: &std::fs::FileType) -> bool {
	if entry.file_name().to_string_lossy().starts_with('.') {
		return true;
	}

	if file_type.is_symlink() {
		return true;
	}

	#[cfg(windows)]
	{
		use std::os::windows::fs::MetadataExt;

		const FILE_ATTRIBUTE_HIDDEN: u32 = 0x2;
		const FILE_ATTRIBUTE_SYSTEM: u32 = 0x4;

		if let Ok(metadata) = entry.metadata().await {
			if metadata.file_attributes() & (FILE_ATTRIBUTE_HIDDEN | FILE_ATTRIBUTE_SYSTEM) != 0 {
				return true;
			}
		}
	}

	false
}

fn extension_matches(path: &Path, wanted: &str) -> bool {
	path.extension().is_some_and(|extension| {
		wanted == "*" || extension.to_string_lossy().eq_ignore_ascii_case(wanted)
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	async fn touch(path: &Path) {
		if let Some(parent) = path.parent() {
			fs::create_dir_all(parent).await.expect("create parent");
		}
		fs::write(path, b"x").await.expect("write");
	}

	#[tokio::test]
	async fn enumerates_recursively_and_case_insensitively() {
		let dir = tempfile::tempdir().expect("tempdir");
		touch(&dir.path().join("a.jpg")).await;
		touch(&dir.path().join("b.JPG")).await;
		touch(&dir.path().join("nested/deep/c.jpg")).await;
		touch(&dir.path().join("d.png")).await;

		let found = LocalFileSystem
			.files_with_extension(dir.path(), "jpg")
			.await
			.expect("enumerate");

		assert_eq!(found.len(), 3);
		assert!(found.iter().all(|path| {
			path.extension()
				.is_some_and(|ext| ext.to_string_lossy().eq_ignore_ascii_case("jpg"))
		}));
	}

	#[tokio::test]
	async fn star_matches_any_extension() {
		let dir = tempfile::tempdir().expect("tempdir");
		touch(&dir.path().join("a.jpg")).await;
		touch(&dir.path().join("b.png")).await;
		touch(&dir.path().join("no_extension")).await;

		let found = LocalFileSystem
			.files_with_extension(dir.path(), "*")
			.await
			.expect("enumerate");

		assert_eq!(found.len(), 2);
	}

	#[tokio::test]
	async fn hidden_entries_are_skipped() {
		let dir = tempfile::tempdir().expect("tempdir");
		touch(&dir.path().join("visible.jpg")).await;
		touch(&dir.path().join(".hidden.jpg")).await;
		touch(&dir.path().join(".cache/d.jpg")).await;

		let found = LocalFileSystem
			.files_with_extension(dir.path(), "jpg")
			.await
			.expect("enumerate");

		assert_eq!(found, vec![dir.path().join("visible.jpg")]);
	}

	#[tokio::test]
	async fn move_file_replaces_when_overwriting() {
		let dir = tempfile::tempdir().expect("tempdir");
		let source = dir.path().join("source.jpg");
		let destination = dir.path().join("destination.jpg");
		touch(&source).await;
		touch(&destination).await;

		let fs = LocalFileSystem;

		assert!(fs.move_file(&source, &destination, false).await.is_err());
		assert!(fs.exists(&source).await);

		fs.move_file(&source, &destination, true)
			.await
			.expect("overwrite move");
		assert!(!fs.exists(&source).await);
		assert!(fs.exists(&destination).await);
	}
}
