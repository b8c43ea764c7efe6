use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("there was an i/o error {0} at {}", .1.display())]
	Io(std::io::Error, Box<Path>),
	#[error("error from the exif crate: {0}")]
	Exif(#[from] exif::Error),
	#[error("failed to join the metadata reading task: {0}")]
	Join(#[from] tokio::task::JoinError),
}

impl Error {
	pub(crate) fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
		Self::Io(source, path.as_ref().into())
	}
}

pub type Result<T> = std::result::Result<T, Error>;
