//! The mediasort job execution engine.
//!
//! A [`config::SortJob`] describes which files to pick up (extension sets,
//! optionally expanded from mimetype wildcards), how to classify them (EXIF
//! date, filename-embedded timestamp, or neither) and where the result should
//! land (a destination path template). [`job::JobRunner`] executes jobs one
//! at a time behind a global run lock, and [`watcher::JobWatcher`] re-triggers
//! them with a trailing-edge debounce as new files appear.

pub mod clock;
pub mod config;
pub mod extensions;
pub mod fs;
pub mod job;
pub mod path_transform;
pub mod providers;
pub mod report;
pub mod watcher;

pub use config::{OverwriteAction, SortConfig, SortJob, SortOperation};
pub use job::{JobReport, JobRunner, OperationResult, Outcome};
pub use watcher::JobWatcher;
