#![warn(
	clippy::all,
	clippy::pedantic,
	clippy::correctness,
	clippy::perf,
	clippy::style,
	clippy::suspicious,
	clippy::complexity,
	clippy::nursery,
	clippy::unwrap_used,
	unused_qualifications,
	rust_2018_idioms,
	trivial_casts,
	trivial_numeric_casts,
	unused_allocation,
	clippy::dbg_macro
)]
#![forbid(unsafe_code)]
#![allow(clippy::missing_errors_doc)]

//! Best-effort media metadata extraction.
//!
//! Everything here is "try" semantics: a file without usable metadata is a
//! `None`, not an error. Only real I/O failures surface as [`Error`].

mod error;
mod exif_fields;
mod filename;

pub use error::{Error, Result};
pub use exif_fields::{parse_exif_datetime, ExifFields};
pub use filename::filename_timestamp;
