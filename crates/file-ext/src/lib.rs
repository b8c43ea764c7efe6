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

//! Static registry of file extensions and the mimetypes they carry.
//!
//! The tables here back the `mimetype:` wildcard directives in sort job
//! configurations, so they only need to cover formats a camera roll or a
//! downloads folder realistically contains, not the whole IANA registry.

mod extensions;

pub use extensions::{
	all_entries, mimetype_for, MimeEntry, ARCHIVE_MIMETYPES, AUDIO_MIMETYPES, DOCUMENT_MIMETYPES,
	IMAGE_MIMETYPES, VIDEO_MIMETYPES,
};
