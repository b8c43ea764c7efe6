use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDateTime, Timelike};
use once_cell::sync::Lazy;
use regex::{NoExpand, Regex};
use thiserror::Error;

use crate::fs::FileSystem;

pub const CAMERA: &str = "{camera}";
pub const DAY: &str = "{day}";
pub const EXTENSION: &str = "{extension}";
pub const FILENAME: &str = "{filename}";
pub const HOUR: &str = "{hour}";
pub const MINUTE: &str = "{minute}";
pub const MONTH: &str = "{month}";
pub const YEAR: &str = "{year}";

#[derive(Debug, Error)]
pub enum PathTransformError {
	#[error("source path must not be empty")]
	BlankSource,
	#[error("destination template must not be empty")]
	BlankTemplate,
}

static TOKEN_CAMERA: Lazy<Regex> = Lazy::new(|| token_regex(CAMERA));
static TOKEN_DAY: Lazy<Regex> = Lazy::new(|| token_regex(DAY));
static TOKEN_EXTENSION: Lazy<Regex> = Lazy::new(|| token_regex(EXTENSION));
static TOKEN_FILENAME: Lazy<Regex> = Lazy::new(|| token_regex(FILENAME));
static TOKEN_HOUR: Lazy<Regex> = Lazy::new(|| token_regex(HOUR));
static TOKEN_MINUTE: Lazy<Regex> = Lazy::new(|| token_regex(MINUTE));
static TOKEN_MONTH: Lazy<Regex> = Lazy::new(|| token_regex(MONTH));
static TOKEN_YEAR: Lazy<Regex> = Lazy::new(|| token_regex(YEAR));

fn token_regex(token: &str) -> Regex {
	Regex::new(&format!("(?i){}", regex::escape(token))).expect("token patterns are valid")
}

/// Render a destination template against a classified file.
///
/// Tokens are case-insensitive. A missing camera substitutes the empty
/// string; the separator doubling that can leave behind is cleaned up by
/// sanitization. The result has every character that is illegal in a path
/// component replaced with `_`, applied per segment so separators introduced
/// by date tokens survive.
pub fn render(
	source: &str,
	template: &str,
	date: NaiveDateTime,
	camera: Option<&str>,
) -> Result<String, PathTransformError> {
	validate(source, template)?;

	let (stem, extension) = split_stem_extension(file_name_of(source));

	let mut rendered = TOKEN_CAMERA
		.replace_all(template, NoExpand(camera.map(str::trim).unwrap_or_default()))
		.into_owned();

	for (token, value) in [
		(&TOKEN_YEAR, format!("{:04}", date.year())),
		(&TOKEN_MONTH, format!("{:02}", date.month())),
		(&TOKEN_DAY, format!("{:02}", date.day())),
		(&TOKEN_HOUR, format!("{:02}", date.hour())),
		(&TOKEN_MINUTE, format!("{:02}", date.minute())),
		(&TOKEN_FILENAME, stem.to_string()),
		(&TOKEN_EXTENSION, extension.to_string()),
	] {
		rendered = token.replace_all(&rendered, NoExpand(&value)).into_owned();
	}

	Ok(sanitize(&rendered))
}

/// Template-only rendering for the path-preview case: substitutes just
/// `{filename}`/`{extension}` and leaves every other token literally in
/// place, unsanitized.
pub fn render_basic(source: &str, template: &str) -> Result<String, PathTransformError> {
	validate(source, template)?;

	let (stem, extension) = split_stem_extension(file_name_of(source));

	let rendered = TOKEN_FILENAME
		.replace_all(template, NoExpand(stem))
		.into_owned();

	Ok(TOKEN_EXTENSION
		.replace_all(&rendered, NoExpand(extension))
		.into_owned())
}

/// Derive a non-colliding variant of `candidate` by appending `_0`, `_1`, …
/// to the file stem until nothing exists at the resulting path. The
/// existence check and the caller's eventual file operation are not atomic;
/// that race is accepted.
pub async fn unique_path(fs: &dyn FileSystem, candidate: &Path) -> PathBuf {
	if !fs.exists(candidate).await {
		return candidate.to_path_buf();
	}

	let stem = candidate
		.file_stem()
		.map(|stem| stem.to_string_lossy().into_owned())
		.unwrap_or_default();
	let suffix = candidate
		.extension()
		.map(|extension| format!(".{}", extension.to_string_lossy()))
		.unwrap_or_default();
	let parent = candidate.parent().unwrap_or_else(|| Path::new(""));

	let mut index: usize = 0;
	loop {
		let attempt = parent.join(format!("{stem}_{index}{suffix}"));
		if !fs.exists(&attempt).await {
			return attempt;
		}
		index += 1;
	}
}

fn validate(source: &str, template: &str) -> Result<(), PathTransformError> {
	if source.trim().is_empty() {
		return Err(PathTransformError::BlankSource);
	}
	if template.trim().is_empty() {
		return Err(PathTransformError::BlankTemplate);
	}
	Ok(())
}

/// Final path component of `source`, treating both separator styles as
/// separators so Windows-style templates behave the same everywhere.
fn file_name_of(source: &str) -> &str {
	source
		.rsplit(['/', '\\'])
		.next()
		.unwrap_or(source)
}

fn split_stem_extension(name: &str) -> (&str, &str) {
	match name.rfind('.') {
		Some(position) if position > 0 => (&name[..position], &name[position + 1..]),
		_ => (name, ""),
	}
}

/// Characters that may not appear inside a path component. Separators are
/// handled separately and `:` stays legal so drive-letter prefixes survive.
fn is_illegal(character: char) -> bool {
	character.is_control() || matches!(character, '<' | '>' | '"' | '|' | '?' | '*')
}

fn sanitize(path: &str) -> String {
	let mut sanitized = String::with_capacity(path.len());
	let mut previous_separator = None;

	for character in path.chars() {
		if character == '/' || character == '\\' {
			// Collapse doubled separators, e.g. from an empty `{camera}`.
			if previous_separator == Some(character) {
				continue;
			}
			previous_separator = Some(character);
			sanitized.push(character);
		} else {
			previous_separator = None;
			sanitized.push(if is_illegal(character) { '_' } else { character });
		}
	}

	sanitized
}

#[cfg(test)]
mod tests {
	use super::*;

	use chrono::NaiveDate;

	use crate::fs::LocalFileSystem;

	const SOURCE: &str = r"D:\Sync\Camera\WP_20151116_08_38_40_Pro.jpg";
	const TEMPLATE: &str =
		r"D:\Photos\Sorted\{year}\{month}\{day}\{camera}\{hour}_{minute} - {filename}.{extension}";

	fn date_taken() -> NaiveDateTime {
		NaiveDate::from_ymd_opt(2021, 9, 27)
			.and_then(|date| date.and_hms_opt(7, 22, 0))
			.expect("valid test date")
	}

	#[test]
	fn substitutes_every_token() {
		let rendered =
			render(SOURCE, TEMPLATE, date_taken(), Some("Nikon")).expect("render should succeed");

		assert_eq!(
			rendered,
			r"D:\Photos\Sorted\2021\09\27\Nikon\07_22 - WP_20151116_08_38_40_Pro.jpg"
		);
	}

	#[test]
	fn tokens_are_case_insensitive() {
		let rendered = render(
			"photo.jpg",
			"out/{YEAR}/{Month}/{FileName}.{EXTENSION}",
			date_taken(),
			None,
		)
		.expect("render should succeed");

		assert_eq!(rendered, "out/2021/09/photo.jpg");
	}

	#[test]
	fn missing_camera_collapses_doubled_separators() {
		let rendered =
			render(SOURCE, TEMPLATE, date_taken(), None).expect("render should succeed");

		assert_eq!(
			rendered,
			r"D:\Photos\Sorted\2021\09\27\07_22 - WP_20151116_08_38_40_Pro.jpg"
		);
	}

	#[test]
	fn camera_model_is_trimmed_and_sanitized() {
		let rendered = render(
			"photo.jpg",
			"out/{camera}/{filename}.{extension}",
			date_taken(),
			Some("  Ni<kon?9000  "),
		)
		.expect("render should succeed");

		assert_eq!(rendered, "out/Ni_kon_9000/photo.jpg");
	}

	#[test]
	fn preview_rendering_leaves_unresolved_tokens_intact() {
		let rendered = render_basic(SOURCE, TEMPLATE).expect("render should succeed");

		assert_eq!(
			rendered,
			r"D:\Photos\Sorted\{year}\{month}\{day}\{camera}\{hour}_{minute} - WP_20151116_08_38_40_Pro.jpg"
		);
	}

	#[test]
	fn blank_arguments_are_rejected_in_both_positions() {
		assert!(matches!(
			render("", TEMPLATE, date_taken(), None),
			Err(PathTransformError::BlankSource)
		));
		assert!(matches!(
			render(SOURCE, "  ", date_taken(), None),
			Err(PathTransformError::BlankTemplate)
		));
		assert!(matches!(
			render_basic(" ", TEMPLATE),
			Err(PathTransformError::BlankSource)
		));
		assert!(matches!(
			render_basic(SOURCE, ""),
			Err(PathTransformError::BlankTemplate)
		));
	}

	#[test]
	fn source_without_extension_substitutes_empty() {
		let rendered = render("clip", "out/{filename}.{extension}", date_taken(), None)
			.expect("render should succeed");

		assert_eq!(rendered, "out/clip.");
	}

	#[tokio::test]
	async fn unique_path_counts_upward_from_zero() {
		let dir = tempfile::tempdir().expect("tempdir");
		let fs = LocalFileSystem;
		let candidate = dir.path().join("photo.jpg");

		assert_eq!(unique_path(&fs, &candidate).await, candidate);

		tokio::fs::write(&candidate, b"first").await.expect("write");
		assert_eq!(
			unique_path(&fs, &candidate).await,
			dir.path().join("photo_0.jpg")
		);

		tokio::fs::write(dir.path().join("photo_0.jpg"), b"second")
			.await
			.expect("write");
		assert_eq!(
			unique_path(&fs, &candidate).await,
			dir.path().join("photo_1.jpg")
		);
	}
}
