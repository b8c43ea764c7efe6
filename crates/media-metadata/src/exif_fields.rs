use std::{fs::File, io::BufReader, path::Path};

use chrono::NaiveDateTime;
use exif::{Exif, In, Reader, Tag, Value};
use tokio::task::spawn_blocking;

use crate::{Error, Result};

/// The subset of EXIF data that drives sorting decisions.
///
/// `date_taken` resolves in tag priority order: `DateTimeOriginal`, then
/// `DateTimeDigitized`, then plain `DateTime`.
#[derive(Debug, Clone, PartialEq)]
pub struct ExifFields {
	pub date_taken: Option<NaiveDateTime>,
	pub camera_model: Option<String>,
	pub location: Option<(f64, f64)>,
}

impl ExifFields {
	/// Read EXIF fields from a file on disk.
	///
	/// Files without EXIF data (or in a container format the reader does not
	/// understand) yield `Ok(None)`; only real I/O failures are errors.
	pub async fn from_path(path: impl AsRef<Path> + Send) -> Result<Option<Self>> {
		let owned_path = path.as_ref().to_owned();

		match spawn_blocking(move || read_fields(&owned_path)).await? {
			Ok(fields) => Ok(Some(fields)),
			Err(Error::Exif(
				exif::Error::NotFound(_) | exif::Error::NotSupported(_) | exif::Error::BlankValue(_),
			)) => Ok(None),
			Err(Error::Exif(exif::Error::Io(e))) => Err(Error::io(path, e)),
			Err(e) => Err(e),
		}
	}
}

fn read_fields(path: &Path) -> Result<ExifFields> {
	let file = File::open(path).map_err(|e| Error::io(path, e))?;

	let exif = Reader::new().read_from_container(&mut BufReader::new(file))?;

	Ok(ExifFields {
		date_taken: [Tag::DateTimeOriginal, Tag::DateTimeDigitized, Tag::DateTime]
			.into_iter()
			.find_map(|tag| ascii_field(&exif, tag))
			.and_then(|raw| parse_exif_datetime(&raw)),
		camera_model: ascii_field(&exif, Tag::Model),
		location: read_location(&exif),
	})
}

/// Parse an EXIF datetime string (`YYYY:MM:DD HH:MM:SS`) into a
/// [`NaiveDateTime`]. Some writers emit dashes in the date part, so that
/// variant is accepted too.
#[must_use]
pub fn parse_exif_datetime(raw: &str) -> Option<NaiveDateTime> {
	let raw = raw.trim();

	NaiveDateTime::parse_from_str(raw, "%Y:%m:%d %H:%M:%S")
		.or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S"))
		.ok()
}

fn ascii_field(exif: &Exif, tag: Tag) -> Option<String> {
	exif.get_field(tag, In::PRIMARY)
		.and_then(|field| match &field.value {
			Value::Ascii(values) => values
				.first()
				.map(|bytes| String::from_utf8_lossy(bytes).trim().to_string()),
			_ => None,
		})
		.filter(|value| !value.is_empty())
}

fn read_location(exif: &Exif) -> Option<(f64, f64)> {
	let latitude = coordinate(exif, Tag::GPSLatitude, Tag::GPSLatitudeRef)?;
	let longitude = coordinate(exif, Tag::GPSLongitude, Tag::GPSLongitudeRef)?;

	Some((latitude, longitude))
}

/// Convert a degrees/minutes/seconds rational triplet plus its hemisphere
/// reference into signed decimal degrees.
fn coordinate(exif: &Exif, value_tag: Tag, reference_tag: Tag) -> Option<f64> {
	let field = exif.get_field(value_tag, In::PRIMARY)?;

	let Value::Rational(parts) = &field.value else {
		return None;
	};
	if parts.len() < 3 {
		return None;
	}

	let degrees = parts[0].to_f64() + parts[1].to_f64() / 60.0 + parts[2].to_f64() / 3600.0;

	let reference = ascii_field(exif, reference_tag).unwrap_or_default();

	Some(if matches!(reference.as_str(), "S" | "W") {
		-degrees
	} else {
		degrees
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	use chrono::{NaiveDate, Timelike};

	#[test]
	fn parses_colon_separated_datetime() {
		let parsed = parse_exif_datetime("2021:09:27 07:22:00").expect("should parse");

		assert_eq!(
			parsed.date(),
			NaiveDate::from_ymd_opt(2021, 9, 27).expect("valid date")
		);
		assert_eq!((parsed.hour(), parsed.minute()), (7, 22));
	}

	#[test]
	fn parses_dash_separated_datetime() {
		assert!(parse_exif_datetime("2021-09-27 07:22:00").is_some());
	}

	#[test]
	fn rejects_garbage_datetime() {
		assert!(parse_exif_datetime("").is_none());
		assert!(parse_exif_datetime("not a date").is_none());
		assert!(parse_exif_datetime("2021:13:45 99:99:99").is_none());
	}

	#[tokio::test]
	async fn missing_file_is_an_error() {
		assert!(ExifFields::from_path("/definitely/not/here.jpg")
			.await
			.is_err());
	}
}
