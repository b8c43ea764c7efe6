use std::{fs, path::Path};

use chrono::{DateTime, Local, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;

/// Filename schemes that embed a capture timestamp. Every pattern's capture
/// groups, concatenated in order, form a compact `YYYYMMDDHHMMSS` stamp.
static STAMP_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
	[
		// Android screenshots: Screenshot_20201028-141626_Messages.jpg
		r"^Screenshot_(\d{8})-(\d{6})",
		// Snip & Sketch: Screenshot 2020-11-17 104051.png
		r"^Screenshot (\d{4})-(\d{2})-(\d{2}) (\d{6})",
		// Phone camera rolls: IMG_20190304_081200.jpg, VID_20190304_081200.mp4
		r"^(?:IMG|VID)_(\d{8})_(\d{6})",
		// Bare stamps: 20201031_090459.jpg
		r"^(\d{8})_(\d{6})",
		// OBS recordings: 2020-05-16 21-04-54.mkv
		r"^(\d{4})-(\d{2})-(\d{2}) (\d{2})-(\d{2})-(\d{2})",
		// Game captures (Switch, Steam screenshots): 2018022016403700_s.mp4
		r"^(?:\d+_)?(\d{14})",
	]
	.iter()
	.map(|pattern| Regex::new(pattern).expect("hardcoded patterns are valid"))
	.collect()
});

/// Recover a timestamp for a media file from its name, falling back to the
/// file's modification time when the name carries no recognizable stamp.
///
/// Returns `None` only when the fallback metadata cannot be read. Stamps
/// that name an impossible date (month 13, hour 25) are treated as no stamp.
#[must_use]
pub fn filename_timestamp(path: &Path) -> Option<NaiveDateTime> {
	path.file_name()
		.and_then(|name| name.to_str())
		.and_then(parse_stamped_name)
		.or_else(|| modified_time(path))
}

fn parse_stamped_name(name: &str) -> Option<NaiveDateTime> {
	STAMP_PATTERNS.iter().find_map(|pattern| {
		pattern.captures(name).and_then(|captures| {
			let compact = captures
				.iter()
				.skip(1)
				.flatten()
				.map(|group| group.as_str())
				.collect::<String>();

			NaiveDateTime::parse_from_str(&compact, "%Y%m%d%H%M%S").ok()
		})
	})
}

fn modified_time(path: &Path) -> Option<NaiveDateTime> {
	fs::metadata(path)
		.and_then(|metadata| metadata.modified())
		.ok()
		.map(|modified| DateTime::<Local>::from(modified).naive_local())
}
