use std::collections::HashSet;

use globset::{GlobBuilder, GlobMatcher};
use tracing::warn;

/// Keyword marking a specifier as a mimetype directive rather than a literal
/// extension, e.g. `"mimetype: image/*"`.
const MIMETYPE_KEYWORD: &str = "mimetype";

/// Expand raw include/exclude extension specifiers into a normalized set of
/// concrete extensions.
///
/// Literal specifiers pass through; `mimetype:` directives contribute every
/// registered extension whose mimetype matches the directive's wildcard
/// pattern (`*` and `?`, case-insensitive). The result is lowercase, stripped
/// of leading dots, duplicate-free, and in stable first-seen order.
///
/// Malformed directives (no `:`, or nothing after it) contribute nothing.
#[must_use]
pub fn expand_extensions(specifiers: &[String]) -> Vec<String> {
	let mut expanded = Vec::new();
	let mut seen = HashSet::new();

	for specifier in specifiers {
		if is_mimetype_directive(specifier) {
			let Some(matcher) = directive_matcher(specifier) else {
				continue;
			};

			for entry in ms_file_ext::all_entries() {
				if matcher.is_match(entry.mimetype) {
					push_unique(&mut expanded, &mut seen, entry.extension);
				}
			}
		} else {
			push_unique(&mut expanded, &mut seen, specifier);
		}
	}

	expanded
}

fn is_mimetype_directive(specifier: &str) -> bool {
	specifier.to_lowercase().contains(MIMETYPE_KEYWORD)
}

fn directive_matcher(specifier: &str) -> Option<GlobMatcher> {
	let parts = specifier
		.split(':')
		.map(str::trim)
		.filter(|part| !part.is_empty())
		.collect::<Vec<_>>();

	if parts.len() < 2 {
		return None;
	}

	match GlobBuilder::new(parts[1]).case_insensitive(true).build() {
		Ok(glob) => Some(glob.compile_matcher()),
		Err(e) => {
			warn!(pattern = parts[1], "Ignoring unparseable mimetype pattern: {e}");
			None
		}
	}
}

fn push_unique(expanded: &mut Vec<String>, seen: &mut HashSet<String>, raw: &str) {
	let normalized = raw.trim().trim_start_matches('.').to_lowercase();

	if normalized.is_empty() {
		return;
	}

	if seen.insert(normalized.clone()) {
		expanded.push(normalized);
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn specifiers(raw: &[&str]) -> Vec<String> {
		raw.iter().map(ToString::to_string).collect()
	}

	#[test]
	fn literals_are_normalized() {
		assert_eq!(
			expand_extensions(&specifiers(&[" .JPG ", "png", "jpg"])),
			vec!["jpg", "png"]
		);
	}

	#[test]
	fn mimetype_directive_expands_to_registered_extensions() {
		let expanded = expand_extensions(&specifiers(&["png", "jpg", "mimetype: image/*"]));

		assert!(expanded.contains(&"png".to_string()));
		assert!(expanded.contains(&"jpg".to_string()));
		assert!(expanded.contains(&"gif".to_string()));
		assert!(expanded.contains(&"webp".to_string()));
		assert!(expanded.contains(&"heic".to_string()));
		assert!(!expanded.contains(&"mp4".to_string()));

		// Expansion must not introduce duplicates: `jpg` is both a literal
		// and an `image/*` match.
		let unique = expanded.iter().collect::<std::collections::HashSet<_>>();
		assert_eq!(unique.len(), expanded.len());
	}

	#[test]
	fn directive_keyword_is_case_insensitive() {
		let expanded = expand_extensions(&specifiers(&["MimeType: VIDEO/*"]));

		assert!(expanded.contains(&"mp4".to_string()));
		assert!(expanded.contains(&"mkv".to_string()));
	}

	#[test]
	fn question_mark_matches_exactly_one_character() {
		let expanded = expand_extensions(&specifiers(&["mimetype: image/pn?"]));

		assert_eq!(expanded, vec!["png"]);
	}

	#[test]
	fn bare_star_matches_every_mimetype() {
		let expanded = expand_extensions(&specifiers(&["mimetype: *"]));

		assert_eq!(expanded.len(), ms_file_ext::all_entries().count());
	}

	#[test]
	fn malformed_directives_contribute_nothing() {
		assert!(expand_extensions(&specifiers(&["mimetype image/*"])).is_empty());
		assert!(expand_extensions(&specifiers(&["mimetype:"])).is_empty());
		assert!(expand_extensions(&specifiers(&["mimetype:   "])).is_empty());
	}

	#[test]
	fn empty_specifiers_are_dropped() {
		assert!(expand_extensions(&specifiers(&["", "  ", "."])).is_empty());
	}
}
