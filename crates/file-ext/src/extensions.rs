///
/// References:
/// https://www.iana.org/assignments/media-types/media-types.xhtml
/// https://developer.mozilla.org/en-US/docs/Web/HTTP/MIME_types/Common_types
///

/// One registered extension and the mimetype it maps to.
///
/// Extensions are stored lowercase and without a leading dot; mimetypes are
/// lowercase `type/subtype` strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MimeEntry {
	pub extension: &'static str,
	pub mimetype: &'static str,
}

macro_rules! mime_table {
	($name:ident { $($extension:literal => $mimetype:literal,)+ }) => {
		pub const $name: &[MimeEntry] = &[
			$(MimeEntry { extension: $extension, mimetype: $mimetype },)+
		];
	};
}

mime_table! {
	IMAGE_MIMETYPES {
		"jpg" => "image/jpeg",
		"jpeg" => "image/jpeg",
		"jfif" => "image/jpeg",
		"png" => "image/png",
		"gif" => "image/gif",
		"bmp" => "image/bmp",
		"webp" => "image/webp",
		"tiff" => "image/tiff",
		"tif" => "image/tiff",
		"svg" => "image/svg+xml",
		"ico" => "image/vnd.microsoft.icon",
		"heic" => "image/heic",
		"heif" => "image/heif",
		"avif" => "image/avif",
		"psd" => "image/vnd.adobe.photoshop",
		"dng" => "image/x-adobe-dng",
		"cr2" => "image/x-canon-cr2",
		"nef" => "image/x-nikon-nef",
		"arw" => "image/x-sony-arw",
		"orf" => "image/x-olympus-orf",
		"rw2" => "image/x-panasonic-rw2",
	}
}

mime_table! {
	VIDEO_MIMETYPES {
		"mp4" => "video/mp4",
		"m4v" => "video/x-m4v",
		"mov" => "video/quicktime",
		"qt" => "video/quicktime",
		"avi" => "video/x-msvideo",
		"mkv" => "video/x-matroska",
		"webm" => "video/webm",
		"wmv" => "video/x-ms-wmv",
		"flv" => "video/x-flv",
		"mpg" => "video/mpeg",
		"mpeg" => "video/mpeg",
		"m2v" => "video/mpeg",
		"vob" => "video/mpeg",
		"3gp" => "video/3gpp",
		"ts" => "video/mp2t",
		"mts" => "video/mp2t",
		"m2ts" => "video/mp2t",
		"ogv" => "video/ogg",
	}
}

mime_table! {
	AUDIO_MIMETYPES {
		"mp3" => "audio/mpeg",
		"wav" => "audio/wav",
		"flac" => "audio/flac",
		"m4a" => "audio/mp4",
		"aac" => "audio/aac",
		"ogg" => "audio/ogg",
		"oga" => "audio/ogg",
		"opus" => "audio/opus",
		"wma" => "audio/x-ms-wma",
		"aiff" => "audio/aiff",
		"aif" => "audio/aiff",
		"amr" => "audio/amr",
	}
}

mime_table! {
	DOCUMENT_MIMETYPES {
		"pdf" => "application/pdf",
		"doc" => "application/msword",
		"docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
		"xls" => "application/vnd.ms-excel",
		"xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
		"txt" => "text/plain",
		"md" => "text/markdown",
		"html" => "text/html",
		"htm" => "text/html",
		"csv" => "text/csv",
		"json" => "application/json",
		"xml" => "application/xml",
	}
}

mime_table! {
	ARCHIVE_MIMETYPES {
		"zip" => "application/zip",
		"tar" => "application/x-tar",
		"gz" => "application/gzip",
		"bz2" => "application/x-bzip2",
		"xz" => "application/x-xz",
		"7z" => "application/x-7z-compressed",
		"rar" => "application/vnd.rar",
	}
}

const ALL_TABLES: &[&[MimeEntry]] = &[
	IMAGE_MIMETYPES,
	VIDEO_MIMETYPES,
	AUDIO_MIMETYPES,
	DOCUMENT_MIMETYPES,
	ARCHIVE_MIMETYPES,
];

/// Iterate every registered entry, in table order.
pub fn all_entries() -> impl Iterator<Item = &'static MimeEntry> {
	ALL_TABLES.iter().flat_map(|table| table.iter())
}

/// Look up the mimetype registered for an extension, ignoring case and a
/// leading dot.
#[must_use]
pub fn mimetype_for(extension: &str) -> Option<&'static str> {
	let extension = extension.trim().trim_start_matches('.').to_lowercase();
	all_entries()
		.find(|entry| entry.extension == extension)
		.map(|entry| entry.mimetype)
}
