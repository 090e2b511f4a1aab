use std::path::Path;

/// MIME type for a path, by extension. Extensions are matched
/// case-insensitively. Unrecognized files fall back to
/// `application/octet-stream` so that every directory entry stays browseable.
///
/// MIME strings use DLNA-correct values (e.g. "video/x-matroska" for .mkv,
/// "video/MP2T" for .ts/.m2ts).
pub fn by_extension(path: &Path) -> &'static str {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return "application/octet-stream";
    };
    match ext.to_ascii_lowercase().as_str() {
        // Video
        "mp4" => "video/mp4",
        "m4v" => "video/mp4",
        "mkv" => "video/x-matroska",
        "avi" => "video/x-msvideo",
        "mov" => "video/quicktime",
        "ts" => "video/MP2T",
        "m2ts" => "video/MP2T",
        "mts" => "video/MP2T",
        "mpg" => "video/mpeg",
        "mpeg" => "video/mpeg",
        "wmv" => "video/x-ms-wmv",
        "flv" => "video/x-flv",
        "ogv" => "video/ogg",
        "webm" => "video/webm",
        "3gp" => "video/3gpp",

        // Audio
        "mp3" => "audio/mpeg",
        "flac" => "audio/flac",
        "wav" => "audio/wav",
        "m4a" => "audio/mp4",
        "aac" => "audio/aac",
        "ogg" => "audio/ogg",
        "oga" => "audio/ogg",
        "wma" => "audio/x-ms-wma",
        "opus" => "audio/ogg",
        "aiff" => "audio/aiff",
        "aif" => "audio/aiff",

        // Image
        "jpg" => "image/jpeg",
        "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "tiff" => "image/tiff",
        "tif" => "image/tiff",

        // Text
        "txt" => "text/plain",
        "srt" => "text/srt",
        "vtt" => "text/vtt",

        _ => "application/octet-stream",
    }
}

/// The major type, i.e. everything before the `/`.
pub fn major_type(mime: &str) -> &str {
    mime.split('/').next().unwrap_or(mime)
}

pub fn is_video(mime: &str) -> bool {
    major_type(mime) == "video"
}

/// ContentDirectory item class for a MIME type:
/// `object.item.<major>Item`, e.g. `object.item.videoItem`.
pub fn upnp_class(mime: &str) -> String {
    format!("object.item.{}Item", major_type(mime))
}
