//! MIME type inference module
//!
//! Maps a filename to a Content-Type based on its extension. Used whenever a
//! route does not pin an explicit content type.

use std::path::Path;

/// Infer the Content-Type for a filename from its extension
///
/// # Examples
/// ```
/// use doorman::http::mime::content_type_for;
/// assert_eq!(content_type_for("index.html"), "text/html; charset=utf-8");
/// assert_eq!(content_type_for("app.wasm"), "application/wasm");
/// assert_eq!(content_type_for("blob"), "application/octet-stream");
/// ```
pub fn content_type_for(name: &str) -> &'static str {
    let extension = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        // Text
        Some("html" | "htm") => "text/html; charset=utf-8",
        Some("css") => "text/css",
        Some("txt" | "md") => "text/plain; charset=utf-8",
        Some("csv") => "text/csv",
        Some("xml") => "application/xml",

        // Scripts and data
        Some("js" | "mjs") => "application/javascript",
        Some("json") => "application/json",
        Some("wasm") => "application/wasm",
        Some("map") => "application/json",

        // Images
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        Some("webp") => "image/webp",
        Some("avif") => "image/avif",

        // Audio / video
        Some("mp3") => "audio/mpeg",
        Some("wav") => "audio/wav",
        Some("mp4") => "video/mp4",
        Some("webm") => "video/webm",
        Some("ogg" | "ogv") => "video/ogg",

        // Fonts
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        Some("ttf") => "font/ttf",
        Some("otf") => "font/otf",

        // Archives and documents
        Some("pdf") => "application/pdf",
        Some("zip") => "application/zip",
        Some("gz" | "gzip") => "application/gzip",

        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn common_types() {
        assert_eq!(content_type_for("page.html"), "text/html; charset=utf-8");
        assert_eq!(content_type_for("style.css"), "text/css");
        assert_eq!(content_type_for("bundle.js"), "application/javascript");
        assert_eq!(content_type_for("logo.svg"), "image/svg+xml");
        assert_eq!(content_type_for("clip.mp4"), "video/mp4");
    }

    #[test]
    fn extension_is_case_insensitive() {
        assert_eq!(content_type_for("PHOTO.JPG"), "image/jpeg");
        assert_eq!(content_type_for("Index.HTML"), "text/html; charset=utf-8");
    }

    #[test]
    fn unknown_or_missing_extension() {
        assert_eq!(content_type_for("data.xyz"), "application/octet-stream");
        assert_eq!(content_type_for("Makefile"), "application/octet-stream");
    }

    #[test]
    fn only_last_extension_counts() {
        assert_eq!(content_type_for("archive.tar.gz"), "application/gzip");
    }
}
