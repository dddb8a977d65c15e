//! Supported media formats.

use serde::{Deserialize, Serialize};

/// A media format the converter knows how to name and route.
///
/// Every variant maps to exactly one canonical MIME type and one canonical
/// extension, so the MIME and extension lookups are inverse of each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Format {
    /// Advanced Audio Coding
    Aac,
    /// Animated PNG
    Apng,
    /// AV1 Image File Format
    Avif,
    /// Audio Video Interleave
    Avi,
    /// Windows bitmap
    Bmp,
    /// Graphics Interchange Format
    Gif,
    /// JPEG
    Jpeg,
    /// MPEG-4 Part 14
    Mp4,
    /// MPEG program stream
    Mpeg,
    /// Ogg video
    Ogv,
    /// Portable Network Graphics
    Png,
    /// Tagged Image File Format
    Tiff,
    /// MPEG transport stream
    MpegTs,
    /// WebM
    Webm,
    /// WebP
    Webp,
    /// High Efficiency Image Coding
    Heic,
    /// High Efficiency Image File Format
    Heif,
}

impl Format {
    /// All formats, in registry order.
    pub const ALL: [Format; 17] = [
        Format::Aac,
        Format::Apng,
        Format::Avif,
        Format::Avi,
        Format::Bmp,
        Format::Gif,
        Format::Jpeg,
        Format::Mp4,
        Format::Mpeg,
        Format::Ogv,
        Format::Png,
        Format::Tiff,
        Format::MpegTs,
        Format::Webm,
        Format::Webp,
        Format::Heic,
        Format::Heif,
    ];

    /// Returns the canonical MIME type.
    pub fn mime(&self) -> &'static str {
        match self {
            Self::Aac => "audio/aac",
            Self::Apng => "image/apng",
            Self::Avif => "image/avif",
            Self::Avi => "video/avi",
            Self::Bmp => "image/bmp",
            Self::Gif => "image/gif",
            Self::Jpeg => "image/jpeg",
            Self::Mp4 => "video/mp4",
            Self::Mpeg => "video/mpeg",
            Self::Ogv => "video/ogv",
            Self::Png => "image/png",
            Self::Tiff => "image/tiff",
            Self::MpegTs => "video/mp2t",
            Self::Webm => "video/webm",
            Self::Webp => "image/webp",
            Self::Heic => "image/heic",
            Self::Heif => "image/heif",
        }
    }

    /// Returns the canonical file extension (without the dot).
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Aac => "aac",
            Self::Apng => "apng",
            Self::Avif => "avif",
            Self::Avi => "avi",
            Self::Bmp => "bmp",
            Self::Gif => "gif",
            Self::Jpeg => "jpg",
            Self::Mp4 => "mp4",
            Self::Mpeg => "mpeg",
            Self::Ogv => "ogv",
            Self::Png => "png",
            Self::Tiff => "tiff",
            Self::MpegTs => "ts",
            Self::Webm => "webm",
            Self::Webp => "webp",
            Self::Heic => "heic",
            Self::Heif => "heif",
        }
    }

    /// Whether content of this format may hold more than one frame.
    ///
    /// Only decides output naming; the engine is never told about it.
    pub fn is_multi_frame(&self) -> bool {
        matches!(
            self,
            Self::Apng
                | Self::Avi
                | Self::Gif
                | Self::Mp4
                | Self::Mpeg
                | Self::Ogv
                | Self::MpegTs
                | Self::Webm
                | Self::Webp
        )
    }

    /// Looks up a format by its canonical MIME type.
    ///
    /// Exact match only, so every accepted MIME type is the one
    /// [`Format::mime`] returns.
    pub fn from_mime(mime: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|f| f.mime() == mime)
    }

    /// Resolves a declared MIME type, tolerating case, surrounding
    /// whitespace and a few common non-canonical aliases.
    pub fn resolve_mime(mime: &str) -> Option<Self> {
        let mime = mime.trim().to_ascii_lowercase();
        if let Some(format) = Self::from_mime(&mime) {
            return Some(format);
        }
        match mime.as_str() {
            "image/jpg" => Some(Self::Jpeg),
            "video/x-msvideo" => Some(Self::Avi),
            "video/ogg" => Some(Self::Ogv),
            _ => None,
        }
    }

    /// Looks up a format by extension (with or without a leading dot).
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.trim().trim_start_matches('.').to_ascii_lowercase();
        if let Some(format) = Self::ALL.iter().find(|f| f.extension() == ext) {
            return Some(*format);
        }
        match ext.as_str() {
            "jpeg" => Some(Self::Jpeg),
            "tif" => Some(Self::Tiff),
            _ => None,
        }
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.mime())
    }
}
