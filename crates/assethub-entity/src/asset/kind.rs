//! Asset kind derived from the file extension.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Broad category of an asset, derived from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "asset_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    /// Raster or vector image.
    Image,
    /// PDF document.
    Pdf,
    /// Plain text.
    Text,
    /// JSON document.
    Json,
    /// XML document.
    Xml,
    /// HTML document.
    Html,
    /// JavaScript source.
    Javascript,
    /// Stylesheet.
    Css,
    /// Video.
    Video,
    /// Audio.
    Audio,
    /// Archive.
    Compressed,
    /// Word processor document.
    Word,
    /// Spreadsheet.
    Excel,
    /// Presentation.
    Powerpoint,
    /// Flash movie.
    Flash,
    /// Illustrator artwork.
    Illustrator,
    /// Photoshop document.
    Photoshop,
    /// Anything else.
    Unknown,
}

/// Extensions the image pipeline can read and transform.
pub const MANIPULATABLE_IMAGE_EXTENSIONS: &[&str] =
    &["jpg", "jpeg", "gif", "png", "wbmp", "xbm", "webp"];

impl AssetKind {
    /// Derive the kind from an extension (case-insensitive, without the dot).
    pub fn from_extension(extension: &str) -> Self {
        match extension.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" | "jpe" | "gif" | "png" | "bmp" | "wbmp" | "xbm" | "webp" | "tif"
            | "tiff" | "svg" | "ico" => Self::Image,
            "pdf" => Self::Pdf,
            "txt" | "text" | "md" | "csv" | "log" => Self::Text,
            "json" => Self::Json,
            "xml" => Self::Xml,
            "html" | "htm" => Self::Html,
            "js" => Self::Javascript,
            "css" => Self::Css,
            "avi" | "fla" | "flv" | "mov" | "mp4" | "mpeg" | "mpg" | "m4v" | "ogv" | "webm"
            | "wmv" => Self::Video,
            "aac" | "aif" | "aiff" | "flac" | "m4a" | "mp3" | "ogg" | "wav" | "wma" => {
                Self::Audio
            }
            "bz2" | "gz" | "rar" | "tar" | "tgz" | "zip" | "7z" => Self::Compressed,
            "doc" | "docx" | "odt" | "rtf" => Self::Word,
            "xls" | "xlsx" | "ods" => Self::Excel,
            "ppt" | "pptx" | "odp" => Self::Powerpoint,
            "swf" => Self::Flash,
            "ai" => Self::Illustrator,
            "psd" => Self::Photoshop,
            _ => Self::Unknown,
        }
    }

    /// Derive the kind from a filename.
    pub fn from_filename(filename: &str) -> Self {
        crate::naming::extension(filename)
            .map(Self::from_extension)
            .unwrap_or(Self::Unknown)
    }

    /// Return the kind as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Pdf => "pdf",
            Self::Text => "text",
            Self::Json => "json",
            Self::Xml => "xml",
            Self::Html => "html",
            Self::Javascript => "javascript",
            Self::Css => "css",
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Compressed => "compressed",
            Self::Word => "word",
            Self::Excel => "excel",
            Self::Powerpoint => "powerpoint",
            Self::Flash => "flash",
            Self::Illustrator => "illustrator",
            Self::Photoshop => "photoshop",
            Self::Unknown => "unknown",
        }
    }
}

/// Whether files with this extension can be transformed by the image pipeline.
pub fn is_image_manipulatable(extension: &str) -> bool {
    MANIPULATABLE_IMAGE_EXTENSIONS
        .iter()
        .any(|ext| ext.eq_ignore_ascii_case(extension))
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssetKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kind = match s {
            "image" => Self::Image,
            "pdf" => Self::Pdf,
            "text" => Self::Text,
            "json" => Self::Json,
            "xml" => Self::Xml,
            "html" => Self::Html,
            "javascript" => Self::Javascript,
            "css" => Self::Css,
            "video" => Self::Video,
            "audio" => Self::Audio,
            "compressed" => Self::Compressed,
            "word" => Self::Word,
            "excel" => Self::Excel,
            "powerpoint" => Self::Powerpoint,
            "flash" => Self::Flash,
            "illustrator" => Self::Illustrator,
            "photoshop" => Self::Photoshop,
            "unknown" => Self::Unknown,
            other => return Err(format!("Unknown asset kind: {other}")),
        };
        Ok(kind)
    }
}
