//! Template image-path model.
//!
//! A template's `images` column maps each [`ImageSize`] to the storage
//! paths of its derivatives. Current rows hold a `{jpg, webp}` object per
//! size; older rows hold a single JPEG path string. Both shapes are read
//! through [`ImageVariant`] and normalized with [`ImageVariant::normalize`]
//! so no consumer has to inspect the raw JSON.

use serde::{Deserialize, Serialize};

use crate::types::DbId;

// ---------------------------------------------------------------------------
// Sizes and formats
// ---------------------------------------------------------------------------

/// A derivative size bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageSize {
    Orig,
    Sm,
    Md,
    Lg,
}

impl ImageSize {
    /// Every size, in the order derivatives are produced.
    pub const ALL: [ImageSize; 4] = [ImageSize::Orig, ImageSize::Sm, ImageSize::Md, ImageSize::Lg];

    /// Storage key / JSON key for this size.
    pub fn key(self) -> &'static str {
        match self {
            Self::Orig => "orig",
            Self::Sm => "sm",
            Self::Md => "md",
            Self::Lg => "lg",
        }
    }

    /// Target width in pixels. `None` for the original, which keeps its
    /// source dimensions.
    pub fn target_width(self) -> Option<u32> {
        match self {
            Self::Orig => None,
            Self::Sm => Some(80),
            Self::Md => Some(320),
            Self::Lg => Some(640),
        }
    }

    /// Parse a size key (`orig`, `sm`, `md`, `lg`), case-insensitive.
    pub fn from_key(key: &str) -> Option<Self> {
        match key.trim().to_ascii_lowercase().as_str() {
            "orig" => Some(Self::Orig),
            "sm" => Some(Self::Sm),
            "md" => Some(Self::Md),
            "lg" => Some(Self::Lg),
            _ => None,
        }
    }
}

/// Output encoding of a derivative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Jpg,
    Webp,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 2] = [OutputFormat::Jpg, OutputFormat::Webp];

    /// File extension used in storage paths.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpg => "jpg",
            Self::Webp => "webp",
        }
    }

    /// MIME type sent with the stored object.
    pub fn content_type(self) -> &'static str {
        match self {
            Self::Jpg => "image/jpeg",
            Self::Webp => "image/webp",
        }
    }

    /// Parse `jpg`/`jpeg`/`webp`, case-insensitive.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.trim().to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Some(Self::Jpg),
            "webp" => Some(Self::Webp),
            _ => None,
        }
    }
}

/// Storage path of one derivative: `{object_id}/{size}.{ext}`.
pub fn derivative_path(object_id: DbId, size: ImageSize, format: OutputFormat) -> String {
    format!("{object_id}/{}.{}", size.key(), format.extension())
}

// ---------------------------------------------------------------------------
// Path model
// ---------------------------------------------------------------------------

/// Paths (or URLs) of one size in both formats. An empty string marks a
/// format that does not exist for this size.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImagePaths {
    pub jpg: String,
    pub webp: String,
}

impl ImagePaths {
    pub fn get(&self, format: OutputFormat) -> &str {
        match format {
            OutputFormat::Jpg => &self.jpg,
            OutputFormat::Webp => &self.webp,
        }
    }
}

/// One entry of a template's `images` map as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ImageVariant {
    /// `{ "jpg": "...", "webp": "..." }`
    DualFormat(ImagePaths),
    /// Legacy `"uuid/sm.jpg"`: JPEG only.
    SingleFormat(String),
}

impl ImageVariant {
    /// Read-boundary normalization: a legacy path becomes the JPEG entry
    /// with an empty WebP entry.
    pub fn normalize(&self) -> ImagePaths {
        match self {
            Self::DualFormat(paths) => paths.clone(),
            Self::SingleFormat(path) => ImagePaths {
                jpg: path.clone(),
                webp: String::new(),
            },
        }
    }

    pub fn is_legacy(&self) -> bool {
        matches!(self, Self::SingleFormat(_))
    }
}

/// The `images` column of a template row.
///
/// Sizes are optional only so that malformed historical rows still load;
/// every row written by ingestion has all four sizes in both formats.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateImages {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orig: Option<ImageVariant>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sm: Option<ImageVariant>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub md: Option<ImageVariant>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lg: Option<ImageVariant>,
}

impl TemplateImages {
    /// Full dual-format path map for a freshly ingested object.
    pub fn for_object(object_id: DbId) -> Self {
        let entry = |size| {
            Some(ImageVariant::DualFormat(ImagePaths {
                jpg: derivative_path(object_id, size, OutputFormat::Jpg),
                webp: derivative_path(object_id, size, OutputFormat::Webp),
            }))
        };
        Self {
            orig: entry(ImageSize::Orig),
            sm: entry(ImageSize::Sm),
            md: entry(ImageSize::Md),
            lg: entry(ImageSize::Lg),
        }
    }

    pub fn get(&self, size: ImageSize) -> Option<&ImageVariant> {
        match size {
            ImageSize::Orig => self.orig.as_ref(),
            ImageSize::Sm => self.sm.as_ref(),
            ImageSize::Md => self.md.as_ref(),
            ImageSize::Lg => self.lg.as_ref(),
        }
    }

    /// Normalized paths for `size`; both entries empty if the size is absent.
    pub fn paths(&self, size: ImageSize) -> ImagePaths {
        self.get(size).map(ImageVariant::normalize).unwrap_or_default()
    }

    /// True if any present size uses the legacy single-string shape.
    pub fn is_legacy(&self) -> bool {
        ImageSize::ALL
            .iter()
            .filter_map(|size| self.get(*size))
            .any(ImageVariant::is_legacy)
    }

    /// True if every size is present in both formats.
    pub fn is_complete(&self) -> bool {
        ImageSize::ALL.iter().all(|size| {
            let paths = self.paths(*size);
            !paths.jpg.is_empty() && !paths.webp.is_empty()
        })
    }

    /// Every non-empty storage path across all sizes and formats.
    pub fn storage_paths(&self) -> Vec<String> {
        let mut paths = Vec::with_capacity(8);
        for size in ImageSize::ALL {
            let entry = self.paths(size);
            for path in [entry.jpg, entry.webp] {
                if !path.is_empty() && !paths.contains(&path) {
                    paths.push(path);
                }
            }
        }
        paths
    }

    /// Materialize URLs for every size with `to_url`. Missing paths stay
    /// empty rather than being passed to `to_url`.
    pub fn public_urls<F>(&self, to_url: F) -> PublicUrls
    where
        F: Fn(&str) -> String,
    {
        let materialize = |size| {
            let paths = self.paths(size);
            let url = |path: &str| {
                if path.is_empty() {
                    String::new()
                } else {
                    to_url(path)
                }
            };
            ImagePaths {
                jpg: url(&paths.jpg),
                webp: url(&paths.webp),
            }
        };
        PublicUrls {
            orig: materialize(ImageSize::Orig),
            sm: materialize(ImageSize::Sm),
            md: materialize(ImageSize::Md),
            lg: materialize(ImageSize::Lg),
        }
    }
}

/// Publicly reachable URLs for every size, always in the dual-format shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicUrls {
    pub orig: ImagePaths,
    pub sm: ImagePaths,
    pub md: ImagePaths,
    pub lg: ImagePaths,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn object_id() -> DbId {
        Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").unwrap()
    }

    #[test]
    fn for_object_builds_all_sizes_and_formats() {
        let images = TemplateImages::for_object(object_id());
        assert!(images.is_complete());
        assert!(!images.is_legacy());
        assert_eq!(
            images.paths(ImageSize::Md).webp,
            "550e8400-e29b-41d4-a716-446655440000/md.webp"
        );
        assert_eq!(images.storage_paths().len(), 8);
    }

    #[test]
    fn dual_format_json_round_trips() {
        let images = TemplateImages::for_object(object_id());
        let json = serde_json::to_value(&images).unwrap();
        assert_eq!(
            json["sm"]["jpg"],
            "550e8400-e29b-41d4-a716-446655440000/sm.jpg"
        );
        let back: TemplateImages = serde_json::from_value(json).unwrap();
        assert_eq!(back, images);
    }

    #[test]
    fn legacy_string_is_read_as_jpeg_only() {
        let images: TemplateImages = serde_json::from_value(serde_json::json!({
            "orig": "abc/orig.jpg",
            "sm": "abc/sm.jpg",
            "md": "abc/md.jpg",
            "lg": "abc/lg.jpg",
        }))
        .unwrap();

        assert!(images.is_legacy());
        assert!(!images.is_complete());
        let sm = images.paths(ImageSize::Sm);
        assert_eq!(sm.jpg, "abc/sm.jpg");
        assert_eq!(sm.webp, "");
        assert_eq!(images.storage_paths().len(), 4);
    }

    #[test]
    fn mixed_and_missing_sizes_still_load() {
        let images: TemplateImages = serde_json::from_value(serde_json::json!({
            "sm": "abc/sm.jpg",
            "lg": { "jpg": "abc/lg.jpg", "webp": "abc/lg.webp" },
        }))
        .unwrap();

        assert_eq!(images.paths(ImageSize::Md), ImagePaths::default());
        assert_eq!(images.paths(ImageSize::Lg).webp, "abc/lg.webp");
        assert_eq!(
            images.storage_paths(),
            vec!["abc/sm.jpg", "abc/lg.jpg", "abc/lg.webp"]
        );
    }

    #[test]
    fn public_urls_leave_missing_formats_empty() {
        let images: TemplateImages =
            serde_json::from_value(serde_json::json!({ "sm": "abc/sm.jpg" })).unwrap();
        let urls = images.public_urls(|path| format!("https://cdn.test/templates/{path}"));

        assert_eq!(urls.sm.jpg, "https://cdn.test/templates/abc/sm.jpg");
        assert_eq!(urls.sm.webp, "");
        assert_eq!(urls.orig, ImagePaths::default());
    }

    #[test]
    fn size_and_format_keys_parse() {
        assert_eq!(ImageSize::from_key("LG"), Some(ImageSize::Lg));
        assert_eq!(ImageSize::from_key("xl"), None);
        assert_eq!(OutputFormat::from_extension("jpeg"), Some(OutputFormat::Jpg));
        assert_eq!(OutputFormat::from_extension("png"), None);
        assert_eq!(OutputFormat::Webp.content_type(), "image/webp");
    }
}
