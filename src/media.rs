// Image URL normalization
//
// Listing images arrive either as plain strings or as objects whose URL
// lives under one of several keys. Precedence, highest first:
//   plain string, secureUrl, url, file, path, src, image
// Blank values are skipped. Relative paths are joined to the asset base URL.

use serde::{Deserialize, Serialize};

/// Known shapes of an image reference in API payloads
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ImageSource {
    Url(String),
    Object(ImageObject),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageObject {
    #[serde(default)]
    pub secure_url: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub src: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

impl ImageObject {
    fn candidates(&self) -> [Option<&str>; 6] {
        [
            self.secure_url.as_deref(),
            self.url.as_deref(),
            self.file.as_deref(),
            self.path.as_deref(),
            self.src.as_deref(),
            self.image.as_deref(),
        ]
    }
}

/// Resolve an image reference to an absolute URL
pub fn resolve_image_url(source: &ImageSource, asset_base_url: &str) -> Option<String> {
    let raw = match source {
        ImageSource::Url(url) => Some(url.as_str()),
        ImageSource::Object(obj) => obj.candidates().into_iter().flatten().find(|v| !v.trim().is_empty()),
    }?;

    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if is_absolute(raw) {
        return Some(raw.to_string());
    }

    Some(format!(
        "{}/{}",
        asset_base_url.trim_end_matches('/'),
        raw.trim_start_matches('/')
    ))
}

/// First resolvable image of a list, e.g. a listing's cover picture
pub fn first_image_url(sources: &[ImageSource], asset_base_url: &str) -> Option<String> {
    sources
        .iter()
        .find_map(|s| resolve_image_url(s, asset_base_url))
}

fn is_absolute(url: &str) -> bool {
    url.starts_with("http://")
        || url.starts_with("https://")
        || url.starts_with("data:")
        || url.starts_with("//")
}
