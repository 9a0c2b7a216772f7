//! Source image assets and the image–map correspondence index
//!
//! Each submitted (or refetched) map image is held as an immutable blob
//! owned by the session. The manifest record names one originating file per
//! attribute column, so dataset `i` pairs with the asset named by manifest
//! entry `i`. A missing asset is non-fatal; that map simply has no paired
//! source image.

use std::collections::HashMap;

/// Immutable binary image blob plus its file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileAsset {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl FileAsset {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }
}

/// Build the name → asset index.
///
/// Later assets with a duplicate name overwrite earlier ones, matching how
/// assets are appended incrementally as they arrive.
pub fn index_assets(assets: &[FileAsset]) -> HashMap<&str, &FileAsset> {
    let mut index = HashMap::with_capacity(assets.len());
    for asset in assets {
        index.insert(asset.name.as_str(), asset);
    }
    index
}

/// Pair manifest file names, in order, with their assets.
///
/// The returned vec is positional: entry `i` is the image for dataset `i`,
/// or `None` when no asset of that name was materialized.
pub fn pair_by_manifest<'a>(
    manifest_names: &[String],
    index: &HashMap<&str, &'a FileAsset>,
) -> Vec<Option<&'a FileAsset>> {
    manifest_names
        .iter()
        .map(|name| index.get(name.as_str()).copied())
        .collect()
}
