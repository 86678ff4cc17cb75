use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use crate::world::{AnimationRegistry, SheetLayout, SpriteSheet};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssetKeyError {
    #[error("asset key must not be empty")]
    Empty,
    #[error("asset key must not start with '/'")]
    LeadingSlash,
    #[error("asset key must not contain '\\\\'")]
    Backslash,
    #[error("asset key must not contain '..'")]
    ParentTraversal,
    #[error("asset key contains invalid character '{character}'")]
    InvalidCharacter { character: char },
}

/// Keys are lowercase relative paths without extension, e.g. `characters/hero`.
pub fn validate_asset_key(key: &str) -> Result<(), AssetKeyError> {
    if key.is_empty() {
        return Err(AssetKeyError::Empty);
    }
    if key.starts_with('/') {
        return Err(AssetKeyError::LeadingSlash);
    }
    if key.contains('\\') {
        return Err(AssetKeyError::Backslash);
    }
    if key.contains("..") {
        return Err(AssetKeyError::ParentTraversal);
    }
    for ch in key.chars() {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() || matches!(ch, '_' | '/' | '-') {
            continue;
        }
        return Err(AssetKeyError::InvalidCharacter { character: ch });
    }
    Ok(())
}

pub fn sprite_sheet_path(sprites_dir: &Path, key: &str) -> Result<PathBuf, AssetKeyError> {
    validate_asset_key(key)?;
    Ok(sprites_dir.join(format!("{key}.png")))
}

/// Loads sprite sheets by key, once each. Failures are cached as misses and
/// reported with a single warning per key; callers fall back to rectangles.
#[derive(Debug)]
pub struct SpriteLibrary {
    sprites_dir: PathBuf,
    cache: HashMap<String, Option<Arc<SpriteSheet>>>,
    warned_keys: HashSet<String>,
}

impl SpriteLibrary {
    pub fn new(sprites_dir: PathBuf) -> Self {
        Self {
            sprites_dir,
            cache: HashMap::new(),
            warned_keys: HashSet::new(),
        }
    }

    /// A sheet that cannot hold every frame `animations` asks of it counts
    /// as a miss.
    pub fn sheet(
        &mut self,
        key: &str,
        layout: &SheetLayout,
        animations: &AnimationRegistry,
    ) -> Option<Arc<SpriteSheet>> {
        if let Some(cached) = self.cache.get(key) {
            return cached.clone();
        }

        let loaded = match sprite_sheet_path(&self.sprites_dir, key) {
            Ok(path) => match SpriteSheet::load(&path, layout.clone())
                .and_then(|sheet| sheet.check_coverage(animations).map(|()| sheet))
            {
                Ok(sheet) => {
                    let (width, height) = sheet.size();
                    info!(sprite_key = key, width, height, "sprite_sheet_loaded");
                    Some(Arc::new(sheet))
                }
                Err(error) => {
                    self.warn_once(key, Some(&path), &error.to_string());
                    None
                }
            },
            Err(error) => {
                self.warn_once(key, None, &error.to_string());
                None
            }
        };
        self.cache.insert(key.to_string(), loaded.clone());
        loaded
    }

    fn warn_once(&mut self, key: &str, path: Option<&Path>, reason: &str) {
        if !self.warned_keys.insert(key.to_string()) {
            return;
        }
        let path_display = path
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| "<unresolved>".to_string());
        warn!(
            sprite_key = key,
            path = %path_display,
            reason,
            "sprite_sheet_load_failed_using_fallback"
        );
    }
}
