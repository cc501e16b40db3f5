use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::assets::loader::resolve_asset_path;
use crate::assets::text::CaptionFont;
use crate::foundation::error::{StoryreelError, StoryreelResult};

/// Caption fonts keyed by language tag.
///
/// Tags are matched case-insensitively; unknown tags fall back to `default`. Paths are relative to
/// the pipeline's assets root unless absolute.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FontTable {
    /// Font used for unlisted languages and as the fallback when a language font fails to load.
    pub default: PathBuf,
    /// Language tag to font file.
    #[serde(default)]
    pub languages: BTreeMap<String, PathBuf>,
}

impl Default for FontTable {
    fn default() -> Self {
        let mut languages = BTreeMap::new();
        languages.insert(
            "Hindi".to_owned(),
            PathBuf::from("fonts/NotoSansDevanagari-Bold.ttf"),
        );
        languages.insert(
            "Telugu".to_owned(),
            PathBuf::from("fonts/NotoSansTelugu-Bold.ttf"),
        );
        Self {
            default: PathBuf::from("fonts/Inter-Bold.ttf"),
            languages,
        }
    }
}

impl FontTable {
    /// Table with a single font for every language.
    pub fn single(path: impl Into<PathBuf>) -> Self {
        Self {
            default: path.into(),
            languages: BTreeMap::new(),
        }
    }

    /// Font path configured for `language`, falling back to the default.
    pub fn resolve(&self, language: &str) -> &Path {
        let language = language.trim();
        self.languages
            .iter()
            .find(|(tag, _)| tag.eq_ignore_ascii_case(language))
            .map(|(_, p)| p.as_path())
            .unwrap_or(self.default.as_path())
    }

    /// Load the caption font for `language`.
    ///
    /// A language font that cannot be loaded degrades to the default font with a warning. A default
    /// font that cannot be loaded is a configuration error.
    pub fn load_for_language(&self, language: &str, assets_root: &Path) -> StoryreelResult<CaptionFont> {
        let chosen = self.resolve(language);
        if chosen != self.default.as_path() {
            match load_font_file(chosen, assets_root) {
                Ok(font) => return Ok(font),
                Err(e) => {
                    tracing::warn!(
                        language,
                        font = %chosen.display(),
                        error = %e,
                        "language font unavailable, using default caption font"
                    );
                }
            }
        }
        self.load_default(assets_root)
    }

    /// Load the default font.
    pub fn load_default(&self, assets_root: &Path) -> StoryreelResult<CaptionFont> {
        load_font_file(&self.default, assets_root).map_err(|e| {
            StoryreelError::config(format!(
                "default caption font '{}' could not be loaded: {e}",
                self.default.display()
            ))
        })
    }

    /// Reject empty paths.
    pub fn validate(&self) -> StoryreelResult<()> {
        if self.default.as_os_str().is_empty() {
            return Err(StoryreelError::config("font table default path is empty"));
        }
        for (tag, path) in &self.languages {
            if tag.trim().is_empty() {
                return Err(StoryreelError::config("font table has an empty language tag"));
            }
            if path.as_os_str().is_empty() {
                return Err(StoryreelError::config(format!(
                    "font table entry '{tag}' has an empty path"
                )));
            }
        }
        Ok(())
    }
}

fn load_font_file(path: &Path, assets_root: &Path) -> StoryreelResult<CaptionFont> {
    let full = resolve_asset_path(path, assets_root)?;
    let bytes = std::fs::read(&full).map_err(|e| {
        StoryreelError::asset_load(format!("failed to read font '{}': {e}", full.display()))
    })?;
    CaptionFont::from_bytes(bytes, full.display().to_string())
}

#[cfg(test)]
#[path = "../../tests/unit/layout/fonts.rs"]
mod tests;
