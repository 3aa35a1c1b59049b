//! Settings for parsing and related-element lookup.
//!
//! Every field has a default, so an empty TOML document is valid:
//!
//! ```toml
//! [parse]
//! max_bytes = 5242880
//! ignore_attributes = false
//! max_depth = 512
//!
//! [related]
//! path_match = "exact"
//! ```

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default upper bound on input size: 10 MiB.
pub const MAX_FILE_SIZE: usize = 10 * 1024 * 1024;

/// Default bound on element nesting. LDML files nest about a dozen levels.
pub const MAX_DEPTH: usize = 512;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ParseOptions {
    /// Maximum input length in bytes.
    pub max_bytes: usize,
    /// Drop all attributes while reading.
    pub ignore_attributes: bool,
    /// Maximum element nesting depth.
    pub max_depth: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            max_bytes: MAX_FILE_SIZE,
            ignore_attributes: false,
            max_depth: MAX_DEPTH,
        }
    }
}

/// How paths are compared when looking up nodes by path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PathMatch {
    /// Case-insensitive, with `[n]` sibling disambiguators ignored. Parallel
    /// subtrees can collide under this mode.
    #[default]
    Relaxed,
    /// Byte-for-byte string equality.
    Exact,
}

impl PathMatch {
    /// The form of `path` that is compared under this mode.
    pub fn key(self, path: &str) -> Cow<'_, str> {
        match self {
            PathMatch::Exact => Cow::Borrowed(path),
            PathMatch::Relaxed => Cow::Owned(normalize_path(path)),
        }
    }
}

/// Lower-case a path and strip every `[digits]` disambiguator.
pub fn normalize_path(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    let mut rest = path;
    while let Some(open) = rest.find('[') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find(']') {
            Some(close) if close > 0 && after[..close].bytes().all(|b| b.is_ascii_digit()) => {
                rest = &after[close + 1..];
            }
            _ => {
                out.push('[');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out.to_lowercase()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RelatedOptions {
    pub path_match: PathMatch,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub parse: ParseOptions,
    pub related: RelatedOptions,
}

impl Settings {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let settings = toml::from_str::<Settings>(text)?;
        log::debug!(
            "Loaded settings: max_bytes={} path_match={:?}",
            settings.parse.max_bytes,
            settings.related.path_match
        );
        Ok(settings)
    }
}
