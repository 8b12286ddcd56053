use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level configuration (loaded from fbox.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FboxConfig {
    pub split: SplitConfig,
    pub concat: ConcatConfig,
    pub tree: TreeConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    /// Default destination for chunks (default: source file's directory)
    pub destination: Option<PathBuf>,
    /// Copy buffer size in KiB for byte-oriented splits (default: 64)
    pub copy_buffer_kib: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConcatConfig {
    /// Extensions collected when the CLI passes none (empty = all files)
    pub extensions: Vec<String>,
    /// Emit a banner line before each file's content
    pub banner: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    /// Glob patterns excluded from rendering
    pub exclude_patterns: Vec<String>,
    /// Maximum recursion depth (unset = unlimited)
    pub max_depth: Option<usize>,
    /// Include hidden (dot-prefixed) entries
    pub show_hidden: bool,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            destination: None,
            copy_buffer_kib: 64,
        }
    }
}

impl Default for ConcatConfig {
    fn default() -> Self {
        Self {
            extensions: Vec::new(),
            banner: true,
        }
    }
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            exclude_patterns: vec![".git".into(), "target".into(), "node_modules".into()],
            max_depth: None,
            show_hidden: false,
        }
    }
}
