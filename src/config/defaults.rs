//! Built-in defaults (layer 1)

use serde::{Deserialize, Serialize};

/// Built-in default configuration values
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltinDefaults {
    /// Directory holding one folder per mod plus `settings.json`
    pub mods_dir: String,

    /// Directory holding the base dataset files
    pub base_dir: String,

    /// Undo history depth for the section grid (default: 50)
    pub undo_limit: u64,

    /// Default tracing filter when RUST_LOG is unset
    pub log_filter: String,
}

impl Default for BuiltinDefaults {
    fn default() -> Self {
        Self {
            mods_dir: "mods".to_string(),
            base_dir: "data".to_string(),
            undo_limit: 50,
            log_filter: "shipyard_mods=info".to_string(),
        }
    }
}

impl BuiltinDefaults {
    /// Convert to JSON Value for merging
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::json!({
            "mods_dir": self.mods_dir,
            "base_dir": self.base_dir,
            "undo_limit": self.undo_limit,
            "log_filter": self.log_filter,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let defaults = BuiltinDefaults::default();
        assert_eq!(defaults.undo_limit, 50);
        assert_eq!(defaults.mods_dir, "mods");
        assert_eq!(defaults.base_dir, "data");
    }

    #[test]
    fn test_to_value() {
        let value = BuiltinDefaults::default().to_value();
        assert_eq!(value["undo_limit"], 50);
        assert_eq!(value["log_filter"], "shipyard_mods=info");
    }
}
