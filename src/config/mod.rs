//! Application configuration
//!
//! Three layers, later wins:
//! 1. Built-in defaults
//! 2. User config (~/.config/shipyard/config.toml or --config)
//! 3. CLI flags

mod defaults;
mod effective;
mod merge;

pub use defaults::BuiltinDefaults;
pub use effective::{
    AppSettings, ConfigError, ConfigOrigin, ConfigSource, EffectiveConfig, MAX_UNDO_LIMIT,
};
pub use merge::{deep_merge, merge_into, merge_layers};
