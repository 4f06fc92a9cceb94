//! Shipyard Mods - data layering for a starship design tool
//!
//! Community mods override slices of the base game data. This crate stores
//! mods on disk, orders them, merges their rows over the base dataset,
//! resolves house rules, validates edits and backs the spreadsheet-style
//! mod editor.

pub mod base;
pub mod bundle;
pub mod config;
pub mod grid;
pub mod merge;
pub mod row;
pub mod ruleset;
pub mod session;
pub mod store;
pub mod validation;

pub use base::BaseDataset;
pub use merge::{resolve_section, EffectiveSection, ModLayer, Provenance};
pub use ruleset::{EffectiveData, Ruleset, RulesetError};
pub use session::{ModEditor, SaveReport};
pub use store::{ModEntry, ModManifest, ModStore, StoreError};
