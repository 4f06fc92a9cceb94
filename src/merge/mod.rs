//! Layer merging
//!
//! Turns the base dataset plus an ordered set of mod layers into effective
//! section rows and house-rule values.

pub mod cache;
pub mod house_rules;
pub mod layer;
pub mod resolver;

pub use cache::{ResolveCache, ResolveKey};
pub use house_rules::{explain_house_rule, resolve_house_rule, HouseRuleResolution, RuleSource};
pub use layer::{ordered_layers, ModLayer};
pub use resolver::{resolve_section, EffectiveSection, Provenance, ResolvedRow};
