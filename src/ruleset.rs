//! The effective ruleset consumers read
//!
//! Ship-building code sees only [`EffectiveData`]: effective rows per section
//! and resolved house-rule values. Everything else stays behind it.

use std::cell::RefCell;
use std::path::Path;

use crate::base::{BaseDataError, BaseDataset};
use crate::merge::{
    explain_house_rule, EffectiveSection, HouseRuleResolution, ModLayer, ResolveCache,
};
use crate::store::{ModStore, StoreError};

/// Errors from the consumer read interface
#[derive(Debug, thiserror::Error)]
pub enum RulesetError {
    #[error("Unknown section: {0}")]
    UnknownSection(String),

    #[error("Unknown house rule: {0}")]
    UnknownRule(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Base data error: {0}")]
    Base(#[from] BaseDataError),
}

/// Read-only access to resolved game data
pub trait EffectiveData {
    fn effective_section(&self, section_id: &str) -> Result<EffectiveSection, RulesetError>;

    fn house_rule_value(&self, rule_id: &str) -> Result<bool, RulesetError>;
}

/// Base dataset plus a snapshot of every mod layer
#[derive(Debug)]
pub struct Ruleset {
    base: BaseDataset,
    layers: Vec<ModLayer>,
    cache: RefCell<ResolveCache>,
}

impl Ruleset {
    pub fn new(base: BaseDataset, layers: Vec<ModLayer>) -> Self {
        Self {
            base,
            layers,
            cache: RefCell::new(ResolveCache::new()),
        }
    }

    /// Load the base directory and every mod of `store`
    pub fn load(store: &ModStore, base_dir: &Path) -> Result<Self, RulesetError> {
        let base = BaseDataset::load(base_dir)?;
        let layers = store.load_layers()?;
        tracing::info!(
            mods = layers.len(),
            enabled = layers.iter().filter(|l| l.enabled).count(),
            "loaded ruleset"
        );
        Ok(Self::new(base, layers))
    }

    pub fn base(&self) -> &BaseDataset {
        &self.base
    }

    pub fn layers(&self) -> &[ModLayer] {
        &self.layers
    }

    /// Swap in a fresh snapshot of mod layers. Cached sections resolved
    /// from the same layers stay; the rest are evicted.
    pub fn replace_layers(&mut self, layers: Vec<ModLayer>) {
        self.cache.get_mut().retain_layers(&layers);
        self.layers = layers;
    }

    pub fn explain_house_rule(&self, rule_id: &str) -> Result<HouseRuleResolution, RulesetError> {
        let rule = shipyard_schema::house_rule(rule_id)
            .ok_or_else(|| RulesetError::UnknownRule(rule_id.to_string()))?;
        Ok(explain_house_rule(rule, &self.layers))
    }

    /// Every house rule, in registry order
    pub fn house_rules(&self) -> Vec<HouseRuleResolution> {
        shipyard_schema::house_rules()
            .iter()
            .map(|rule| explain_house_rule(rule, &self.layers))
            .collect()
    }

    pub fn cache_stats(&self) -> (u64, u64) {
        let cache = self.cache.borrow();
        (cache.hits(), cache.misses())
    }
}

impl EffectiveData for Ruleset {
    fn effective_section(&self, section_id: &str) -> Result<EffectiveSection, RulesetError> {
        let schema = shipyard_schema::section(section_id)
            .ok_or_else(|| RulesetError::UnknownSection(section_id.to_string()))?;
        Ok(self
            .cache
            .borrow_mut()
            .resolve(schema, &self.base, &self.layers))
    }

    fn house_rule_value(&self, rule_id: &str) -> Result<bool, RulesetError> {
        self.explain_house_rule(rule_id).map(|r| r.value)
    }
}
