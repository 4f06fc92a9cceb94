//! House-rule resolution
//!
//! A rule is a boolean stored at the top level of a data file. Each enabled
//! mod may set it explicitly or leave it unset; the last explicit value in
//! ascending priority wins, else the rule's default.

use serde::Serialize;

use shipyard_schema::HouseRule;

use super::layer::{ordered_layers, ModLayer};

/// Who decided a house rule's value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum RuleSource {
    Default,
    Mod { folder_id: String },
}

/// Resolved value plus its source
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HouseRuleResolution {
    pub rule_id: &'static str,
    pub value: bool,
    pub source: RuleSource,
}

pub fn resolve_house_rule(rule: &HouseRule, layers: &[ModLayer]) -> bool {
    explain_house_rule(rule, layers).value
}

/// Like [`resolve_house_rule`] but reports which mod, if any, decided it
pub fn explain_house_rule(rule: &HouseRule, layers: &[ModLayer]) -> HouseRuleResolution {
    let winner = ordered_layers(layers)
        .into_iter()
        .filter_map(|layer| layer.house_rule(rule).map(|v| (layer, v)))
        .last();

    match winner {
        Some((layer, value)) => HouseRuleResolution {
            rule_id: rule.id,
            value,
            source: RuleSource::Mod {
                folder_id: layer.folder_id.clone(),
            },
        },
        None => HouseRuleResolution {
            rule_id: rule.id,
            value: rule.default_value,
            source: RuleSource::Default,
        },
    }
}
