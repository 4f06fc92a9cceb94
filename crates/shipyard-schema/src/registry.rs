//! Section catalogue
//!
//! The declarative table of every editable section and house rule. Lookups
//! are by section id, by (file id, root key), or by file id.

use std::collections::BTreeSet;

use crate::field::FieldDef;
use crate::section::{HouseRule, MergeMode, SectionSchema, Shape};

const SHIP_CLASSES: &[&str] = &["small_craft", "light", "medium", "heavy", "super_heavy"];

const TECH_TRACKS: &[&str] = &["G", "D", "A", "X", "I", "Q"];

const MOUNT_TYPES: &[&str] = &["standard", "fixed", "turret", "sponson", "bank"];

const FIRING_ARCS: &[&str] = &["forward", "aft", "port", "starboard", "dorsal", "ventral"];

const ID: FieldDef = FieldDef::text("id", "ID").required();
const NAME: FieldDef = FieldDef::text("name", "Name").required();
const PROGRESS_LEVEL: FieldDef = FieldDef::number("progressLevel", "Progress level")
    .required()
    .range(5.0, 9.0);
const TECH: FieldDef = FieldDef::multi_select("techTracks", "Tech tracks", TECH_TRACKS);
const HULL_POINTS: FieldDef = FieldDef::number("hullPoints", "Hull points").min(0.0);
const POWER_REQUIRED: FieldDef = FieldDef::number("powerRequired", "Power required").min(0.0);
const COST: FieldDef = FieldDef::number("cost", "Cost (K)").min(0.0);
const DESCRIPTION: FieldDef = FieldDef::text("description", "Description");

const DAMAGE_TRACK: [FieldDef; 4] = [
    FieldDef::number("damageTrack.stun", "Stun").required().min(0.0),
    FieldDef::number("damageTrack.wound", "Wound").required().min(0.0),
    FieldDef::number("damageTrack.mortal", "Mortal").required().min(0.0),
    FieldDef::number("damageTrack.critical", "Critical").required().min(0.0),
];

const HULL_FIELDS: &[FieldDef] = &[
    ID,
    NAME,
    FieldDef::single_select("shipClass", "Ship class", SHIP_CLASSES).required(),
    FieldDef::single_select("category", "Category", &["military", "civilian", "both"]),
    FieldDef::number("hullPoints", "Hull points").required().range(1.0, 4000.0),
    FieldDef::scale_level("toughness", "Toughness").required(),
    DAMAGE_TRACK[0],
    DAMAGE_TRACK[1],
    DAMAGE_TRACK[2],
    DAMAGE_TRACK[3],
    FieldDef::number("targetModifier", "Target modifier").range(-3.0, 3.0),
    FieldDef::number("maneuverability", "Maneuverability").range(-5.0, 5.0),
    FieldDef::number("crew.minimum", "Minimum crew").min(0.0),
    FieldDef::number("crew.maximum", "Maximum crew").min(0.0),
    COST,
    DESCRIPTION,
];

const STATION_HULL_FIELDS: &[FieldDef] = &[
    ID,
    NAME,
    FieldDef::number("hullPoints", "Hull points").required().range(1.0, 100000.0),
    FieldDef::scale_level("toughness", "Toughness").required(),
    DAMAGE_TRACK[0],
    DAMAGE_TRACK[1],
    DAMAGE_TRACK[2],
    DAMAGE_TRACK[3],
    FieldDef::number("dockingBays", "Docking bays").min(0.0),
    COST,
    DESCRIPTION,
];

const SIZE_CATEGORY_FIELDS: &[FieldDef] = &[
    ID,
    FieldDef::number("minHullPoints", "Minimum hull points").required().min(0.0),
    FieldDef::number("maxHullPoints", "Maximum hull points").required().min(0.0),
    FieldDef::number("targetModifier", "Target modifier").range(-3.0, 3.0),
    FieldDef::scale_level("defaultToughness", "Default toughness"),
];

const ARMOR_FIELDS: &[FieldDef] = &[
    ID,
    NAME,
    PROGRESS_LEVEL,
    TECH,
    FieldDef::single_select("armorWeight", "Weight", &["light", "medium", "heavy", "super_heavy"])
        .required(),
    FieldDef::text("protection.li", "Protection (LI)").required(),
    FieldDef::text("protection.hi", "Protection (HI)").required(),
    FieldDef::text("protection.en", "Protection (En)").required(),
    FieldDef::number("hullPercentage", "Hull %").range(0.0, 100.0),
    FieldDef::number("costPerHullPoint", "Cost per HP").min(0.0),
    DESCRIPTION,
];

const ARMOR_WEIGHT_FIELDS: &[FieldDef] = &[
    ID,
    NAME,
    FieldDef::single_select("minShipClass", "Smallest ship class", SHIP_CLASSES).required(),
    FieldDef::number("hullPercentMultiplier", "Hull % multiplier").min(0.0),
];

const POWER_PLANT_FIELDS: &[FieldDef] = &[
    ID,
    NAME,
    PROGRESS_LEVEL,
    TECH,
    FieldDef::number("powerPerHullPoint", "Power per HP").required().min(0.0),
    FieldDef::number("minSize", "Minimum size").min(0.0),
    FieldDef::number("baseCost", "Base cost").min(0.0),
    FieldDef::number("costPerHullPoint", "Cost per HP").min(0.0),
    FieldDef::boolean("requiresFuel", "Requires fuel"),
    FieldDef::multi_select("fuelTypes", "Fuel types", &["chemical", "fission", "fusion", "antimatter"]),
    DESCRIPTION,
];

const ENGINE_FIELDS: &[FieldDef] = &[
    ID,
    NAME,
    PROGRESS_LEVEL,
    TECH,
    FieldDef::number("powerPerHullPoint", "Power per HP").min(0.0),
    FieldDef::number("minSize", "Minimum size").min(0.0),
    FieldDef::number("baseCost", "Base cost").min(0.0),
    FieldDef::number("costPerHullPoint", "Cost per HP").min(0.0),
    FieldDef::raw("accelerationTable", "Acceleration by hull %"),
    FieldDef::boolean("atmosphereCapable", "Atmosphere capable"),
    DESCRIPTION,
];

const FTL_DRIVE_FIELDS: &[FieldDef] = &[
    ID,
    NAME,
    PROGRESS_LEVEL,
    TECH,
    FieldDef::single_select("driveType", "Drive type", &["jump", "warp", "hyperdrive", "gate"])
        .required(),
    FieldDef::number("hullPercentage", "Hull %").range(0.0, 100.0),
    POWER_REQUIRED,
    FieldDef::number("baseCost", "Base cost").min(0.0),
    FieldDef::tagged_list("performance", "Performance"),
    DESCRIPTION,
];

const WEAPON_FIELDS: &[FieldDef] = &[
    ID,
    NAME,
    PROGRESS_LEVEL,
    TECH,
    FieldDef::single_select(
        "category",
        "Category",
        &["beam", "projectile", "torpedo", "missile", "special"],
    )
    .required(),
    FieldDef::scale_level("firepower", "Firepower").required(),
    FieldDef::number("accuracy", "Accuracy").range(-3.0, 3.0),
    FieldDef::text("damage.ordinary", "Damage (O)"),
    FieldDef::text("damage.good", "Damage (G)"),
    FieldDef::text("damage.amazing", "Damage (A)"),
    FieldDef::number("range.short", "Short range").min(0.0),
    FieldDef::number("range.medium", "Medium range").min(0.0),
    FieldDef::number("range.long", "Long range").min(0.0),
    HULL_POINTS,
    POWER_REQUIRED,
    COST,
    FieldDef::multi_select("mountTypes", "Allowed mounts", MOUNT_TYPES),
    FieldDef::tagged_list("traits", "Traits"),
    DESCRIPTION,
];

const MOUNT_MODIFIER_FIELDS: &[FieldDef] = &[
    ID,
    FieldDef::number("costMultiplier", "Cost multiplier").required().min(0.0),
    FieldDef::number("hullPointMultiplier", "HP multiplier").required().min(0.0),
    FieldDef::multi_select("arcs", "Firing arcs", FIRING_ARCS),
    DESCRIPTION,
];

const DEFENSE_FIELDS: &[FieldDef] = &[
    ID,
    NAME,
    PROGRESS_LEVEL,
    TECH,
    FieldDef::single_select(
        "type",
        "Type",
        &["shield", "screen", "countermeasure", "point_defense"],
    )
    .required(),
    FieldDef::number("hullPercentage", "Hull %").range(0.0, 100.0),
    POWER_REQUIRED,
    COST,
    FieldDef::text("effect", "Effect"),
    DESCRIPTION,
];

const SENSOR_FIELDS: &[FieldDef] = &[
    ID,
    NAME,
    PROGRESS_LEVEL,
    TECH,
    FieldDef::single_select("category", "Category", &["active", "passive", "specialty"]).required(),
    FieldDef::number("range", "Range (Mm)").min(0.0),
    FieldDef::number("accuracyModifier", "Accuracy modifier").range(-3.0, 3.0),
    HULL_POINTS,
    POWER_REQUIRED,
    COST,
    DESCRIPTION,
];

const COMMAND_CONTROL_FIELDS: &[FieldDef] = &[
    ID,
    NAME,
    PROGRESS_LEVEL,
    FieldDef::single_select(
        "category",
        "Category",
        &["command", "computer", "communications"],
    )
    .required(),
    FieldDef::boolean("isRequired", "Required on every ship"),
    HULL_POINTS,
    POWER_REQUIRED,
    COST,
    DESCRIPTION,
];

const SUPPORT_SYSTEM_FIELDS: &[FieldDef] = &[
    ID,
    NAME,
    PROGRESS_LEVEL,
    FieldDef::single_select(
        "category",
        "Category",
        &["accommodation", "life_support", "store"],
    )
    .required(),
    FieldDef::number("crewCapacity", "Crew capacity").min(0.0),
    HULL_POINTS,
    POWER_REQUIRED,
    COST,
    DESCRIPTION,
];

const DESIGN_RULE_FIELDS: &[FieldDef] = &[
    FieldDef::text("currencySymbol", "Currency symbol"),
    FieldDef::number("defaultProgressLevel", "Default progress level")
        .required()
        .range(5.0, 9.0),
    FieldDef::number("costMultiplier", "Global cost multiplier").min(0.0),
    FieldDef::number("powerMargin.minimumPercent", "Minimum power margin %").range(0.0, 100.0),
    FieldDef::number("powerMargin.warnPercent", "Warn below power margin %").range(0.0, 100.0),
];

static SECTIONS: &[SectionSchema] = &[
    SectionSchema {
        id: "hulls",
        label: "Hulls",
        file_id: "hulls",
        root_key: "hulls",
        shape: Shape::Array,
        fields: HULL_FIELDS,
        new_item_template: r#"{"id": "new_hull", "name": "New Hull", "shipClass": "light", "hullPoints": 20, "toughness": "light", "damageTrack": {"stun": 10, "wound": 10, "mortal": 5, "critical": 3}, "cost": 0}"#,
        default_merge_mode: MergeMode::Add,
    },
    SectionSchema {
        id: "stationHulls",
        label: "Station hulls",
        file_id: "hulls",
        root_key: "stationHulls",
        shape: Shape::Array,
        fields: STATION_HULL_FIELDS,
        new_item_template: r#"{"id": "new_station", "name": "New Station", "hullPoints": 500, "toughness": "heavy", "damageTrack": {"stun": 100, "wound": 100, "mortal": 50, "critical": 25}, "cost": 0}"#,
        default_merge_mode: MergeMode::Add,
    },
    SectionSchema {
        id: "sizeCategories",
        label: "Size categories",
        file_id: "hulls",
        root_key: "sizeCategories",
        shape: Shape::Record,
        fields: SIZE_CATEGORY_FIELDS,
        new_item_template: r#"{"id": "new_category", "minHullPoints": 0, "maxHullPoints": 0, "targetModifier": 0}"#,
        default_merge_mode: MergeMode::Add,
    },
    SectionSchema {
        id: "armors",
        label: "Armor",
        file_id: "armor",
        root_key: "armors",
        shape: Shape::Array,
        fields: ARMOR_FIELDS,
        new_item_template: r#"{"id": "new_armor", "name": "New Armor", "progressLevel": 6, "armorWeight": "light", "protection": {"li": "d4", "hi": "d4", "en": "d4"}, "hullPercentage": 5, "costPerHullPoint": 1}"#,
        default_merge_mode: MergeMode::Add,
    },
    SectionSchema {
        id: "armorWeights",
        label: "Armor weights",
        file_id: "armor",
        root_key: "armorWeights",
        shape: Shape::Array,
        fields: ARMOR_WEIGHT_FIELDS,
        new_item_template: r#"{"id": "new_weight", "name": "New Weight", "minShipClass": "small_craft", "hullPercentMultiplier": 1}"#,
        default_merge_mode: MergeMode::Add,
    },
    SectionSchema {
        id: "powerPlants",
        label: "Power plants",
        file_id: "powerPlants",
        root_key: "powerPlants",
        shape: Shape::Array,
        fields: POWER_PLANT_FIELDS,
        new_item_template: r#"{"id": "new_power_plant", "name": "New Power Plant", "progressLevel": 6, "powerPerHullPoint": 1, "baseCost": 0, "costPerHullPoint": 1, "requiresFuel": false}"#,
        default_merge_mode: MergeMode::Add,
    },
    SectionSchema {
        id: "engines",
        label: "Engines",
        file_id: "engines",
        root_key: "engines",
        shape: Shape::Array,
        fields: ENGINE_FIELDS,
        new_item_template: r#"{"id": "new_engine", "name": "New Engine", "progressLevel": 6, "powerPerHullPoint": 1, "baseCost": 0, "costPerHullPoint": 1, "accelerationTable": {"5": 1, "10": 2}}"#,
        default_merge_mode: MergeMode::Add,
    },
    SectionSchema {
        id: "ftlDrives",
        label: "FTL drives",
        file_id: "ftlDrives",
        root_key: "ftlDrives",
        shape: Shape::Array,
        fields: FTL_DRIVE_FIELDS,
        new_item_template: r#"{"id": "new_drive", "name": "New Drive", "progressLevel": 7, "driveType": "jump", "hullPercentage": 10, "baseCost": 0, "performance": []}"#,
        default_merge_mode: MergeMode::Add,
    },
    SectionSchema {
        id: "weapons",
        label: "Weapons",
        file_id: "weapons",
        root_key: "weapons",
        shape: Shape::Array,
        fields: WEAPON_FIELDS,
        new_item_template: r#"{"id": "new_weapon", "name": "New Weapon", "progressLevel": 6, "category": "beam", "firepower": "light", "accuracy": 0, "damage": {"ordinary": "d4w", "good": "d6w", "amazing": "d4m"}, "hullPoints": 1, "powerRequired": 1, "cost": 0, "mountTypes": ["standard"]}"#,
        default_merge_mode: MergeMode::Add,
    },
    SectionSchema {
        id: "mountModifiers",
        label: "Mount modifiers",
        file_id: "weapons",
        root_key: "mountModifiers",
        shape: Shape::Record,
        fields: MOUNT_MODIFIER_FIELDS,
        new_item_template: r#"{"id": "new_mount", "costMultiplier": 1, "hullPointMultiplier": 1, "arcs": ["forward"]}"#,
        default_merge_mode: MergeMode::Add,
    },
    SectionSchema {
        id: "defenses",
        label: "Defenses",
        file_id: "defenses",
        root_key: "defenses",
        shape: Shape::Array,
        fields: DEFENSE_FIELDS,
        new_item_template: r#"{"id": "new_defense", "name": "New Defense", "progressLevel": 6, "type": "screen", "hullPercentage": 5, "powerRequired": 1, "cost": 0}"#,
        default_merge_mode: MergeMode::Add,
    },
    SectionSchema {
        id: "sensors",
        label: "Sensors",
        file_id: "sensors",
        root_key: "sensors",
        shape: Shape::Array,
        fields: SENSOR_FIELDS,
        new_item_template: r#"{"id": "new_sensor", "name": "New Sensor", "progressLevel": 6, "category": "active", "range": 1, "hullPoints": 1, "powerRequired": 1, "cost": 0}"#,
        default_merge_mode: MergeMode::Add,
    },
    SectionSchema {
        id: "commandControl",
        label: "Command & control",
        file_id: "commandControl",
        root_key: "commandControl",
        shape: Shape::Array,
        fields: COMMAND_CONTROL_FIELDS,
        new_item_template: r#"{"id": "new_system", "name": "New System", "progressLevel": 6, "category": "computer", "isRequired": false, "hullPoints": 1, "powerRequired": 1, "cost": 0}"#,
        default_merge_mode: MergeMode::Add,
    },
    SectionSchema {
        id: "supportSystems",
        label: "Support systems",
        file_id: "supportSystems",
        root_key: "supportSystems",
        shape: Shape::Array,
        fields: SUPPORT_SYSTEM_FIELDS,
        new_item_template: r#"{"id": "new_support", "name": "New Support System", "progressLevel": 6, "category": "accommodation", "crewCapacity": 1, "hullPoints": 1, "powerRequired": 0, "cost": 0}"#,
        default_merge_mode: MergeMode::Add,
    },
    SectionSchema {
        id: "designRules",
        label: "Design rules",
        file_id: "settings",
        root_key: "designRules",
        shape: Shape::Object,
        fields: DESIGN_RULE_FIELDS,
        new_item_template: r#"{"currencySymbol": "Cr", "defaultProgressLevel": 6, "costMultiplier": 1, "powerMargin": {"minimumPercent": 0, "warnPercent": 10}}"#,
        default_merge_mode: MergeMode::Add,
    },
];

static HOUSE_RULES: &[HouseRule] = &[
    HouseRule {
        id: "multipleArmorLayers",
        label: "Allow more than one armor layer",
        file_id: "armor",
        json_key: "allowMultipleArmorLayers",
        default_value: false,
    },
    HouseRule {
        id: "enforceFiringArcs",
        label: "Restrict weapons to their mount arcs",
        file_id: "weapons",
        json_key: "enforceFiringArcs",
        default_value: true,
    },
    HouseRule {
        id: "defensesDrawPower",
        label: "Defenses draw power",
        file_id: "defenses",
        json_key: "defensesDrawPower",
        default_value: true,
    },
    HouseRule {
        id: "trackFtlFuel",
        label: "Track FTL fuel",
        file_id: "ftlDrives",
        json_key: "trackFtlFuel",
        default_value: false,
    },
    HouseRule {
        id: "allowPowerOverload",
        label: "Allow power plant overload",
        file_id: "powerPlants",
        json_key: "allowPowerOverload",
        default_value: false,
    },
];

/// All sections in display order
pub fn sections() -> &'static [SectionSchema] {
    SECTIONS
}

/// Find a section by id
pub fn section(id: &str) -> Option<&'static SectionSchema> {
    SECTIONS.iter().find(|s| s.id == id)
}

/// Find the section stored at `root_key` inside `file_id`
pub fn section_by_root_key(file_id: &str, root_key: &str) -> Option<&'static SectionSchema> {
    SECTIONS
        .iter()
        .find(|s| s.file_id == file_id && s.root_key == root_key)
}

/// Sections stored in one data file
pub fn sections_for_file(file_id: &str) -> impl Iterator<Item = &'static SectionSchema> + '_ {
    SECTIONS.iter().filter(move |s| s.file_id == file_id)
}

/// All house rules
pub fn house_rules() -> &'static [HouseRule] {
    HOUSE_RULES
}

/// Find a house rule by id
pub fn house_rule(id: &str) -> Option<&'static HouseRule> {
    HOUSE_RULES.iter().find(|r| r.id == id)
}

/// House rules stored in one data file
pub fn house_rules_for_file(file_id: &str) -> impl Iterator<Item = &'static HouseRule> + '_ {
    HOUSE_RULES.iter().filter(move |r| r.file_id == file_id)
}

/// Every data file id referenced by a section or house rule, sorted
pub fn data_file_ids() -> BTreeSet<&'static str> {
    SECTIONS
        .iter()
        .map(|s| s.file_id)
        .chain(HOUSE_RULES.iter().map(|r| r.file_id))
        .collect()
}
