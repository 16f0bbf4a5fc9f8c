//! Serde data file structs for game content definitions.
//!
//! These structs define the on-disk format for item chains, departments,
//! recipe specs, talents and tuning tables. They are deserialized from JSON
//! or RON data files and then resolved into catalog types by the loader.

use serde::Deserialize;

// ===========================================================================
// Items
// ===========================================================================

/// A mergeable item definition in a data file.
#[derive(Debug, Clone, Deserialize)]
pub struct ItemData {
    pub name: String,
    pub department: String,
    /// One-based tier as authored ("tier": 1 is the lowest).
    pub tier: u8,
    #[serde(default)]
    pub base_value: i64,
    /// Name of the item this one upgrades into when merged.
    #[serde(default)]
    pub upgrades_to: Option<String>,
}

// ===========================================================================
// Departments
// ===========================================================================

/// Per-tier drop weight, short tuple form: `(tier, weight)`.
pub type TierWeightData = (u8, f64);

/// A department crate configuration in a data file.
#[derive(Debug, Clone, Deserialize)]
pub struct DepartmentData {
    pub department: String,
    #[serde(default)]
    pub era: u32,
    #[serde(default)]
    pub crate_cost_soft: i64,
    #[serde(default)]
    pub crate_cost_premium: i64,
    #[serde(default = "default_crate_uses")]
    pub crate_uses: u32,
    #[serde(default)]
    pub drop_weights: Vec<TierWeightData>,
}

fn default_crate_uses() -> u32 {
    5
}

// ===========================================================================
// Recipe specs
// ===========================================================================

/// A movie recipe specification in a data file.
#[derive(Debug, Clone, Deserialize)]
pub struct RecipeSpecData {
    pub title: String,
    pub genre: String,
    pub required_departments: Vec<String>,
    #[serde(default)]
    pub bonus_departments: Vec<String>,
    pub base_money_reward: i64,
    pub base_fan_reward: i64,
    /// Base production time in seconds.
    pub duration: f64,
    #[serde(default)]
    pub time_penalty: f64,
    #[serde(default)]
    pub money_penalty: f64,
    #[serde(default)]
    pub fan_penalty: f64,
    #[serde(default)]
    pub allow_partial_talent: bool,
    #[serde(default)]
    pub grant_synergy_bonus: bool,
}

// ===========================================================================
// Talents
// ===========================================================================

/// A talent definition in a data file.
#[derive(Debug, Clone, Deserialize)]
pub struct TalentData {
    pub name: String,
    pub role: String,
    pub rarity: String,
    pub genre: String,
}

// ===========================================================================
// Tuning tables
// ===========================================================================

/// Synergy bonus fractions indexed by one-based tier.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SynergyData {
    #[serde(default)]
    pub tier_bonuses: Vec<f64>,
}

/// Dailies board tuning.
#[derive(Debug, Clone, Deserialize)]
pub struct DailiesData {
    pub starting_budget: i32,
    pub move_cost: i32,
    pub merge_savings: i32,
}

// ===========================================================================
// Top level
// ===========================================================================

/// The root of a catalog data file.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogData {
    #[serde(default)]
    pub items: Vec<ItemData>,
    #[serde(default)]
    pub departments: Vec<DepartmentData>,
    #[serde(default)]
    pub recipes: Vec<RecipeSpecData>,
    #[serde(default)]
    pub talents: Vec<TalentData>,
    #[serde(default)]
    pub synergy: SynergyData,
    #[serde(default)]
    pub dailies: Option<DailiesData>,
}
