//! Immutable content catalog: item upgrade chains, recipe specifications,
//! talent roster, department crate configs, the synergy bonus table and the
//! dailies rules.
//!
//! Three-phase lifecycle: register definitions on a [`CatalogBuilder`], link
//! upgrade chains, then [`CatalogBuilder::build`] validates every reference
//! and freezes the result. The engine only ever sees the frozen [`Catalog`];
//! runtime-mutable pieces (department eras, crate costs, drop weights) are
//! copied out at engine construction.

use crate::fixed::{Fixed64, Seconds};
use crate::id::{Department, Genre, ItemDefId, RecipeSpecId, TalentDefId, TalentRarity, TalentRole, Tier};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ---------------------------------------------------------------------------
// Definition types
// ---------------------------------------------------------------------------

/// One mergeable item definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemDef {
    /// Stable string id, also the persisted identifier in save files.
    pub name: String,
    pub department: Department,
    pub tier: Tier,
    /// Economy value; partial refunds are a fraction of this.
    pub base_value: i64,
    /// The definition this item upgrades into when merged, if any.
    pub next_tier: Option<ItemDefId>,
}

/// Per-tier drop weight for crate sampling. Negative weights are treated
/// as zero at draw time.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TierWeight {
    pub tier: Tier,
    pub weight: Fixed64,
}

/// Starting configuration for a department's crate economy. The engine
/// keeps a mutable copy; upgrades advance the era and scale costs/weights.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepartmentConfig {
    pub department: Department,
    pub era: u32,
    pub crate_cost_soft: i64,
    pub crate_cost_premium: i64,
    /// Uses a purchased crate of this department starts with.
    pub crate_uses: u32,
    pub drop_weights: Vec<TierWeight>,
}

/// A movie recipe specification: what must be submitted, what it pays,
/// how long it takes, and how missing optional departments penalize it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeSpec {
    pub title: String,
    pub genre: Genre,
    pub required_departments: Vec<Department>,
    pub bonus_departments: Vec<Department>,
    pub base_money_reward: i64,
    pub base_fan_reward: i64,
    pub base_duration: Seconds,
    /// Fractional duration increase per missing optional department.
    pub time_penalty: Fixed64,
    /// Fractional money reduction per missing optional department.
    pub money_penalty: Fixed64,
    /// Fractional fan reduction per missing optional department.
    pub fan_penalty: Fixed64,
    /// When false, all three talent slots must be filled to start.
    pub allow_partial_talent: bool,
    pub grant_synergy_bonus: bool,
}

/// Immutable base stats of a talent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TalentDef {
    pub name: String,
    pub role: TalentRole,
    pub rarity: TalentRarity,
    pub genre: Genre,
}

/// Bonus fractions indexed by one-based tier. Lookups clamp to the table
/// range; an empty table yields no bonus.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SynergyTable {
    pub tier_bonuses: Vec<Fixed64>,
}

impl SynergyTable {
    pub fn bonus_for_tier(&self, tier: u32) -> Fixed64 {
        if self.tier_bonuses.is_empty() {
            return Fixed64::ZERO;
        }
        let index = (tier.saturating_sub(1) as usize).min(self.tier_bonuses.len() - 1);
        self.tier_bonuses[index]
    }
}

/// Tuning for the dailies board minigame.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DailiesRules {
    pub starting_budget: i32,
    pub move_cost: i32,
    pub merge_savings: i32,
}

impl Default for DailiesRules {
    fn default() -> Self {
        Self {
            starting_budget: 100,
            move_cost: 5,
            merge_savings: 3,
        }
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("duplicate item name: {0}")]
    DuplicateItem(String),
    #[error("upgrade link {from} -> {to} crosses departments")]
    UpgradeCrossesDepartments { from: String, to: String },
    #[error("upgrade link {from} -> {to} must step up exactly one tier")]
    UpgradeTierMismatch { from: String, to: String },
    #[error("recipe spec {0} has no required departments")]
    EmptyRequiredDepartments(String),
}

/// Builder for constructing an immutable [`Catalog`].
#[derive(Debug, Default)]
pub struct CatalogBuilder {
    items: Vec<ItemDef>,
    item_name_to_id: HashMap<String, ItemDefId>,
    recipe_specs: Vec<RecipeSpec>,
    talents: Vec<TalentDef>,
    departments: Vec<DepartmentConfig>,
    synergy: SynergyTable,
    dailies: DailiesRules,
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an item definition. Returns its id. Upgrade links are added
    /// separately via [`link_upgrade`](Self::link_upgrade) once both ends
    /// exist.
    pub fn register_item(
        &mut self,
        name: &str,
        department: Department,
        tier: Tier,
        base_value: i64,
    ) -> Result<ItemDefId, CatalogError> {
        if self.item_name_to_id.contains_key(name) {
            return Err(CatalogError::DuplicateItem(name.to_string()));
        }
        let id = ItemDefId(self.items.len() as u32);
        self.items.push(ItemDef {
            name: name.to_string(),
            department,
            tier,
            base_value,
            next_tier: None,
        });
        self.item_name_to_id.insert(name.to_string(), id);
        Ok(id)
    }

    /// Link `lower` to upgrade into `upper` when merged.
    pub fn link_upgrade(&mut self, lower: &str, upper: &str) -> Result<(), CatalogError> {
        let from = self
            .item_name_to_id
            .get(lower)
            .copied()
            .ok_or_else(|| CatalogError::NotFound(lower.to_string()))?;
        let to = self
            .item_name_to_id
            .get(upper)
            .copied()
            .ok_or_else(|| CatalogError::NotFound(upper.to_string()))?;
        self.items[from.0 as usize].next_tier = Some(to);
        Ok(())
    }

    pub fn register_recipe_spec(&mut self, spec: RecipeSpec) -> RecipeSpecId {
        let id = RecipeSpecId(self.recipe_specs.len() as u32);
        self.recipe_specs.push(spec);
        id
    }

    pub fn register_talent(&mut self, def: TalentDef) -> TalentDefId {
        let id = TalentDefId(self.talents.len() as u32);
        self.talents.push(def);
        id
    }

    pub fn set_department_config(&mut self, config: DepartmentConfig) {
        if let Some(existing) = self
            .departments
            .iter_mut()
            .find(|c| c.department == config.department)
        {
            *existing = config;
        } else {
            self.departments.push(config);
        }
    }

    pub fn set_synergy_table(&mut self, table: SynergyTable) {
        self.synergy = table;
    }

    pub fn set_dailies_rules(&mut self, rules: DailiesRules) {
        self.dailies = rules;
    }

    pub fn item_id(&self, name: &str) -> Option<ItemDefId> {
        self.item_name_to_id.get(name).copied()
    }

    /// Validate every cross-reference and freeze the catalog.
    pub fn build(self) -> Result<Catalog, CatalogError> {
        for item in &self.items {
            if let Some(next) = item.next_tier {
                let target = &self.items[next.0 as usize];
                if target.department != item.department {
                    return Err(CatalogError::UpgradeCrossesDepartments {
                        from: item.name.clone(),
                        to: target.name.clone(),
                    });
                }
                if target.tier != item.tier.next() {
                    return Err(CatalogError::UpgradeTierMismatch {
                        from: item.name.clone(),
                        to: target.name.clone(),
                    });
                }
            }
        }
        for spec in &self.recipe_specs {
            if spec.required_departments.is_empty() {
                return Err(CatalogError::EmptyRequiredDepartments(spec.title.clone()));
            }
        }

        // Index items by (department, tier) for crate pools and spawn lookups.
        let mut by_dept_tier: HashMap<(Department, Tier), Vec<ItemDefId>> = HashMap::new();
        for (index, item) in self.items.iter().enumerate() {
            by_dept_tier
                .entry((item.department, item.tier))
                .or_default()
                .push(ItemDefId(index as u32));
        }

        Ok(Catalog {
            items: self.items,
            item_name_to_id: self.item_name_to_id,
            by_dept_tier,
            recipe_specs: self.recipe_specs,
            talents: self.talents,
            departments: self.departments,
            synergy: self.synergy,
            dailies: self.dailies,
        })
    }
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// Immutable catalog. Frozen after build; read-only from then on.
#[derive(Debug)]
pub struct Catalog {
    items: Vec<ItemDef>,
    item_name_to_id: HashMap<String, ItemDefId>,
    by_dept_tier: HashMap<(Department, Tier), Vec<ItemDefId>>,
    recipe_specs: Vec<RecipeSpec>,
    talents: Vec<TalentDef>,
    departments: Vec<DepartmentConfig>,
    synergy: SynergyTable,
    dailies: DailiesRules,
}

impl Catalog {
    pub fn item(&self, id: ItemDefId) -> Option<&ItemDef> {
        self.items.get(id.0 as usize)
    }

    pub fn item_id(&self, name: &str) -> Option<ItemDefId> {
        self.item_name_to_id.get(name).copied()
    }

    /// Items matching a department and tier. A miss returns an empty slice,
    /// never an error; callers degrade gracefully.
    pub fn items_for(&self, department: Department, tier: Tier) -> &[ItemDefId] {
        self.by_dept_tier
            .get(&(department, tier))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn recipe_spec(&self, id: RecipeSpecId) -> Option<&RecipeSpec> {
        self.recipe_specs.get(id.0 as usize)
    }

    pub fn recipe_spec_count(&self) -> usize {
        self.recipe_specs.len()
    }

    pub fn talent_def(&self, id: TalentDefId) -> Option<&TalentDef> {
        self.talents.get(id.0 as usize)
    }

    pub fn talent_defs(&self) -> impl Iterator<Item = (TalentDefId, &TalentDef)> {
        self.talents
            .iter()
            .enumerate()
            .map(|(i, def)| (TalentDefId(i as u32), def))
    }

    /// Starting department configs, copied by the spawn engine at startup.
    pub fn department_configs(&self) -> &[DepartmentConfig] {
        &self.departments
    }

    pub fn synergy(&self) -> &SynergyTable {
        &self.synergy
    }

    pub fn dailies_rules(&self) -> DailiesRules {
        self.dailies
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }
}
