//! Resolves deserialized data files into a frozen catalog.
//!
//! Enum-like fields (departments, genres, roles, rarities) are authored as
//! strings and resolved here; a bad reference is a load error, not a
//! runtime surprise.

use crate::schema::{CatalogData, DepartmentData, ItemData, RecipeSpecData, TalentData};
use backlot_core::catalog::{
    Catalog, CatalogBuilder, CatalogError, DailiesRules, DepartmentConfig, RecipeSpec,
    SynergyTable, TalentDef, TierWeight,
};
use backlot_core::fixed::{Fixed64, Seconds};
use backlot_core::id::{Department, Genre, TalentRarity, TalentRole, Tier};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
    #[error("RON parse error: {0}")]
    RonParse(#[from] ron::error::SpannedError),
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),
    #[error("unknown department: {0}")]
    UnknownDepartment(String),
    #[error("unknown genre: {0}")]
    UnknownGenre(String),
    #[error("unknown talent role: {0}")]
    UnknownRole(String),
    #[error("unknown talent rarity: {0}")]
    UnknownRarity(String),
    #[error("item {0} has tier 0; tiers are authored one-based")]
    ZeroTier(String),
}

// ---------------------------------------------------------------------------
// Loading functions
// ---------------------------------------------------------------------------

/// Load a catalog from a JSON string.
pub fn load_catalog_json(json: &str) -> Result<Catalog, DataLoadError> {
    let data: CatalogData = serde_json::from_str(json)?;
    build_catalog(data)
}

/// Load a catalog from a RON string.
pub fn load_catalog_ron(ron_text: &str) -> Result<Catalog, DataLoadError> {
    let data: CatalogData = ron::from_str(ron_text)?;
    build_catalog(data)
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

fn parse_department(name: &str) -> Result<Department, DataLoadError> {
    Department::from_str(name).ok_or_else(|| DataLoadError::UnknownDepartment(name.to_string()))
}

fn parse_genre(name: &str) -> Result<Genre, DataLoadError> {
    match name {
        "Action" => Ok(Genre::Action),
        "Comedy" => Ok(Genre::Comedy),
        "Drama" => Ok(Genre::Drama),
        "Horror" => Ok(Genre::Horror),
        "Romance" => Ok(Genre::Romance),
        "SciFi" => Ok(Genre::SciFi),
        other => Err(DataLoadError::UnknownGenre(other.to_string())),
    }
}

fn parse_role(name: &str) -> Result<TalentRole, DataLoadError> {
    match name {
        "Writer" => Ok(TalentRole::Writer),
        "Director" => Ok(TalentRole::Director),
        "Actor" => Ok(TalentRole::Actor),
        other => Err(DataLoadError::UnknownRole(other.to_string())),
    }
}

fn parse_rarity(name: &str) -> Result<TalentRarity, DataLoadError> {
    match name {
        "AList" => Ok(TalentRarity::AList),
        "BList" => Ok(TalentRarity::BList),
        "CList" => Ok(TalentRarity::CList),
        "DList" => Ok(TalentRarity::DList),
        other => Err(DataLoadError::UnknownRarity(other.to_string())),
    }
}

/// Authored tiers are one-based; the catalog is zero-based.
fn parse_tier(item_name: &str, tier: u8) -> Result<Tier, DataLoadError> {
    if tier == 0 {
        return Err(DataLoadError::ZeroTier(item_name.to_string()));
    }
    Ok(Tier(tier - 1))
}

fn resolve_item(builder: &mut CatalogBuilder, item: &ItemData) -> Result<(), DataLoadError> {
    let department = parse_department(&item.department)?;
    let tier = parse_tier(&item.name, item.tier)?;
    builder.register_item(&item.name, department, tier, item.base_value)?;
    Ok(())
}

fn resolve_department(dept: &DepartmentData) -> Result<DepartmentConfig, DataLoadError> {
    Ok(DepartmentConfig {
        department: parse_department(&dept.department)?,
        era: dept.era,
        crate_cost_soft: dept.crate_cost_soft,
        crate_cost_premium: dept.crate_cost_premium,
        crate_uses: dept.crate_uses,
        drop_weights: dept
            .drop_weights
            .iter()
            .map(|(tier, weight)| TierWeight {
                tier: Tier(tier.saturating_sub(1)),
                weight: Fixed64::from_num(*weight),
            })
            .collect(),
    })
}

fn resolve_recipe(recipe: &RecipeSpecData) -> Result<RecipeSpec, DataLoadError> {
    Ok(RecipeSpec {
        title: recipe.title.clone(),
        genre: parse_genre(&recipe.genre)?,
        required_departments: recipe
            .required_departments
            .iter()
            .map(|d| parse_department(d))
            .collect::<Result<_, _>>()?,
        bonus_departments: recipe
            .bonus_departments
            .iter()
            .map(|d| parse_department(d))
            .collect::<Result<_, _>>()?,
        base_money_reward: recipe.base_money_reward,
        base_fan_reward: recipe.base_fan_reward,
        base_duration: Seconds::from_num(recipe.duration),
        time_penalty: Fixed64::from_num(recipe.time_penalty),
        money_penalty: Fixed64::from_num(recipe.money_penalty),
        fan_penalty: Fixed64::from_num(recipe.fan_penalty),
        allow_partial_talent: recipe.allow_partial_talent,
        grant_synergy_bonus: recipe.grant_synergy_bonus,
    })
}

fn resolve_talent(talent: &TalentData) -> Result<TalentDef, DataLoadError> {
    Ok(TalentDef {
        name: talent.name.clone(),
        role: parse_role(&talent.role)?,
        rarity: parse_rarity(&talent.rarity)?,
        genre: parse_genre(&talent.genre)?,
    })
}

fn build_catalog(data: CatalogData) -> Result<Catalog, DataLoadError> {
    let mut builder = CatalogBuilder::new();

    // Phase 1: register all items, then link chains (targets must exist).
    for item in &data.items {
        resolve_item(&mut builder, item)?;
    }
    for item in &data.items {
        if let Some(upper) = &item.upgrades_to {
            builder.link_upgrade(&item.name, upper)?;
        }
    }

    // Phase 2: departments, recipes, talents.
    for dept in &data.departments {
        builder.set_department_config(resolve_department(dept)?);
    }
    for recipe in &data.recipes {
        builder.register_recipe_spec(resolve_recipe(recipe)?);
    }
    for talent in &data.talents {
        builder.register_talent(resolve_talent(talent)?);
    }

    // Phase 3: tuning tables.
    builder.set_synergy_table(SynergyTable {
        tier_bonuses: data
            .synergy
            .tier_bonuses
            .iter()
            .map(|b| Fixed64::from_num(*b))
            .collect(),
    });
    if let Some(dailies) = &data.dailies {
        builder.set_dailies_rules(DailiesRules {
            starting_budget: dailies.starting_budget,
            move_cost: dailies.move_cost,
            merge_savings: dailies.merge_savings,
        });
    }

    Ok(builder.build()?)
}

// ===========================================================================
// Tests
// ===========================================================================
