//! Shared test helpers for integration tests and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so these helpers
//! are available in unit tests, integration tests, and benches (via the
//! `test-utils` feature).

use crate::catalog::{
    Catalog, CatalogBuilder, DailiesRules, DepartmentConfig, RecipeSpec, SynergyTable, TalentDef,
    TierWeight,
};
use crate::engine::{EngineConfig, StudioEngine};
use crate::fixed::{Fixed64, Seconds};
use crate::id::{Department, Genre, TalentDefId, TalentId, TalentRarity, TalentRole, Tier};
use crate::recipe::Recipe;

// ===========================================================================
// Fixed-point helper
// ===========================================================================

pub fn fixed(v: f64) -> Fixed64 {
    Fixed64::from_num(v)
}

// ===========================================================================
// Catalog fixtures
// ===========================================================================

/// Item name for a department/tier pair, matching the fixture catalog.
pub fn item_name(dept: Department, tier: u8) -> String {
    format!("{}_t{}", dept.as_str().to_lowercase(), tier + 1)
}

/// A small but complete studio catalog:
/// - three-tier upgrade chains for Camera, Sound, Production, Art, Wardrobe
/// - one recipe spec ("Test Feature", 480 s, 0.1 penalties, synergy on)
/// - a drama talent trio (writer/director/actor, B-list) plus one comedy
///   actor for negative synergy cases
/// - Camera department crate config with lowest-tier-heavy drop weights
pub fn studio_catalog() -> Catalog {
    let mut b = CatalogBuilder::new();

    let departments = [
        Department::Camera,
        Department::Sound,
        Department::Production,
        Department::Art,
        Department::Wardrobe,
    ];
    for dept in departments {
        for tier in 0..3u8 {
            let value = i64::from(tier + 1) * 10;
            b.register_item(&item_name(dept, tier), dept, Tier(tier), value)
                .expect("unique fixture item names");
        }
        for tier in 0..2u8 {
            b.link_upgrade(&item_name(dept, tier), &item_name(dept, tier + 1))
                .expect("chain links both registered");
        }
    }

    b.register_recipe_spec(RecipeSpec {
        title: "Test Feature".to_string(),
        genre: Genre::Drama,
        required_departments: Department::REQUIRED.to_vec(),
        bonus_departments: vec![Department::Art, Department::Wardrobe],
        base_money_reward: 1000,
        base_fan_reward: 200,
        base_duration: Seconds::from_num(480),
        time_penalty: fixed(0.1),
        money_penalty: fixed(0.1),
        fan_penalty: fixed(0.1),
        allow_partial_talent: false,
        grant_synergy_bonus: true,
    });

    for (name, role) in [
        ("Sam Calloway", TalentRole::Writer),
        ("Rita Voss", TalentRole::Director),
        ("Eli Navarro", TalentRole::Actor),
    ] {
        b.register_talent(TalentDef {
            name: name.to_string(),
            role,
            rarity: TalentRarity::BList,
            genre: Genre::Drama,
        });
    }
    b.register_talent(TalentDef {
        name: "Penny Marsh".to_string(),
        role: TalentRole::Actor,
        rarity: TalentRarity::BList,
        genre: Genre::Comedy,
    });

    b.set_department_config(DepartmentConfig {
        department: Department::Camera,
        era: 0,
        crate_cost_soft: 100,
        crate_cost_premium: 0,
        crate_uses: 5,
        drop_weights: vec![
            TierWeight { tier: Tier(0), weight: fixed(5.0) },
            TierWeight { tier: Tier(1), weight: fixed(1.0) },
        ],
    });

    b.set_synergy_table(SynergyTable {
        tier_bonuses: vec![fixed(0.05), fixed(0.07), fixed(0.09), fixed(0.11)],
    });
    b.set_dailies_rules(DailiesRules::default());

    b.build().expect("fixture catalog is internally consistent")
}

/// Talent definition ids as registered by [`studio_catalog`].
pub fn drama_writer() -> TalentDefId {
    TalentDefId(0)
}
pub fn drama_director() -> TalentDefId {
    TalentDefId(1)
}
pub fn drama_actor() -> TalentDefId {
    TalentDefId(2)
}
pub fn comedy_actor() -> TalentDefId {
    TalentDefId(3)
}

// ===========================================================================
// Engine fixtures
// ===========================================================================

/// An engine over [`studio_catalog`] with the default config and a fixed
/// seed.
pub fn studio_engine() -> StudioEngine {
    StudioEngine::new(studio_catalog(), EngineConfig::default(), 0xBAC0)
}

pub fn studio_engine_with(config: EngineConfig) -> StudioEngine {
    StudioEngine::new(studio_catalog(), config, 0xBAC0)
}

/// Add the drama trio to the engine's inventory and return their card ids
/// in (writer, director, actor) order.
pub fn hire_drama_trio(engine: &mut StudioEngine) -> (TalentId, TalentId, TalentId) {
    let w = engine.add_talent(drama_writer()).expect("writer def");
    let d = engine.add_talent(drama_director()).expect("director def");
    let a = engine.add_talent(drama_actor()).expect("actor def");
    (w, d, a)
}

/// Populate a recipe value with required coverage (tier-1 Camera, Sound,
/// Production items) without going through the grid.
pub fn cover_required(recipe: &mut Recipe, catalog: &Catalog) {
    for dept in Department::REQUIRED {
        let id = catalog
            .item_id(&item_name(dept, 0))
            .expect("fixture covers required departments");
        recipe.submitted_items.push(id);
    }
}
