//! Runtime movie recipes: the bundle of talent and submitted items that
//! moves through production, dailies and distribution.

use crate::catalog::Catalog;
use crate::fixed::Fixed64;
use crate::id::{Department, Genre, ItemDefId, RecipeSpecId, TalentId, TalentRole};
use crate::talent::TalentInventory;

/// The three talent slots of a recipe.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TalentSlots {
    pub writer: Option<TalentId>,
    pub director: Option<TalentId>,
    pub actor: Option<TalentId>,
}

impl TalentSlots {
    pub fn get(&self, role: TalentRole) -> Option<TalentId> {
        match role {
            TalentRole::Writer => self.writer,
            TalentRole::Director => self.director,
            TalentRole::Actor => self.actor,
        }
    }

    pub fn set(&mut self, role: TalentRole, talent: Option<TalentId>) {
        match role {
            TalentRole::Writer => self.writer = talent,
            TalentRole::Director => self.director = talent,
            TalentRole::Actor => self.actor = talent,
        }
    }

    /// Assigned slots, in writer/director/actor order.
    pub fn assigned(&self) -> impl Iterator<Item = TalentId> {
        [self.writer, self.director, self.actor].into_iter().flatten()
    }

    pub fn count(&self) -> u32 {
        self.assigned().count() as u32
    }
}

/// An in-progress or completed movie. Created at recipe-build time, mutated
/// by production and dailies, archived after distribution.
#[derive(Debug, Clone)]
pub struct Recipe {
    pub spec: RecipeSpecId,
    pub talents: TalentSlots,
    pub submitted_items: Vec<ItemDefId>,
    pub money_reward: i64,
    pub fan_reward: i64,
    pub reward_multiplier: Fixed64,
    pub dailies_played: u32,
    pub daily_scores: Vec<i32>,
}

impl Recipe {
    pub fn new(spec: RecipeSpecId) -> Self {
        Self {
            spec,
            talents: TalentSlots::default(),
            submitted_items: Vec::new(),
            money_reward: 0,
            fan_reward: 0,
            reward_multiplier: Fixed64::from_num(1),
            dailies_played: 0,
            daily_scores: Vec::new(),
        }
    }

    /// Departments required by the spec but not covered by any submitted
    /// item. Empty means the recipe may start.
    pub fn missing_required(&self, catalog: &Catalog) -> Vec<Department> {
        let Some(spec) = catalog.recipe_spec(self.spec) else {
            return Vec::new();
        };
        spec.required_departments
            .iter()
            .copied()
            .filter(|dept| !self.covers_department(*dept, catalog))
            .collect()
    }

    /// How many of the spec's optional departments have no submitted item.
    pub fn missing_optional(&self, catalog: &Catalog) -> u32 {
        let Some(spec) = catalog.recipe_spec(self.spec) else {
            return 0;
        };
        spec.bonus_departments
            .iter()
            .filter(|dept| !self.covers_department(**dept, catalog))
            .count() as u32
    }

    fn covers_department(&self, dept: Department, catalog: &Catalog) -> bool {
        self.submitted_items
            .iter()
            .filter_map(|id| catalog.item(*id))
            .any(|item| item.department == dept)
    }

    /// True when all three talents are assigned and share one genre.
    pub fn has_genre_synergy(&self, talents: &TalentInventory, catalog: &Catalog) -> bool {
        let genres: Vec<Genre> = [self.talents.writer, self.talents.director, self.talents.actor]
            .into_iter()
            .map(|slot| {
                slot.and_then(|id| talents.card(id))
                    .and_then(|card| catalog.talent_def(card.def))
                    .map(|def| def.genre)
            })
            .collect::<Option<Vec<_>>>()
            .unwrap_or_default();
        genres.len() == 3 && genres.iter().all(|g| *g == genres[0])
    }

    /// Sum of one-based tier ranks over the submitted items.
    pub fn total_item_tier(&self, catalog: &Catalog) -> u32 {
        self.submitted_items
            .iter()
            .filter_map(|id| catalog.item(*id))
            .map(|item| item.tier.rank())
            .sum()
    }

    /// The tier the synergy bonus is looked up with: the higher of the best
    /// submitted item tier (at least 1) and the best talent rarity tier.
    pub fn highest_tier(&self, talents: &TalentInventory, catalog: &Catalog) -> u32 {
        let item_tier = self
            .submitted_items
            .iter()
            .filter_map(|id| catalog.item(*id))
            .map(|item| item.tier.rank())
            .max()
            .unwrap_or(1);

        let talent_tier = self
            .talents
            .assigned()
            .filter_map(|id| talents.card(id))
            .filter_map(|card| catalog.talent_def(card.def))
            .map(|def| def.rarity.tier())
            .max()
            .unwrap_or(0);

        item_tier.max(talent_tier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogBuilder, RecipeSpec, TalentDef};
    use crate::fixed::Seconds;
    use crate::id::{TalentRarity, Tier};

    fn test_catalog() -> Catalog {
        let mut b = CatalogBuilder::new();
        b.register_item("camera_t1", Department::Camera, Tier(0), 10).unwrap();
        b.register_item("boom_t1", Department::Sound, Tier(0), 10).unwrap();
        b.register_item("slate_t1", Department::Production, Tier(0), 10).unwrap();
        b.register_item("easel_t3", Department::Art, Tier(2), 40).unwrap();
        b.register_recipe_spec(RecipeSpec {
            title: "Test Feature".to_string(),
            genre: Genre::Drama,
            required_departments: Department::REQUIRED.to_vec(),
            bonus_departments: vec![Department::Art, Department::Wardrobe],
            base_money_reward: 1000,
            base_fan_reward: 100,
            base_duration: Seconds::from_num(480),
            time_penalty: Fixed64::from_num(0.1),
            money_penalty: Fixed64::from_num(0.1),
            fan_penalty: Fixed64::from_num(0.1),
            allow_partial_talent: false,
            grant_synergy_bonus: true,
        });
        for (name, role, rarity, genre) in [
            ("W", TalentRole::Writer, TalentRarity::BList, Genre::Drama),
            ("D", TalentRole::Director, TalentRarity::AList, Genre::Drama),
            ("A", TalentRole::Actor, TalentRarity::DList, Genre::Drama),
            ("A2", TalentRole::Actor, TalentRarity::DList, Genre::Comedy),
        ] {
            b.register_talent(TalentDef {
                name: name.to_string(),
                role,
                rarity,
                genre,
            });
        }
        b.build().unwrap()
    }

    fn submit(recipe: &mut Recipe, catalog: &Catalog, names: &[&str]) {
        for name in names {
            recipe.submitted_items.push(catalog.item_id(name).unwrap());
        }
    }

    #[test]
    fn missing_required_lists_gaps() {
        let catalog = test_catalog();
        let mut recipe = Recipe::new(RecipeSpecId(0));
        submit(&mut recipe, &catalog, &["camera_t1"]);
        assert_eq!(
            recipe.missing_required(&catalog),
            vec![Department::Sound, Department::Production]
        );

        submit(&mut recipe, &catalog, &["boom_t1", "slate_t1"]);
        assert!(recipe.missing_required(&catalog).is_empty());
    }

    #[test]
    fn missing_optional_counts_uncovered_bonus_departments() {
        let catalog = test_catalog();
        let mut recipe = Recipe::new(RecipeSpecId(0));
        assert_eq!(recipe.missing_optional(&catalog), 2);
        submit(&mut recipe, &catalog, &["easel_t3"]);
        assert_eq!(recipe.missing_optional(&catalog), 1);
    }

    #[test]
    fn synergy_requires_all_three_sharing_genre() {
        let catalog = test_catalog();
        let mut inventory = TalentInventory::new();
        let w = inventory.add_from_def(crate::id::TalentDefId(0), &catalog).unwrap();
        let d = inventory.add_from_def(crate::id::TalentDefId(1), &catalog).unwrap();
        let a = inventory.add_from_def(crate::id::TalentDefId(2), &catalog).unwrap();
        let a2 = inventory.add_from_def(crate::id::TalentDefId(3), &catalog).unwrap();

        let mut recipe = Recipe::new(RecipeSpecId(0));
        recipe.talents.writer = Some(w);
        recipe.talents.director = Some(d);
        assert!(!recipe.has_genre_synergy(&inventory, &catalog));

        recipe.talents.actor = Some(a);
        assert!(recipe.has_genre_synergy(&inventory, &catalog));

        recipe.talents.actor = Some(a2);
        assert!(!recipe.has_genre_synergy(&inventory, &catalog));
    }

    #[test]
    fn total_item_tier_sums_one_based_ranks() {
        let catalog = test_catalog();
        let mut recipe = Recipe::new(RecipeSpecId(0));
        submit(&mut recipe, &catalog, &["camera_t1", "easel_t3"]);
        // Tier(0) -> 1, Tier(2) -> 3.
        assert_eq!(recipe.total_item_tier(&catalog), 4);
    }

    #[test]
    fn highest_tier_takes_max_of_items_and_talent() {
        let catalog = test_catalog();
        let mut inventory = TalentInventory::new();
        let d = inventory.add_from_def(crate::id::TalentDefId(1), &catalog).unwrap();

        let mut recipe = Recipe::new(RecipeSpecId(0));
        submit(&mut recipe, &catalog, &["easel_t3"]);
        // Best item rank 3, no talent: 3.
        assert_eq!(recipe.highest_tier(&inventory, &catalog), 3);

        // A-list director rates tier 4, beating the item.
        recipe.talents.director = Some(d);
        assert_eq!(recipe.highest_tier(&inventory, &catalog), 4);
    }

    #[test]
    fn highest_tier_floors_at_one_with_no_items() {
        let catalog = test_catalog();
        let inventory = TalentInventory::new();
        let recipe = Recipe::new(RecipeSpecId(0));
        assert_eq!(recipe.highest_tier(&inventory, &catalog), 1);
    }

    #[test]
    fn slot_roundtrip_by_role() {
        let mut slots = TalentSlots::default();
        assert_eq!(slots.count(), 0);
        let id = TalentId::default();
        slots.set(TalentRole::Director, Some(id));
        assert_eq!(slots.get(TalentRole::Director), Some(id));
        assert_eq!(slots.get(TalentRole::Writer), None);
        assert_eq!(slots.count(), 1);
    }
}
