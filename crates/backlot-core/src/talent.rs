//! Talent cards and the owning inventory.
//!
//! A card wraps an immutable catalog definition plus the two mutable facts
//! the simulation tracks: uses remaining and whether an active recipe has
//! the card locked. Locked cards stay readable (the UI may show them) but
//! are excluded from `usable` queries and cannot be assigned.

use crate::catalog::Catalog;
use crate::id::{TalentDefId, TalentId};
use serde::{Deserialize, Serialize};
use slotmap::SlotMap;

/// A single owned talent card.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TalentCard {
    pub def: TalentDefId,
    pub uses_remaining: u32,
    pub locked: bool,
}

impl TalentCard {
    /// Usable cards can be assigned to a recipe slot.
    pub fn is_usable(&self) -> bool {
        self.uses_remaining > 0 && !self.locked
    }

    /// Consume one use. Saturates at zero.
    pub fn spend_use(&mut self) {
        self.uses_remaining = self.uses_remaining.saturating_sub(1);
    }
}

/// The player's talent collection.
#[derive(Debug, Default)]
pub struct TalentInventory {
    cards: SlotMap<TalentId, TalentCard>,
}

impl TalentInventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a card for a catalog definition; starting uses come from the
    /// definition's rarity. Returns `None` when the definition is unknown.
    pub fn add_from_def(&mut self, def: TalentDefId, catalog: &Catalog) -> Option<TalentId> {
        let rarity = catalog.talent_def(def)?.rarity;
        Some(self.cards.insert(TalentCard {
            def,
            uses_remaining: rarity.max_uses(),
            locked: false,
        }))
    }

    pub fn card(&self, id: TalentId) -> Option<&TalentCard> {
        self.cards.get(id)
    }

    pub fn card_mut(&mut self, id: TalentId) -> Option<&mut TalentCard> {
        self.cards.get_mut(id)
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TalentId, &TalentCard)> {
        self.cards.iter()
    }

    /// Cards that can currently be assigned to a recipe.
    pub fn usable(&self) -> Vec<TalentId> {
        self.cards
            .iter()
            .filter(|(_, card)| card.is_usable())
            .map(|(id, _)| id)
            .collect()
    }

    pub fn lock(&mut self, id: TalentId) {
        if let Some(card) = self.cards.get_mut(id) {
            card.locked = true;
        }
    }

    pub fn unlock(&mut self, id: TalentId) {
        if let Some(card) = self.cards.get_mut(id) {
            card.locked = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogBuilder, TalentDef};
    use crate::id::{Genre, TalentRarity, TalentRole};

    fn catalog_with_talent(rarity: TalentRarity) -> (Catalog, TalentDefId) {
        let mut b = CatalogBuilder::new();
        let def = b.register_talent(TalentDef {
            name: "Jordan Reeves".to_string(),
            role: TalentRole::Director,
            rarity,
            genre: Genre::Drama,
        });
        (b.build().unwrap(), def)
    }

    #[test]
    fn starting_uses_follow_rarity() {
        let (catalog, def) = catalog_with_talent(TalentRarity::AList);
        let mut inventory = TalentInventory::new();
        let id = inventory.add_from_def(def, &catalog).unwrap();
        assert_eq!(inventory.card(id).unwrap().uses_remaining, 2);
    }

    #[test]
    fn unknown_def_yields_none() {
        let (catalog, _) = catalog_with_talent(TalentRarity::BList);
        let mut inventory = TalentInventory::new();
        assert!(inventory.add_from_def(TalentDefId(99), &catalog).is_none());
    }

    #[test]
    fn locked_card_is_not_usable_but_readable() {
        let (catalog, def) = catalog_with_talent(TalentRarity::CList);
        let mut inventory = TalentInventory::new();
        let id = inventory.add_from_def(def, &catalog).unwrap();

        inventory.lock(id);
        assert!(!inventory.card(id).unwrap().is_usable());
        assert!(inventory.usable().is_empty());
        // Still inspectable while locked.
        assert_eq!(inventory.card(id).unwrap().uses_remaining, 4);

        inventory.unlock(id);
        assert_eq!(inventory.usable(), vec![id]);
    }

    #[test]
    fn spent_card_is_not_usable() {
        let (catalog, def) = catalog_with_talent(TalentRarity::AList);
        let mut inventory = TalentInventory::new();
        let id = inventory.add_from_def(def, &catalog).unwrap();

        inventory.card_mut(id).unwrap().spend_use();
        inventory.card_mut(id).unwrap().spend_use();
        assert_eq!(inventory.card(id).unwrap().uses_remaining, 0);
        assert!(!inventory.card(id).unwrap().is_usable());
    }

    #[test]
    fn spend_use_saturates() {
        let (catalog, def) = catalog_with_talent(TalentRarity::AList);
        let mut inventory = TalentInventory::new();
        let id = inventory.add_from_def(def, &catalog).unwrap();
        for _ in 0..5 {
            inventory.card_mut(id).unwrap().spend_use();
        }
        assert_eq!(inventory.card(id).unwrap().uses_remaining, 0);
    }

    #[test]
    fn lock_unknown_id_is_noop() {
        let mut inventory = TalentInventory::new();
        inventory.lock(TalentId::default());
        inventory.unlock(TalentId::default());
        assert!(inventory.is_empty());
    }
}
