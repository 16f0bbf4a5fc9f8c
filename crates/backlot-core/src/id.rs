use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

new_key_type! {
    /// Identifies a talent card in the inventory.
    pub struct TalentId;

    /// Identifies a live recipe (an in-progress or finished movie).
    pub struct RecipeId;

    /// Identifies a crate currently placed on the grid.
    pub struct CrateId;
}

/// Identifies an item definition in the catalog. Cheap to copy and compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemDefId(pub u32);

/// Identifies a recipe specification in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecipeSpecId(pub u32);

/// Identifies a talent definition in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TalentDefId(pub u32);

// ---------------------------------------------------------------------------
// Domain identifier enums
// ---------------------------------------------------------------------------

/// Production category tagging items and crates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Department {
    Camera,
    Sound,
    Production,
    Art,
    Wardrobe,
    Lights,
    Crafty,
    Locations,
}

impl Department {
    pub const ALL: [Department; 8] = [
        Department::Camera,
        Department::Sound,
        Department::Production,
        Department::Art,
        Department::Wardrobe,
        Department::Lights,
        Department::Crafty,
        Department::Locations,
    ];

    /// The three departments every recipe must cover.
    pub const REQUIRED: [Department; 3] =
        [Department::Camera, Department::Sound, Department::Production];

    pub fn is_required(self) -> bool {
        Self::REQUIRED.contains(&self)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Department::Camera => "Camera",
            Department::Sound => "Sound",
            Department::Production => "Production",
            Department::Art => "Art",
            Department::Wardrobe => "Wardrobe",
            Department::Lights => "Lights",
            Department::Crafty => "Crafty",
            Department::Locations => "Locations",
        }
    }

    pub fn from_str(s: &str) -> Option<Department> {
        Self::ALL.iter().copied().find(|d| d.as_str() == s)
    }

    /// Stable wire index used by the save codec.
    pub fn to_index(self) -> i32 {
        Self::ALL.iter().position(|&d| d == self).unwrap() as i32
    }

    pub fn from_index(index: i32) -> Option<Department> {
        usize::try_from(index).ok().and_then(|i| Self::ALL.get(i).copied())
    }
}

/// Ordinal rank of an item within its department's upgrade chain. Zero-based;
/// display names are one-based ("Tier 1" is `Tier(0)`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Tier(pub u8);

impl Tier {
    pub const LOWEST: Tier = Tier(0);

    /// One-based rank used in reward math (Tier(0) counts as 1).
    pub fn rank(self) -> u32 {
        u32::from(self.0) + 1
    }

    pub fn next(self) -> Tier {
        Tier(self.0 + 1)
    }
}

/// Currency kinds tracked by the wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CurrencyType {
    Money,
    Gems,
    Tickets,
}

impl CurrencyType {
    pub const ALL: [CurrencyType; 3] =
        [CurrencyType::Money, CurrencyType::Gems, CurrencyType::Tickets];

    pub fn to_index(self) -> i32 {
        Self::ALL.iter().position(|&c| c == self).unwrap() as i32
    }

    pub fn from_index(index: i32) -> Option<CurrencyType> {
        usize::try_from(index).ok().and_then(|i| Self::ALL.get(i).copied())
    }
}

/// Movie genre. Three talents sharing one genre grant the synergy bonus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Genre {
    Action,
    Comedy,
    Drama,
    Horror,
    Romance,
    SciFi,
}

/// Which recipe slot a talent occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TalentRole {
    Writer,
    Director,
    Actor,
}

/// Talent rarity. Drives max uses and the synergy tier comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TalentRarity {
    AList,
    BList,
    CList,
    DList,
}

impl TalentRarity {
    /// How many productions a card of this rarity can appear in.
    pub fn max_uses(self) -> u32 {
        match self {
            TalentRarity::AList => 2,
            TalentRarity::BList => 3,
            TalentRarity::CList => 4,
            TalentRarity::DList => 5,
        }
    }

    /// Rarity expressed on the same one-based scale as item tiers, for the
    /// synergy bonus lookup.
    pub fn tier(self) -> u32 {
        match self {
            TalentRarity::AList => 4,
            TalentRarity::BList => 3,
            TalentRarity::CList => 2,
            TalentRarity::DList => 1,
        }
    }
}
