//! Crate spawn engine: weighted item/tier selection, crate depletion, the
//! universal crate timer, and department crate purchases.
//!
//! Crates sit on the grid and dispense items into free cells. A crate whose
//! uses reach zero is spent immediately — no further spawns — but its cell
//! stays occupied for a fixed drain delay before the crate is removed, so
//! nothing can spawn into that cell mid-animation.

use crate::catalog::{Catalog, DepartmentConfig, TierWeight};
use crate::economy::Wallet;
use crate::fixed::{Fixed64, Seconds, round_to_i64};
use crate::grid::{GridPos, GridRegistry, Occupant};
use crate::id::{CrateId, CurrencyType, Department, ItemDefId, Tier};
use crate::overflow::{OverflowItem, OverflowStore};
use crate::rng::SimRng;
use slotmap::SlotMap;

// ---------------------------------------------------------------------------
// Weighted tier sampling
// ---------------------------------------------------------------------------

/// Draw a tier from `(tier, weight)` pairs: uniform draw in `[0, total)`,
/// first tier whose cumulative weight covers the draw. Negative weights
/// count as zero. An empty list or zero total degrades to the lowest tier
/// present (or `Tier::LOWEST` for an empty list).
pub fn weighted_tier(weights: &[TierWeight], rng: &mut SimRng) -> Tier {
    let lowest = weights.iter().map(|w| w.tier).min().unwrap_or(Tier::LOWEST);
    let total = weights
        .iter()
        .fold(Fixed64::ZERO, |acc, w| acc + w.weight.max(Fixed64::ZERO));
    if total <= Fixed64::ZERO {
        return lowest;
    }

    let draw = rng.draw_in(total);
    let mut cumulative = Fixed64::ZERO;
    for entry in weights {
        cumulative += entry.weight.max(Fixed64::ZERO);
        if draw < cumulative {
            return entry.tier;
        }
    }
    lowest
}

// ---------------------------------------------------------------------------
// Crate state
// ---------------------------------------------------------------------------

/// Lifecycle of a placed crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CratePhase {
    Active,
    /// Spent; the cell stays occupied until the timer runs out.
    Draining { remaining: Seconds },
}

/// A crate placed on the grid.
#[derive(Debug, Clone)]
pub struct CrateState {
    pub department: Department,
    pub pos: GridPos,
    pub uses_remaining: u32,
    /// Candidate item definitions; one is drawn uniformly per use.
    pub pool: Vec<ItemDefId>,
    pub phase: CratePhase,
}

impl CrateState {
    pub fn is_spent(&self) -> bool {
        self.uses_remaining == 0 || matches!(self.phase, CratePhase::Draining { .. })
    }
}

// ---------------------------------------------------------------------------
// Errors and outcomes
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SpawnError {
    #[error("unknown crate")]
    UnknownCrate,
    #[error("crate is spent")]
    CrateSpent,
    #[error("crate pool is empty")]
    EmptyPool,
}

/// Where a dispensed item ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnOutcome {
    /// Placed on the grid.
    Placed { pos: GridPos, item: ItemDefId },
    /// Grid full; routed to the overflow store.
    Overflowed { item: ItemDefId },
    /// Grid and overflow both full; discarded for a partial refund.
    Discarded { item: ItemDefId, refund: i64 },
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PurchaseError {
    #[error("unknown department")]
    UnknownDepartment,
    #[error("insufficient funds")]
    InsufficientFunds,
    #[error("no free grid cell for the crate")]
    GridFull,
    #[error("no item matches the department and tier")]
    NoMatchingItem,
}

// ---------------------------------------------------------------------------
// Tuning
// ---------------------------------------------------------------------------

/// Spawn-engine tuning, owned by the engine config.
#[derive(Debug, Clone, Copy)]
pub struct SpawnTuning {
    /// How long a spent crate keeps its cell before removal.
    pub drain_delay: Seconds,
    /// Hours between universal crate drops.
    pub universal_interval_hours: Fixed64,
    /// Fraction of base value refunded when an item must be discarded.
    pub refund_fraction: Fixed64,
}

impl Default for SpawnTuning {
    fn default() -> Self {
        Self {
            drain_delay: Seconds::from_num(0.25),
            universal_interval_hours: Fixed64::from_num(4),
            refund_fraction: Fixed64::from_num(0.1),
        }
    }
}

// ---------------------------------------------------------------------------
// CrateSpawnEngine
// ---------------------------------------------------------------------------

/// Owns every placed crate, the mutable department configs, and the
/// universal crate timer.
#[derive(Debug)]
pub struct CrateSpawnEngine {
    crates: SlotMap<CrateId, CrateState>,
    departments: Vec<DepartmentConfig>,
    tuning: SpawnTuning,
    /// Hours accumulated toward the next universal crate.
    universal_timer_hours: Fixed64,
}

impl CrateSpawnEngine {
    pub fn new(catalog: &Catalog, tuning: SpawnTuning) -> Self {
        Self {
            crates: SlotMap::with_key(),
            departments: catalog.department_configs().to_vec(),
            tuning,
            universal_timer_hours: Fixed64::ZERO,
        }
    }

    pub fn crate_state(&self, id: CrateId) -> Option<&CrateState> {
        self.crates.get(id)
    }

    pub fn crate_count(&self) -> usize {
        self.crates.len()
    }

    pub fn department_config(&self, dept: Department) -> Option<&DepartmentConfig> {
        self.departments.iter().find(|c| c.department == dept)
    }

    pub fn universal_timer_hours(&self) -> Fixed64 {
        self.universal_timer_hours
    }

    pub fn set_universal_timer_hours(&mut self, hours: Fixed64) {
        self.universal_timer_hours = hours.max(Fixed64::ZERO);
    }

    /// Place a crate at a random free cell. Returns `None` when the grid is
    /// full or the pool resolves to nothing.
    pub fn place_crate(
        &mut self,
        department: Department,
        uses: u32,
        pool: Vec<ItemDefId>,
        grid: &mut GridRegistry,
        rng: &mut SimRng,
    ) -> Option<CrateId> {
        if pool.is_empty() || uses == 0 {
            return None;
        }
        let pos = grid.random_free_cell(rng)?;
        let id = self.crates.insert(CrateState {
            department,
            pos,
            uses_remaining: uses,
            pool,
            phase: CratePhase::Active,
        });
        grid.register(pos, Occupant::Crate(id))
            .expect("free cell is in bounds");
        Some(id)
    }

    /// Dispense one item from a crate.
    ///
    /// The use is consumed whether the item lands on the grid, overflows, or
    /// is discarded; a discard reports the refund owed so the caller can
    /// credit the wallet. The last use flips the crate to `Draining` — the
    /// cell stays occupied until [`advance`](Self::advance) removes it.
    pub fn use_crate(
        &mut self,
        id: CrateId,
        grid: &mut GridRegistry,
        catalog: &Catalog,
        overflow: &mut OverflowStore,
        rng: &mut SimRng,
    ) -> Result<SpawnOutcome, SpawnError> {
        let crate_state = self.crates.get(id).ok_or(SpawnError::UnknownCrate)?;
        if crate_state.is_spent() {
            return Err(SpawnError::CrateSpent);
        }
        if crate_state.pool.is_empty() {
            return Err(SpawnError::EmptyPool);
        }

        let item = crate_state.pool[rng.next_index(crate_state.pool.len())];
        let own_cell = crate_state.pos;

        let outcome = match grid.random_free_cell_excluding(rng, Some(own_cell)) {
            Some(pos) => {
                grid.register(pos, Occupant::Item(item))
                    .expect("free cell is in bounds");
                SpawnOutcome::Placed { pos, item }
            }
            None => match catalog.item(item) {
                Some(def) => {
                    let entry = OverflowItem {
                        department: def.department,
                        tier: def.tier,
                        base_value: def.base_value,
                    };
                    let base_value = entry.base_value;
                    if overflow.store(entry) {
                        SpawnOutcome::Overflowed { item }
                    } else {
                        SpawnOutcome::Discarded {
                            item,
                            refund: round_to_i64(
                                Fixed64::from_num(base_value) * self.tuning.refund_fraction,
                            ),
                        }
                    }
                }
                // Unknown definition: nothing to store or refund.
                None => SpawnOutcome::Discarded { item, refund: 0 },
            },
        };

        let crate_state = self
            .crates
            .get_mut(id)
            .expect("crate still present; only advance removes");
        crate_state.uses_remaining -= 1;
        if crate_state.uses_remaining == 0 {
            crate_state.phase = CratePhase::Draining {
                remaining: self.tuning.drain_delay,
            };
        }

        Ok(outcome)
    }

    /// Advance drain timers; fully drained crates leave the grid. Returns
    /// the removed crate ids.
    pub fn advance(&mut self, dt: Seconds, grid: &mut GridRegistry) -> Vec<CrateId> {
        let mut removed = Vec::new();
        for (id, crate_state) in &mut self.crates {
            if let CratePhase::Draining { remaining } = &mut crate_state.phase {
                *remaining -= dt;
                if *remaining <= Seconds::ZERO {
                    removed.push(id);
                }
            }
        }
        for id in &removed {
            if let Some(crate_state) = self.crates.remove(*id) {
                grid.unregister(crate_state.pos);
            }
        }
        removed
    }

    /// Advance the universal crate timer. At each interval a single-use
    /// crate with one weighted-drawn item appears at a random free cell.
    /// The timer resets either way; a full grid forfeits that drop.
    pub fn tick_universal(
        &mut self,
        dt: Seconds,
        grid: &mut GridRegistry,
        catalog: &Catalog,
        rng: &mut SimRng,
    ) -> Option<CrateId> {
        self.universal_timer_hours += dt / Fixed64::from_num(3600);
        if self.universal_timer_hours < self.tuning.universal_interval_hours {
            return None;
        }
        self.universal_timer_hours = Fixed64::ZERO;

        if self.departments.is_empty() {
            return None;
        }
        let config = &self.departments[rng.next_index(self.departments.len())];
        let department = config.department;
        let tier = weighted_tier(&config.drop_weights, rng);
        let candidates = catalog.items_for(department, tier);
        if candidates.is_empty() {
            return None;
        }
        let item = candidates[rng.next_index(candidates.len())];
        self.place_crate(department, 1, vec![item], grid, rng)
    }

    /// Buy a department crate: spend the department's soft then premium
    /// cost, pick a weighted item, and place the crate. Every failure after
    /// a successful spend refunds what was taken.
    pub fn purchase_department_crate(
        &mut self,
        dept: Department,
        wallet: &mut Wallet,
        grid: &mut GridRegistry,
        catalog: &Catalog,
        rng: &mut SimRng,
    ) -> Result<CrateId, PurchaseError> {
        let config = self
            .departments
            .iter()
            .find(|c| c.department == dept)
            .ok_or(PurchaseError::UnknownDepartment)?;
        let soft = config.crate_cost_soft;
        let premium = config.crate_cost_premium;
        let uses = config.crate_uses.max(1);
        let weights = config.drop_weights.clone();

        if !wallet.spend(CurrencyType::Money, soft) {
            return Err(PurchaseError::InsufficientFunds);
        }
        if !wallet.spend(CurrencyType::Gems, premium) {
            wallet.add(CurrencyType::Money, soft);
            return Err(PurchaseError::InsufficientFunds);
        }

        let refund = |wallet: &mut Wallet| {
            wallet.add(CurrencyType::Money, soft);
            wallet.add(CurrencyType::Gems, premium);
        };

        let tier = weighted_tier(&weights, rng);
        let candidates = catalog.items_for(dept, tier);
        if candidates.is_empty() {
            refund(wallet);
            return Err(PurchaseError::NoMatchingItem);
        }
        let item = candidates[rng.next_index(candidates.len())];

        match self.place_crate(dept, uses, vec![item], grid, rng) {
            Some(id) => Ok(id),
            None => {
                refund(wallet);
                Err(PurchaseError::GridFull)
            }
        }
    }

    /// Advance a department's era: costs rise by half, drop weights shift up
    /// by a tenth.
    pub fn upgrade_department(&mut self, dept: Department) -> bool {
        let Some(config) = self.departments.iter_mut().find(|c| c.department == dept) else {
            return false;
        };
        config.era += 1;
        config.crate_cost_soft =
            round_to_i64(Fixed64::from_num(config.crate_cost_soft) * Fixed64::from_num(1.5));
        config.crate_cost_premium =
            round_to_i64(Fixed64::from_num(config.crate_cost_premium) * Fixed64::from_num(1.5));
        for entry in &mut config.drop_weights {
            entry.weight *= Fixed64::from_num(1.1);
        }
        true
    }
}

// ===========================================================================
// Tests
// ===========================================================================
