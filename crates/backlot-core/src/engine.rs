//! The studio engine: owns every subsystem and orchestrates the tick.
//!
//! # Architecture
//!
//! `StudioEngine` is the explicit context object — there is no ambient
//! static state. It owns:
//! - A [`GridRegistry`] and the [`CrateSpawnEngine`] feeding it
//! - The [`OverflowStore`], [`Wallet`] and [`FameLedger`]
//! - The [`TalentInventory`] and the live [`Recipe`] store
//! - The [`ProductionPipeline`], [`DailiesSync`] and [`DistributionQueue`]
//! - The [`FilmArchive`], [`SimRng`], [`EventBus`] and [`SaveScheduler`]
//!
//! # Tick phases
//!
//! Each `advance(dt)` runs, in order:
//! 1. **Crate drain** -- spent crates whose delay elapsed leave the grid.
//! 2. **Universal crate** -- the long-interval crate timer.
//! 3. **Production** -- elapsed time, then milestones (all crossed fire in
//!    order), then completion; milestone and completion events route into
//!    the dailies gate, which may hand a recipe to distribution.
//! 4. **Scheduler** -- autosave/backup due flags accumulate.
//! 5. **Delivery** -- buffered events go to observers in registration
//!    order and are returned as data.
//!
//! The phase order is the single-writer discipline: merge resolution, crate
//! spawning and snapshot restore never interleave mid-tick.

use crate::archive::{ArchivedFilm, FilmArchive};
use crate::catalog::Catalog;
use crate::dailies::{DailiesSync, DailyResolution};
use crate::distribution::{DistributionDecision, DistributionQueue};
use crate::economy::{FameLedger, Wallet};
use crate::event::{EventBus, EventKind, Observer, StudioEvent, SubscriberId};
use crate::fixed::{Fixed64, Seconds, clamp01, round_to_i64};
use crate::grid::{GridDims, GridPos, GridRegistry, Occupant};
use crate::id::{CrateId, CurrencyType, Department, RecipeId, RecipeSpecId, TalentDefId, TalentId, TalentRole, Tier};
use crate::merge::{self, MergeOutcome};
use crate::overflow::{OverflowItem, OverflowStore};
use crate::production::{ProductionPipeline, ProductionTick, StartError, StartOutcome};
use crate::recipe::Recipe;
use crate::rng::SimRng;
use crate::save::{CurrencyRecord, GridItemRecord, OverflowRecord, SAVE_VERSION, SaveDue, SaveError, SaveScheduler, SaveSnapshot, SaveStore};
use crate::spawn::{CrateSpawnEngine, PurchaseError, SpawnError, SpawnOutcome, SpawnTuning};
use crate::talent::TalentInventory;
use slotmap::SlotMap;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Engine tuning, fixed at construction.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub grid: GridDims,
    /// Ascending progress fractions at which dailies unlock.
    pub milestone_fractions: Vec<Fixed64>,
    pub starting_money: i64,
    pub overflow_slots: u32,
    pub overflow_max_slots: u32,
    /// Base cost of the first purchased overflow slot; doubles per slot.
    pub overflow_expand_base_cost: i64,
    pub spawn: SpawnTuning,
    pub autosave_interval: Seconds,
    pub backup_interval: Seconds,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            grid: GridDims::new(5, 7),
            milestone_fractions: vec![
                Fixed64::from_num(0.33),
                Fixed64::from_num(0.66),
                Fixed64::from_num(1),
            ],
            starting_money: 1000,
            overflow_slots: 4,
            overflow_max_slots: 12,
            overflow_expand_base_cost: 100,
            spawn: SpawnTuning::default(),
            autosave_interval: Seconds::from_num(120),
            backup_interval: Seconds::from_num(2700),
        }
    }
}

// ---------------------------------------------------------------------------
// Command errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AssignError {
    #[error("unknown recipe")]
    UnknownRecipe,
    #[error("unknown talent")]
    UnknownTalent,
    #[error("talent is locked or out of uses")]
    TalentUnavailable,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SubmitError {
    #[error("unknown recipe")]
    UnknownRecipe,
    #[error("cell does not hold an item")]
    NotAnItem,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DistributionError {
    #[error("no recipe is awaiting a distribution decision")]
    NothingActive,
}

/// What a resolved distribution paid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DistributionReport {
    pub recipe: RecipeId,
    pub money: i64,
    pub fans: i64,
}

// ---------------------------------------------------------------------------
// StudioEngine
// ---------------------------------------------------------------------------

/// The simulation backend. All mutation flows through here, one tick at a
/// time; there is no parallel access.
pub struct StudioEngine {
    catalog: Catalog,
    config: EngineConfig,
    rng: SimRng,

    grid: GridRegistry,
    spawner: CrateSpawnEngine,
    overflow: OverflowStore,
    wallet: Wallet,
    fame: FameLedger,
    talents: TalentInventory,
    recipes: SlotMap<RecipeId, Recipe>,
    pipeline: ProductionPipeline,
    dailies: DailiesSync,
    queue: DistributionQueue,
    archive: FilmArchive,

    bus: EventBus,
    scheduler: SaveScheduler,
    pending_due: SaveDue,
}

impl StudioEngine {
    pub fn new(catalog: Catalog, config: EngineConfig, seed: u64) -> Self {
        let spawner = CrateSpawnEngine::new(&catalog, config.spawn);
        Self {
            grid: GridRegistry::new(config.grid),
            spawner,
            overflow: OverflowStore::new(config.overflow_slots, config.overflow_max_slots),
            wallet: Wallet::with_starting_money(config.starting_money),
            fame: FameLedger::new(),
            talents: TalentInventory::new(),
            recipes: SlotMap::with_key(),
            pipeline: ProductionPipeline::new(config.milestone_fractions.clone()),
            dailies: DailiesSync::new(),
            queue: DistributionQueue::new(),
            archive: FilmArchive::new(),
            bus: EventBus::new(),
            scheduler: SaveScheduler::new(config.autosave_interval, config.backup_interval),
            pending_due: SaveDue::default(),
            rng: SimRng::new(seed),
            catalog,
            config,
        }
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn grid(&self) -> &GridRegistry {
        &self.grid
    }

    pub fn wallet(&self) -> &Wallet {
        &self.wallet
    }

    pub fn fame(&self) -> &FameLedger {
        &self.fame
    }

    pub fn talents(&self) -> &TalentInventory {
        &self.talents
    }

    pub fn overflow(&self) -> &OverflowStore {
        &self.overflow
    }

    pub fn archive(&self) -> &FilmArchive {
        &self.archive
    }

    pub fn spawner(&self) -> &CrateSpawnEngine {
        &self.spawner
    }

    pub fn pipeline(&self) -> &ProductionPipeline {
        &self.pipeline
    }

    pub fn dailies(&self) -> &DailiesSync {
        &self.dailies
    }

    pub fn distribution(&self) -> &DistributionQueue {
        &self.queue
    }

    pub fn recipe(&self, id: RecipeId) -> Option<&Recipe> {
        self.recipes.get(id)
    }

    /// Register an observer. Delivery happens at the end of each tick, in
    /// registration order.
    pub fn subscribe(&mut self, kind: EventKind, observer: Observer) -> SubscriberId {
        self.bus.subscribe(kind, observer)
    }

    pub fn unsubscribe(&mut self, id: SubscriberId) {
        self.bus.unsubscribe(id);
    }

    // -----------------------------------------------------------------------
    // Tick
    // -----------------------------------------------------------------------

    /// Advance the simulation by one frame's delta. Returns the events this
    /// tick produced (also delivered to subscribers).
    pub fn advance(&mut self, dt: Seconds) -> Vec<StudioEvent> {
        // Phase 1: spent crates whose drain delay elapsed leave the grid.
        self.spawner.advance(dt, &mut self.grid);

        // Phase 2: universal crate timer.
        self.spawner
            .tick_universal(dt, &mut self.grid, &self.catalog, &mut self.rng);

        // Phase 3: production timer. Elapsed updates before milestones,
        // milestones before completion.
        let ticks = self.pipeline.advance(dt);
        for tick in ticks {
            match tick {
                ProductionTick::Progress { recipe, fraction } => {
                    self.bus.emit(StudioEvent::ProductionProgress { recipe, fraction });
                }
                ProductionTick::Milestone { recipe, fraction } => {
                    self.dailies.on_milestone(recipe);
                    self.bus.emit(StudioEvent::MilestoneReached { recipe, fraction });
                }
                ProductionTick::Completed { recipe } => {
                    self.complete_production(recipe);
                }
            }
        }

        // Phase 4: autosave/backup cadence.
        let due = self.scheduler.advance(dt);
        self.pending_due.autosave |= due.autosave;
        self.pending_due.backup |= due.backup;

        // Phase 5: deliver buffered events.
        self.bus.deliver()
    }

    /// Poll-and-clear the periodic save flags accumulated by `advance`.
    pub fn take_save_due(&mut self) -> SaveDue {
        std::mem::take(&mut self.pending_due)
    }

    fn complete_production(&mut self, recipe_id: RecipeId) {
        // Unlock the talents and spend one use from each. The submitted
        // items are consumed for good; they stay recorded on the recipe but
        // return to no inventory.
        if let Some(recipe) = self.recipes.get(recipe_id) {
            let assigned: Vec<TalentId> = recipe.talents.assigned().collect();
            for id in assigned {
                if let Some(card) = self.talents.card_mut(id) {
                    card.spend_use();
                    card.locked = false;
                }
            }
        }

        self.pipeline.take_completed();
        self.bus.emit(StudioEvent::ProductionCompleted { recipe: recipe_id });

        if let Some(released) = self.dailies.on_production_complete(recipe_id) {
            self.enqueue_for_distribution(released);
        }
    }

    fn enqueue_for_distribution(&mut self, recipe: RecipeId) {
        self.queue.enqueue(recipe);
        self.bus.emit(StudioEvent::RecipeQueued { recipe });
    }

    // -----------------------------------------------------------------------
    // Grid commands
    // -----------------------------------------------------------------------

    /// Resolve a drop of the occupant at `from` onto `to`.
    pub fn move_or_merge(&mut self, from: GridPos, to: GridPos) -> MergeOutcome {
        let outcome = merge::resolve(&mut self.grid, &self.catalog, from, to);
        if let MergeOutcome::Merged { at, item } = outcome {
            self.bus.emit(StudioEvent::ItemMerged { pos: at, item });
        }
        outcome
    }

    /// Dispense one item from a crate, routing to grid, overflow, or a
    /// refunded discard.
    pub fn use_crate(&mut self, id: CrateId) -> Result<SpawnOutcome, SpawnError> {
        let outcome = self.spawner.use_crate(
            id,
            &mut self.grid,
            &self.catalog,
            &mut self.overflow,
            &mut self.rng,
        )?;
        match outcome {
            SpawnOutcome::Placed { pos, item } => {
                self.bus.emit(StudioEvent::ItemSpawned { pos, item });
            }
            SpawnOutcome::Overflowed { .. } => {
                self.emit_overflow_updated();
            }
            SpawnOutcome::Discarded { refund, .. } => {
                if refund > 0 {
                    let amount = self.wallet.add(CurrencyType::Money, refund);
                    self.bus.emit(StudioEvent::CurrencyChanged {
                        currency: CurrencyType::Money,
                        amount,
                    });
                }
            }
        }
        if self.spawner.crate_state(id).is_some_and(|c| c.is_spent()) {
            self.bus.emit(StudioEvent::CrateDepleted { crate_id: id });
        }
        Ok(outcome)
    }

    /// Buy a department crate. Spent currency is refunded in full on any
    /// failure after the spend.
    pub fn purchase_department_crate(&mut self, dept: Department) -> Result<CrateId, PurchaseError> {
        let id = self.spawner.purchase_department_crate(
            dept,
            &mut self.wallet,
            &mut self.grid,
            &self.catalog,
            &mut self.rng,
        )?;
        self.emit_currency(CurrencyType::Money);
        self.emit_currency(CurrencyType::Gems);
        Ok(id)
    }

    pub fn upgrade_department(&mut self, dept: Department) -> bool {
        self.spawner.upgrade_department(dept)
    }

    // -----------------------------------------------------------------------
    // Overflow commands
    // -----------------------------------------------------------------------

    /// Discard an overflow item for its partial refund. Returns the refund.
    pub fn discard_overflow(&mut self, index: usize) -> Option<i64> {
        let item = self.overflow.remove(index)?;
        let refund = round_to_i64(
            Fixed64::from_num(item.base_value) * self.config.spawn.refund_fraction,
        );
        if refund > 0 {
            self.wallet.add(CurrencyType::Money, refund);
            self.emit_currency(CurrencyType::Money);
        }
        self.emit_overflow_updated();
        Some(refund)
    }

    /// Buy extra overflow slots; the price doubles per slot already added
    /// beyond the starting count. `false` when capped or unaffordable.
    pub fn purchase_overflow_slots(&mut self, amount: u32) -> bool {
        if amount == 0 {
            return false;
        }
        let available = self.overflow.max_slots() - self.overflow.slots();
        let to_buy = amount.min(available);
        if to_buy == 0 {
            return false;
        }

        let mut cost = 0i64;
        for i in 0..to_buy {
            let level = (self.overflow.slots() + i).saturating_sub(self.config.overflow_slots);
            cost += self.config.overflow_expand_base_cost << level;
        }
        if !self.wallet.spend(CurrencyType::Money, cost) {
            return false;
        }
        self.overflow.expand_slots(to_buy);
        self.emit_currency(CurrencyType::Money);
        self.emit_overflow_updated();
        true
    }

    // -----------------------------------------------------------------------
    // Talent / recipe commands
    // -----------------------------------------------------------------------

    /// Add a talent card for a catalog definition.
    pub fn add_talent(&mut self, def: TalentDefId) -> Option<TalentId> {
        self.talents.add_from_def(def, &self.catalog)
    }

    /// Create an empty recipe against a spec.
    pub fn create_recipe(&mut self, spec: RecipeSpecId) -> Option<RecipeId> {
        self.catalog.recipe_spec(spec)?;
        Some(self.recipes.insert(Recipe::new(spec)))
    }

    /// Assign a usable talent to a slot (or clear the slot with `None`).
    /// Locked cards are inspectable but not selectable.
    pub fn assign_talent(
        &mut self,
        recipe: RecipeId,
        role: TalentRole,
        talent: Option<TalentId>,
    ) -> Result<(), AssignError> {
        if let Some(id) = talent {
            let card = self.talents.card(id).ok_or(AssignError::UnknownTalent)?;
            if !card.is_usable() {
                return Err(AssignError::TalentUnavailable);
            }
        }
        let recipe = self.recipes.get_mut(recipe).ok_or(AssignError::UnknownRecipe)?;
        recipe.talents.set(role, talent);
        Ok(())
    }

    /// Move an item from the grid into a recipe's submission list. The cell
    /// is freed; the item now exists only in the recipe.
    pub fn submit_item(&mut self, recipe: RecipeId, pos: GridPos) -> Result<(), SubmitError> {
        if !self.recipes.contains_key(recipe) {
            return Err(SubmitError::UnknownRecipe);
        }
        let Occupant::Item(item) = self.grid.occupant_at(pos) else {
            return Err(SubmitError::NotAnItem);
        };
        self.grid.unregister(pos);
        self.recipes[recipe].submitted_items.push(item);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Production commands
    // -----------------------------------------------------------------------

    /// Start producing a recipe. Rejections are no-ops with a typed reason.
    pub fn start_production(&mut self, recipe_id: RecipeId) -> Result<StartOutcome, StartError> {
        let recipe = self
            .recipes
            .get_mut(recipe_id)
            .ok_or(StartError::UnknownRecipe)?;
        let outcome = self.pipeline.start(
            recipe_id,
            recipe,
            &self.catalog,
            &mut self.talents,
            self.catalog.synergy(),
        )?;
        if outcome.synergy_applied
            && let Some(spec) = self.catalog.recipe_spec(recipe.spec)
        {
            self.archive.register_title(&spec.title);
        }
        Ok(outcome)
    }

    /// Resolve one dailies attempt for a recipe. A played attempt with a
    /// non-negative score raises the reward multiplier by `score/100`,
    /// clamped to [0, 1] per attempt, with no cap on the running total.
    pub fn resolve_daily(&mut self, recipe_id: RecipeId, resolution: DailyResolution) {
        if let DailyResolution::Played { score } = resolution
            && score >= 0
            && let Some(recipe) = self.recipes.get_mut(recipe_id)
        {
            recipe.daily_scores.push(score);
            recipe.dailies_played += 1;
            recipe.reward_multiplier += clamp01(
                Fixed64::from_num(score) / Fixed64::from_num(100),
            );
        }
        if let Some(released) = self.dailies.on_attempt_resolved(recipe_id) {
            self.enqueue_for_distribution(released);
        }
    }

    /// Resolve the active distribution decision: pay out money scaled by the
    /// dailies multiplier, grant fans as fame, archive the film, and
    /// activate the next queued recipe.
    pub fn resolve_distribution(
        &mut self,
        decision: DistributionDecision,
    ) -> Result<DistributionReport, DistributionError> {
        let recipe_id = self.queue.resolve_active().ok_or(DistributionError::NothingActive)?;

        let (money, fans) = match self.recipes.get(recipe_id) {
            Some(recipe) => (
                round_to_i64(Fixed64::from_num(recipe.money_reward) * recipe.reward_multiplier),
                recipe.fan_reward,
            ),
            None => (0, 0),
        };

        if money > 0 {
            self.wallet.add(CurrencyType::Money, money);
            self.emit_currency(CurrencyType::Money);
        }
        let levels_gained = self.fame.add(Fixed64::from_num(fans));
        if levels_gained > 0 {
            self.bus.emit(StudioEvent::FameLevelChanged { level: self.fame.level() });
        }

        if let Some(recipe) = self.recipes.remove(recipe_id)
            && let Some(spec) = self.catalog.recipe_spec(recipe.spec)
        {
            self.archive.add_film(ArchivedFilm {
                title: spec.title.clone(),
                genre: spec.genre,
                spec: recipe.spec,
                decision,
                money_paid: money,
                fans_granted: fans,
                reward_multiplier: recipe.reward_multiplier,
                daily_scores: recipe.daily_scores,
            });
        }

        self.bus.emit(StudioEvent::RecipeDistributed { recipe: recipe_id, money, fans });
        Ok(DistributionReport { recipe: recipe_id, money, fans })
    }

    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    /// Collect the persisted state. The caller supplies the wall-clock
    /// timestamp; the engine itself has no clock.
    pub fn snapshot(&self, timestamp: i64) -> SaveSnapshot {
        let currencies = CurrencyType::ALL
            .iter()
            .map(|&currency| CurrencyRecord {
                currency,
                amount: clamp_i32(self.wallet.amount(currency)),
            })
            .collect();

        let mut grid_items = Vec::new();
        for (pos, occupant) in self.grid.occupied_cells() {
            if let Occupant::Item(id) = occupant
                && let Some(def) = self.catalog.item(id)
            {
                grid_items.push(GridItemRecord {
                    x: pos.x as i32,
                    y: pos.y as i32,
                    item_id: def.name.clone(),
                    department: def.department,
                    tier: i32::from(def.tier.0),
                });
            }
        }

        let overflow_items = self
            .overflow
            .items()
            .iter()
            .map(|item| OverflowRecord {
                department: item.department.as_str().to_string(),
                tier: i32::from(item.tier.0),
                base_value: clamp_i32(item.base_value),
            })
            .collect();

        SaveSnapshot {
            version: SAVE_VERSION,
            timestamp,
            currencies,
            grid_items,
            overflow_items,
            overflow_slots: self.overflow.slots() as i32,
            fame_level: self.fame.level() as i32,
            fame_progress: self.fame.progress().to_num::<f32>(),
            universal_crate_timer: self.spawner.universal_timer_hours().to_num::<f32>(),
        }
    }

    /// Restore persisted state from a snapshot. Entries that no longer
    /// resolve against the catalog (renamed items, removed departments) are
    /// skipped rather than failing the load.
    pub fn apply_snapshot(&mut self, snapshot: &SaveSnapshot) {
        for &currency in &CurrencyType::ALL {
            self.wallet.set(currency, 0);
        }
        for record in &snapshot.currencies {
            self.wallet.set(record.currency, i64::from(record.amount));
        }

        // Clear item occupants; crates are runtime-only and stay put.
        for (pos, occupant) in self.grid.occupied_cells() {
            if matches!(occupant, Occupant::Item(_)) {
                self.grid.unregister(pos);
            }
        }
        for record in &snapshot.grid_items {
            let Some(item) = self.catalog.item_id(&record.item_id) else {
                continue;
            };
            let (Ok(x), Ok(y)) = (u32::try_from(record.x), u32::try_from(record.y)) else {
                continue;
            };
            let _ = self.grid.register(GridPos::new(x, y), Occupant::Item(item));
        }

        let overflow_items = snapshot
            .overflow_items
            .iter()
            .filter_map(|record| {
                let department = Department::from_str(&record.department)?;
                let tier = u8::try_from(record.tier).ok()?;
                Some(OverflowItem {
                    department,
                    tier: Tier(tier),
                    base_value: i64::from(record.base_value),
                })
            })
            .collect();
        self.overflow
            .restore(u32::try_from(snapshot.overflow_slots).unwrap_or(0), overflow_items);

        self.fame.restore(
            u32::try_from(snapshot.fame_level).unwrap_or(1),
            Fixed64::from_num(snapshot.fame_progress),
        );
        self.spawner
            .set_universal_timer_hours(Fixed64::from_num(snapshot.universal_crate_timer));
    }

    /// Write a snapshot through the store under the in-flight guard.
    /// Returns `Ok(false)` when a save was already in flight and this
    /// request was dropped.
    pub fn save_to(&mut self, store: &SaveStore, timestamp: i64) -> Result<bool, SaveError> {
        if !self.scheduler.begin_save() {
            return Ok(false);
        }
        let result = store.write(&self.snapshot(timestamp));
        self.scheduler.finish_save();
        result.map(|()| true)
    }

    // -----------------------------------------------------------------------
    // Event helpers
    // -----------------------------------------------------------------------

    fn emit_currency(&mut self, currency: CurrencyType) {
        let amount = self.wallet.amount(currency);
        self.bus.emit(StudioEvent::CurrencyChanged { currency, amount });
    }

    fn emit_overflow_updated(&mut self) {
        self.bus.emit(StudioEvent::OverflowUpdated {
            stored: self.overflow.len(),
            slots: self.overflow.slots(),
        });
    }
}

fn clamp_i32(v: i64) -> i32 {
    v.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

// ===========================================================================
// Tests
// ===========================================================================
