//! The production pipeline: a per-recipe timer state machine.
//!
//! `Idle -> Producing -> Completed`. A start is validated in full before any
//! mutation; a rejected start has no side effects. While producing, each
//! `advance` updates elapsed time first, then drains every crossed milestone
//! in ascending order, then completes — so a milestone coinciding with 100%
//! still fires before the completion event.

use crate::catalog::{Catalog, SynergyTable};
use crate::fixed::{Fixed64, Seconds, clamp01, round_to_i64};
use crate::id::{Department, RecipeId};
use crate::recipe::Recipe;
use crate::talent::TalentInventory;
use std::collections::VecDeque;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Why a production start was rejected. No partial mutation ever occurs on
/// rejection.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum StartError {
    #[error("production already in progress")]
    AlreadyProducing,
    #[error("missing required departments: {missing:?}")]
    MissingDepartments { missing: Vec<Department> },
    #[error("all talent slots must be filled ({assigned}/3 assigned)")]
    InsufficientTalent { assigned: u32 },
    #[error("an assigned talent is locked or out of uses")]
    TalentUnavailable,
    #[error("unknown recipe")]
    UnknownRecipe,
    #[error("unknown recipe spec")]
    UnknownSpec,
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Timer state for the active production.
#[derive(Debug, Clone)]
pub struct ProductionState {
    pub recipe: RecipeId,
    pub total: Seconds,
    pub elapsed: Seconds,
    /// Ascending milestone fractions not yet fired.
    milestones: VecDeque<Fixed64>,
}

impl ProductionState {
    pub fn progress(&self) -> Fixed64 {
        if self.total <= Seconds::ZERO {
            // A zero-duration production is instantly complete.
            return Fixed64::from_num(1);
        }
        clamp01(self.elapsed / self.total)
    }
}

/// The pipeline's phase.
#[derive(Debug, Clone, Default)]
pub enum Phase {
    #[default]
    Idle,
    Producing(ProductionState),
    /// Finished; waiting for the engine to collect the recipe.
    Completed {
        recipe: RecipeId,
    },
}

/// What a production start computed, for the engine to act on (franchise
/// registration on synergy).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartOutcome {
    pub duration: Seconds,
    pub missing_optional: u32,
    pub synergy_applied: bool,
}

/// Timer events produced by one `advance` step, in firing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductionTick {
    Progress { recipe: RecipeId, fraction: Fixed64 },
    Milestone { recipe: RecipeId, fraction: Fixed64 },
    Completed { recipe: RecipeId },
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// One production slot. A second start while producing is rejected outright;
/// there is no preemption.
#[derive(Debug)]
pub struct ProductionPipeline {
    phase: Phase,
    /// Ascending progress fractions every production schedules.
    milestone_fractions: Vec<Fixed64>,
}

impl ProductionPipeline {
    /// `milestone_fractions` is sorted and deduplicated once here so every
    /// production schedules the same ascending queue.
    pub fn new(mut milestone_fractions: Vec<Fixed64>) -> Self {
        milestone_fractions.sort_unstable();
        milestone_fractions.dedup();
        Self {
            phase: Phase::Idle,
            milestone_fractions,
        }
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn is_producing(&self) -> bool {
        matches!(self.phase, Phase::Producing(_))
    }

    pub fn active_recipe(&self) -> Option<RecipeId> {
        match &self.phase {
            Phase::Idle => None,
            Phase::Producing(state) => Some(state.recipe),
            Phase::Completed { recipe } => Some(*recipe),
        }
    }

    /// Start producing `recipe`. Validates everything before mutating:
    /// required-department coverage, talent count (all three unless the spec
    /// allows partial), and that every assigned talent is usable. On success
    /// the rewards are written to the recipe, the talents are locked, and
    /// the timer starts.
    pub fn start(
        &mut self,
        recipe_id: RecipeId,
        recipe: &mut Recipe,
        catalog: &Catalog,
        talents: &mut TalentInventory,
        synergy: &SynergyTable,
    ) -> Result<StartOutcome, StartError> {
        if self.is_producing() {
            return Err(StartError::AlreadyProducing);
        }
        let spec = catalog.recipe_spec(recipe.spec).ok_or(StartError::UnknownSpec)?;

        let missing = recipe.missing_required(catalog);
        if !missing.is_empty() {
            return Err(StartError::MissingDepartments { missing });
        }

        let assigned = recipe.talents.count();
        if !spec.allow_partial_talent && assigned < 3 {
            return Err(StartError::InsufficientTalent { assigned });
        }
        for id in recipe.talents.assigned() {
            let usable = talents.card(id).is_some_and(|card| card.is_usable());
            if !usable {
                return Err(StartError::TalentUnavailable);
            }
        }

        // Validation passed; from here on the start is committed.
        let one = Fixed64::from_num(1);
        let missing_optional = recipe.missing_optional(catalog);
        let missing_fixed = Fixed64::from_num(missing_optional);

        let duration = spec.base_duration * (one + spec.time_penalty * missing_fixed);
        let mut money =
            Fixed64::from_num(spec.base_money_reward) * (one - spec.money_penalty * missing_fixed);
        let mut fans =
            Fixed64::from_num(spec.base_fan_reward) * (one - spec.fan_penalty * missing_fixed);

        let synergy_applied =
            spec.grant_synergy_bonus && recipe.has_genre_synergy(talents, catalog);
        if synergy_applied {
            let tier = recipe.highest_tier(talents, catalog);
            let bonus = synergy.bonus_for_tier(tier);
            money *= one + bonus;
            fans *= one + bonus;
        }

        recipe.money_reward = round_to_i64(money);
        recipe.fan_reward = round_to_i64(fans);

        for id in recipe.talents.assigned() {
            talents.lock(id);
        }

        self.phase = Phase::Producing(ProductionState {
            recipe: recipe_id,
            total: duration,
            elapsed: Seconds::ZERO,
            milestones: self.milestone_fractions.iter().copied().collect(),
        });

        Ok(StartOutcome {
            duration,
            missing_optional,
            synergy_applied,
        })
    }

    /// Advance the timer. Elapsed time updates before milestone detection;
    /// every milestone crossed by this step fires, in ascending order, and a
    /// milestone landing exactly on 100% fires before `Completed`.
    pub fn advance(&mut self, dt: Seconds) -> Vec<ProductionTick> {
        let Phase::Producing(state) = &mut self.phase else {
            return Vec::new();
        };

        state.elapsed += dt;
        let progress = state.progress();
        let recipe = state.recipe;

        let mut ticks = vec![ProductionTick::Progress { recipe, fraction: progress }];

        while let Some(&front) = state.milestones.front() {
            if progress < front {
                break;
            }
            state.milestones.pop_front();
            ticks.push(ProductionTick::Milestone { recipe, fraction: front });
        }

        if progress >= Fixed64::from_num(1) {
            ticks.push(ProductionTick::Completed { recipe });
            self.phase = Phase::Completed { recipe };
        }

        ticks
    }

    /// Collect the finished recipe and return the pipeline to `Idle`.
    pub fn take_completed(&mut self) -> Option<RecipeId> {
        if let Phase::Completed { recipe } = self.phase {
            self.phase = Phase::Idle;
            Some(recipe)
        } else {
            None
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================
