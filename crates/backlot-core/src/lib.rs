//! Backlot Core -- the simulation backend of a studio-management merge game.
//!
//! This crate provides the grid occupancy registry, merge resolution, crate
//! spawning, the production timer state machine, the dailies-vs-production
//! synchronization gate, the distribution queue, and the binary save codec
//! that the game client drives.
//!
//! # Five-Phase Tick
//!
//! Each call to [`engine::StudioEngine::advance`] moves the simulation one
//! frame forward through the following phases:
//!
//! 1. **Crate drain** -- spent crates whose removal delay elapsed leave the
//!    grid.
//! 2. **Universal crate** -- the long-interval free-crate timer.
//! 3. **Production** -- elapsed time updates, then every crossed milestone
//!    fires in ascending order, then completion; milestones and completions
//!    feed the dailies gate, which releases recipes to distribution.
//! 4. **Scheduler** -- autosave/backup cadence flags accumulate.
//! 5. **Delivery** -- buffered events reach observers in registration order
//!    and are returned as data.
//!
//! Commands (merges, crate uses, purchases, production starts, dailies and
//! distribution resolutions) are explicit method calls between ticks; there
//! is no parallel mutation of shared state anywhere.
//!
//! # Key Types
//!
//! - [`engine::StudioEngine`] -- the context object owning every subsystem.
//! - [`grid::GridRegistry`] -- authoritative cell-to-occupant map.
//! - [`merge`] -- move/merge/revert resolution over the registry.
//! - [`spawn::CrateSpawnEngine`] -- weighted drops and crate depletion.
//! - [`production::ProductionPipeline`] -- `Idle -> Producing -> Completed`.
//! - [`dailies::DailiesSync`] -- the exactly-once distribution hand-off.
//! - [`distribution::DistributionQueue`] -- FIFO single-active sequencer.
//! - [`save`] -- fixed-layout binary codec, atomic writes, backup fallback.
//! - [`catalog::Catalog`] -- immutable content registry (frozen at startup).
//! - [`fixed::Fixed64`] -- Q32.32 fixed-point for deterministic math.

pub mod archive;
pub mod catalog;
pub mod dailies;
pub mod distribution;
pub mod economy;
pub mod engine;
pub mod event;
pub mod fixed;
pub mod grid;
pub mod id;
pub mod merge;
pub mod overflow;
pub mod production;
pub mod recipe;
pub mod rng;
pub mod save;
pub mod spawn;
pub mod talent;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
