//! Merge resolution: what happens when an item is dropped onto a cell.
//!
//! Three outcomes: move into an empty cell, merge with a matching item, or
//! revert. Compatibility is by (department, tier) with a next tier present —
//! never by identity or spawn order. A merge always lands at the target's
//! position; the tie-break is fixed, not configurable.

use crate::catalog::Catalog;
use crate::grid::{GridPos, GridRegistry, Occupant};
use crate::id::ItemDefId;

/// Why a drop reverted with no registry mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeReject {
    /// The target cell is outside the grid.
    OutOfBounds,
    /// The source cell does not hold a movable item.
    SourceNotItem,
    /// The target holds an occupant items cannot merge into (a crate).
    TargetNotMergeable,
    /// Same cell kinds, but department or tier differ.
    Incompatible,
    /// Matching pair, but the chain has no next tier.
    ChainExhausted,
}

/// Outcome of a drop attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// Source moved into the (empty) target cell.
    Moved { from: GridPos, to: GridPos },
    /// Source and target were consumed; the upgraded item sits at `at`.
    Merged { at: GridPos, item: ItemDefId },
    /// Nothing changed.
    Rejected(MergeReject),
}

/// Resolve a drop of the occupant at `source` onto `target`.
///
/// Dropping a tile back onto its own cell is a successful (trivial) move.
pub fn resolve(
    grid: &mut GridRegistry,
    catalog: &Catalog,
    source: GridPos,
    target: GridPos,
) -> MergeOutcome {
    if !grid.dims().contains(target) {
        return MergeOutcome::Rejected(MergeReject::OutOfBounds);
    }

    let source_item = match grid.occupant_at(source) {
        Occupant::Item(item) => item,
        Occupant::Crate(_) | Occupant::Empty => {
            return MergeOutcome::Rejected(MergeReject::SourceNotItem);
        }
    };

    if source == target {
        return MergeOutcome::Moved { from: source, to: target };
    }

    match grid.occupant_at(target) {
        Occupant::Empty => {
            grid.unregister(source);
            grid.register(target, Occupant::Item(source_item))
                .expect("target bounds checked above");
            MergeOutcome::Moved { from: source, to: target }
        }
        Occupant::Crate(_) => MergeOutcome::Rejected(MergeReject::TargetNotMergeable),
        Occupant::Item(target_item) => {
            match merged_result(catalog, source_item, target_item) {
                Ok(upgraded) => {
                    grid.unregister(source);
                    grid.unregister(target);
                    grid.register(target, Occupant::Item(upgraded))
                        .expect("target bounds checked above");
                    MergeOutcome::Merged { at: target, item: upgraded }
                }
                Err(reject) => MergeOutcome::Rejected(reject),
            }
        }
    }
}

/// The upgraded definition a source/target pair merges into, or why not.
fn merged_result(
    catalog: &Catalog,
    source: ItemDefId,
    target: ItemDefId,
) -> Result<ItemDefId, MergeReject> {
    let (Some(source_def), Some(target_def)) = (catalog.item(source), catalog.item(target)) else {
        return Err(MergeReject::Incompatible);
    };
    if source_def.department != target_def.department || source_def.tier != target_def.tier {
        return Err(MergeReject::Incompatible);
    }
    source_def.next_tier.ok_or(MergeReject::ChainExhausted)
}
