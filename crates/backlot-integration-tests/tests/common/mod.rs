//! Shared helpers for the integration scenarios.

// Not every scenario file uses every helper.
#![allow(dead_code)]

use backlot_core::engine::StudioEngine;
use backlot_core::event::StudioEvent;
use backlot_core::fixed::Seconds;
use backlot_core::grid::GridPos;
use backlot_core::id::{Department, RecipeId, RecipeSpecId, TalentRole};
use backlot_core::save::GridItemRecord;
use backlot_core::test_utils::{hire_drama_trio, item_name};

/// Place a fixture item on the grid through the public snapshot surface.
pub fn place_item(engine: &mut StudioEngine, pos: GridPos, dept: Department, tier: u8) {
    let mut snapshot = engine.snapshot(0);
    snapshot.grid_items.push(GridItemRecord {
        x: pos.x as i32,
        y: pos.y as i32,
        item_id: item_name(dept, tier),
        department: dept,
        tier: i32::from(tier),
    });
    engine.apply_snapshot(&snapshot);
}

/// Hire the drama trio, create a recipe, cover the required departments
/// from the grid, and assign everyone.
pub fn build_ready_recipe(engine: &mut StudioEngine) -> RecipeId {
    let (w, d, a) = hire_drama_trio(engine);
    let recipe = engine.create_recipe(RecipeSpecId(0)).expect("fixture spec 0");
    engine.assign_talent(recipe, TalentRole::Writer, Some(w)).unwrap();
    engine.assign_talent(recipe, TalentRole::Director, Some(d)).unwrap();
    engine.assign_talent(recipe, TalentRole::Actor, Some(a)).unwrap();

    for (i, dept) in Department::REQUIRED.iter().enumerate() {
        let pos = GridPos::new(i as u32, 0);
        place_item(engine, pos, *dept, 0);
        engine.submit_item(recipe, pos).unwrap();
    }
    recipe
}

/// Advance in 10-second frames, collecting every event.
pub fn run_seconds(engine: &mut StudioEngine, seconds: u64) -> Vec<StudioEvent> {
    let mut events = Vec::new();
    let frames = seconds / 10;
    for _ in 0..frames {
        events.extend(engine.advance(Seconds::from_num(10)));
    }
    events
}
