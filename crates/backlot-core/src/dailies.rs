//! Dailies: the synchronization gate between production and distribution,
//! plus the 4x4 slide-and-merge board the attempts are played on.
//!
//! Every production milestone banks one dailies attempt for its recipe. The
//! recipe is released to distribution only once production has completed
//! AND every banked attempt has been resolved (played or skipped) — exactly
//! one release, for any arrival order of milestones, resolutions and the
//! completion event.

use crate::catalog::DailiesRules;
use crate::id::RecipeId;
use crate::rng::SimRng;
use slotmap::SecondaryMap;

// ---------------------------------------------------------------------------
// Synchronization gate
// ---------------------------------------------------------------------------

/// Per-recipe reconciliation state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DailiesState {
    pub pending_attempts: u32,
    pub production_complete: bool,
}

impl DailiesState {
    fn releasable(&self) -> bool {
        self.production_complete && self.pending_attempts == 0
    }
}

/// How a dailies attempt was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DailyResolution {
    Skip,
    /// Played to the end with a non-negative score.
    Played { score: i32 },
}

/// Reconciles milestone arrivals against attempt resolutions and the
/// completion event. Tracking entries are dropped on release, which is what
/// makes the release fire exactly once.
#[derive(Debug, Default)]
pub struct DailiesSync {
    states: SecondaryMap<RecipeId, DailiesState>,
}

impl DailiesSync {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, recipe: RecipeId) -> Option<DailiesState> {
        self.states.get(recipe).copied()
    }

    pub fn tracked_count(&self) -> usize {
        self.states.len()
    }

    /// A milestone fired: bank one attempt.
    pub fn on_milestone(&mut self, recipe: RecipeId) {
        self.states
            .entry(recipe)
            .unwrap()
            .or_insert_with(DailiesState::default)
            .pending_attempts += 1;
    }

    /// Production finished. Returns the recipe if this satisfied the release
    /// condition (no attempts outstanding).
    pub fn on_production_complete(&mut self, recipe: RecipeId) -> Option<RecipeId> {
        self.states
            .entry(recipe)
            .unwrap()
            .or_insert_with(DailiesState::default)
            .production_complete = true;
        self.try_release(recipe)
    }

    /// An attempt was resolved (played or skipped). Pending attempts floor
    /// at zero. Returns the recipe if this satisfied the release condition.
    pub fn on_attempt_resolved(&mut self, recipe: RecipeId) -> Option<RecipeId> {
        let Some(state) = self.states.get_mut(recipe) else {
            return None;
        };
        state.pending_attempts = state.pending_attempts.saturating_sub(1);
        self.try_release(recipe)
    }

    fn try_release(&mut self, recipe: RecipeId) -> Option<RecipeId> {
        if self.states.get(recipe)?.releasable() {
            self.states.remove(recipe);
            Some(recipe)
        } else {
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Dailies board
// ---------------------------------------------------------------------------

pub const BOARD_SIZE: usize = 4;

/// Slide direction for a board move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlideDir {
    Left,
    Right,
    Up,
    Down,
}

impl SlideDir {
    fn delta(self) -> (i32, i32) {
        match self {
            SlideDir::Left => (-1, 0),
            SlideDir::Right => (1, 0),
            SlideDir::Up => (0, 1),
            SlideDir::Down => (0, -1),
        }
    }
}

/// Result of one slide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlideOutcome {
    pub moved: bool,
    pub merges: u32,
    pub ended: bool,
}

/// The 4x4 slide-and-merge puzzle. Tiles of equal level combine when slid
/// together, once per cell per move. Moves cost budget, merges refund some;
/// the puzzle ends when the budget is gone or no move remains. The final
/// score is the remaining budget floored at zero.
#[derive(Debug, Clone)]
pub struct DailiesBoard {
    cells: [[Option<u8>; BOARD_SIZE]; BOARD_SIZE],
    budget: i32,
    rules: DailiesRules,
    ended: bool,
}

impl DailiesBoard {
    /// A fresh board with two seeded tiles.
    pub fn new(rules: DailiesRules, rng: &mut SimRng) -> Self {
        let mut board = Self {
            cells: [[None; BOARD_SIZE]; BOARD_SIZE],
            budget: rules.starting_budget,
            rules,
            ended: false,
        };
        board.spawn_tile(rng);
        board.spawn_tile(rng);
        board
    }

    pub fn level_at(&self, x: usize, y: usize) -> Option<u8> {
        self.cells[x][y]
    }

    pub fn budget(&self) -> i32 {
        self.budget
    }

    pub fn ended(&self) -> bool {
        self.ended
    }

    /// The score this board reports when confirmed.
    pub fn score(&self) -> i32 {
        self.budget.max(0)
    }

    /// Slide every tile in `dir`. A move that shifts or merges anything
    /// costs `move_cost`, refunds `merge_savings` per merge, and spawns one
    /// new tile. A no-op slide changes nothing.
    pub fn slide(&mut self, dir: SlideDir, rng: &mut SimRng) -> SlideOutcome {
        if self.ended {
            return SlideOutcome { moved: false, merges: 0, ended: true };
        }

        let (dx, dy) = dir.delta();
        let mut merged = [[false; BOARD_SIZE]; BOARD_SIZE];
        let mut moved = false;
        let mut merges = 0u32;

        // Walk cells starting from the edge the tiles move toward.
        let xs: Vec<usize> = if dx > 0 { (0..BOARD_SIZE).rev().collect() } else { (0..BOARD_SIZE).collect() };
        let ys: Vec<usize> = if dy > 0 { (0..BOARD_SIZE).rev().collect() } else { (0..BOARD_SIZE).collect() };

        for &x in &xs {
            for &y in &ys {
                let Some(level) = self.cells[x][y] else { continue };
                let (mut cx, mut cy) = (x, y);
                loop {
                    let tx = cx as i32 + dx;
                    let ty = cy as i32 + dy;
                    if !(0..BOARD_SIZE as i32).contains(&tx) || !(0..BOARD_SIZE as i32).contains(&ty) {
                        break;
                    }
                    let (tx, ty) = (tx as usize, ty as usize);
                    match self.cells[tx][ty] {
                        None => {
                            self.cells[tx][ty] = Some(level);
                            self.cells[cx][cy] = None;
                            cx = tx;
                            cy = ty;
                            moved = true;
                        }
                        Some(other) if other == level && !merged[tx][ty] => {
                            self.cells[tx][ty] = Some(level + 1);
                            self.cells[cx][cy] = None;
                            merged[tx][ty] = true;
                            merges += 1;
                            self.budget += self.rules.merge_savings;
                            moved = true;
                            break;
                        }
                        Some(_) => break,
                    }
                }
            }
        }

        if moved {
            self.budget -= self.rules.move_cost;
            self.spawn_tile(rng);
            if self.budget <= 0 || !self.any_move_left() {
                self.ended = true;
            }
        }

        SlideOutcome { moved, merges, ended: self.ended }
    }

    fn spawn_tile(&mut self, rng: &mut SimRng) {
        let mut empty = Vec::new();
        for x in 0..BOARD_SIZE {
            for y in 0..BOARD_SIZE {
                if self.cells[x][y].is_none() {
                    empty.push((x, y));
                }
            }
        }
        if empty.is_empty() {
            return;
        }
        let (x, y) = empty[rng.next_index(empty.len())];
        // Nine in ten spawns are level 1.
        let level = if rng.next_index(10) < 9 { 1 } else { 2 };
        self.cells[x][y] = Some(level);
    }

    fn any_move_left(&self) -> bool {
        for x in 0..BOARD_SIZE {
            for y in 0..BOARD_SIZE {
                let Some(level) = self.cells[x][y] else {
                    return true;
                };
                if x + 1 < BOARD_SIZE
                    && (self.cells[x + 1][y].is_none() || self.cells[x + 1][y] == Some(level))
                {
                    return true;
                }
                if y + 1 < BOARD_SIZE
                    && (self.cells[x][y + 1].is_none() || self.cells[x][y + 1] == Some(level))
                {
                    return true;
                }
            }
        }
        false
    }
}

// ===========================================================================
// Tests
// ===========================================================================
