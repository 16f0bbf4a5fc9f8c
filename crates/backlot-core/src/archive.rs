//! The film archive: distributed movies and franchise sequel counters.

use crate::distribution::DistributionDecision;
use crate::fixed::Fixed64;
use crate::id::{Genre, RecipeSpecId};
use std::collections::HashMap;

/// A movie that finished distribution.
#[derive(Debug, Clone)]
pub struct ArchivedFilm {
    pub title: String,
    pub genre: Genre,
    pub spec: RecipeSpecId,
    pub decision: DistributionDecision,
    pub money_paid: i64,
    pub fans_granted: i64,
    pub reward_multiplier: Fixed64,
    pub daily_scores: Vec<i32>,
}

/// Completed-film history plus per-title franchise counts.
#[derive(Debug, Default)]
pub struct FilmArchive {
    films: Vec<ArchivedFilm>,
    franchise_counts: HashMap<String, u32>,
}

impl FilmArchive {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn films(&self) -> &[ArchivedFilm] {
        &self.films
    }

    pub fn add_film(&mut self, film: ArchivedFilm) {
        self.films.push(film);
    }

    /// Count a movie toward its franchise. Empty titles are ignored.
    pub fn register_title(&mut self, title: &str) {
        if title.is_empty() {
            return;
        }
        *self.franchise_counts.entry(title.to_string()).or_insert(0) += 1;
    }

    /// How many movies the franchise has so far (0 for unknown titles).
    pub fn sequel_number(&self, title: &str) -> u32 {
        self.franchise_counts.get(title).copied().unwrap_or(0)
    }
}
