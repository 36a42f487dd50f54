//! Derived views over the games collection.
//!
//! Every view is computed from the full, unfiltered collection it is given,
//! so views never compound on each other.

use crate::models::Game;
use crate::utils::contains_ignore_case;

/// Category name meaning "all categories"
pub const ALL_CATEGORIES: &str = "";

/// Games whose category equals `category` exactly (no case folding).
/// `ALL_CATEGORIES` returns the whole collection.
pub fn filter_by_category(games: &[Game], category: &str) -> Vec<Game> {
    if category == ALL_CATEGORIES {
        return games.to_vec();
    }
    games
        .iter()
        .filter(|game| game.category == category)
        .cloned()
        .collect()
}

/// Games whose title contains `query`, ignoring case. An empty query returns everything.
pub fn search(games: &[Game], query: &str) -> Vec<Game> {
    games
        .iter()
        .filter(|game| contains_ignore_case(&game.title, query))
        .cloned()
        .collect()
}

/// Category and title filters applied together.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GameFilter {
    pub category: String,
    pub query: String,
}

impl GameFilter {
    pub fn new(category: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            query: query.into(),
        }
    }

    pub fn matches(&self, game: &Game) -> bool {
        (self.category == ALL_CATEGORIES || game.category == self.category)
            && contains_ignore_case(&game.title, &self.query)
    }

    pub fn apply(&self, games: &[Game]) -> Vec<Game> {
        games.iter().filter(|game| self.matches(game)).cloned().collect()
    }
}
