//! Data models for catalog entities.
//!
//! This module contains the data structures exchanged with the catalog
//! service and mirrored in the local store:
//!
//! - `Game`: a catalog entry, also stored as a denormalized favorite copy
//! - `Category`: read-only grouping, referenced from games by name
//! - `NewGame`, `GameDraft`: raw form input and its validated form

pub mod category;
pub mod game;

mod lenient;

pub use category::Category;
pub use game::{Game, GameDraft, NewGame, ValidationError};
