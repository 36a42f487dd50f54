//! Command handlers and plain-text rendering.

use anyhow::{anyhow, Result};

use gamecache_core::utils::truncate_string;
use gamecache_core::{CatalogCache, Category, Game, GameFilter, NewGame};

use crate::Command;

/// Column width for game titles in list output
const TITLE_WIDTH: usize = 32;

/// Column width for category names in list output
const CATEGORY_WIDTH: usize = 16;

pub async fn run(cache: &CatalogCache, command: Command) -> Result<()> {
    match command {
        Command::List { category, search } => {
            let games = match (category.is_empty(), search.is_empty()) {
                (true, true) => cache.games(),
                (false, true) => cache.filter_by_category(&category),
                (true, false) => cache.search(&search),
                (false, false) => cache.filtered(&GameFilter::new(category, search)),
            };
            let favorite_ids = cache.favorite_ids();
            print!(
                "{}",
                render_games(&games, |g| favorite_ids.contains(&g.id), "No games found")
            );
        }
        Command::Categories => print!("{}", render_categories(&cache.categories())),
        Command::Favorites => {
            print!(
                "{}",
                render_games(&cache.favorites(), |_| true, "No favorite games yet!")
            );
        }
        Command::Show { id } => {
            let game = find_game(cache, &id)?;
            print!("{}", render_detail(&game, cache.is_favorite(&id)));
        }
        Command::Add {
            title,
            category,
            price,
            image,
            description,
        } => {
            let candidate = NewGame {
                title,
                category,
                price,
                image,
                description,
            };
            let created = cache
                .add_game(&candidate)
                .await
                .map_err(|e| anyhow!("Failed to add game: {}", e))?;
            println!("Game added successfully! (id {})", created.id);
        }
        Command::Update {
            id,
            title,
            category,
            price,
            image,
            description,
        } => {
            let mut game = find_game(cache, &id)?;
            if let Some(title) = title {
                game.title = title;
            }
            if let Some(category) = category {
                game.category = category;
            }
            if let Some(price) = price {
                game.price = price;
            }
            if let Some(image) = image {
                game.image = image;
            }
            if let Some(description) = description {
                game.description = description;
            }
            let updated = cache
                .update_game(&game)
                .await
                .map_err(|e| anyhow!("Failed to update game: {}", e))?;
            println!("Game updated successfully!");
            print!("{}", render_detail(&updated, cache.is_favorite(&updated.id)));
        }
        Command::Delete { id } => {
            cache
                .delete_game(&id)
                .await
                .map_err(|e| anyhow!("Failed to delete game: {}", e))?;
            println!("Game deleted successfully!");
        }
        Command::Favorite { id } => {
            let game = find_game(cache, &id)?;
            let now_favorite = cache
                .toggle_favorite(&game)
                .await
                .map_err(|e| anyhow!("Failed to save favorites: {}", e))?;
            if now_favorite {
                println!("Added \"{}\" to favorites", game.title);
            } else {
                println!("Removed \"{}\" from favorites", game.title);
            }
        }
        Command::Unfavorite { id } => {
            let removed = cache
                .remove_favorite(&id)
                .await
                .map_err(|e| anyhow!("Failed to save favorites: {}", e))?;
            if removed {
                println!("Removed {} from favorites", id);
            } else {
                println!("{} is not a favorite", id);
            }
        }
        Command::Refresh => {
            let report = cache.refresh().await;
            for failure in &report.failures {
                eprintln!("Warning: {}", failure);
            }
            if !report.is_clean() {
                return Err(anyhow!("Failed to refresh the catalog"));
            }
            println!(
                "Catalog refreshed: {} games, {} categories",
                cache.games().len(),
                cache.categories().len()
            );
        }
        Command::SetUrl { .. } => {
            return Err(anyhow!("set-url is handled before the catalog loads"));
        }
    }
    Ok(())
}

fn find_game(cache: &CatalogCache, id: &str) -> Result<Game> {
    cache
        .game(id)
        .ok_or_else(|| anyhow!("Game not found: {}", id))
}

fn render_games(games: &[Game], is_favorite: impl Fn(&Game) -> bool, empty: &str) -> String {
    if games.is_empty() {
        return format!("{}\n", empty);
    }
    games
        .iter()
        .map(|game| {
            format!(
                "{} {:<6} {:<title_w$} {:<cat_w$} {}\n",
                if is_favorite(game) { "*" } else { " " },
                game.id,
                truncate_string(&game.title, TITLE_WIDTH),
                truncate_string(&game.category, CATEGORY_WIDTH),
                game.price_display(),
                title_w = TITLE_WIDTH,
                cat_w = CATEGORY_WIDTH,
            )
        })
        .collect()
}

fn render_categories(categories: &[Category]) -> String {
    if categories.is_empty() {
        return "No categories available\n".to_string();
    }
    categories
        .iter()
        .map(|c| format!("{}\n", c.name))
        .collect()
}

fn render_detail(game: &Game, favorite: bool) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}{}\n", game.title, if favorite { " *" } else { "" }));
    out.push_str(&format!("  Id:       {}\n", game.id));
    out.push_str(&format!("  Category: {}\n", game.category));
    out.push_str(&format!("  Price:    {}\n", game.price_display()));
    out.push_str(&format!(
        "  Image:    {}\n",
        game.image_url().unwrap_or("(placeholder logo)")
    ));
    if !game.description.is_empty() {
        out.push_str(&format!("  {}\n", game.description));
    }
    out
}
