//! Offline operator tools for the engine: load a world-state/catalog JSON
//! snapshot from disk and run a read-only report or a single mutating
//! admin action against it, without needing a live chat transport.

use std::fs;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use wasteland_bot::catalog::Catalog;
use wasteland_bot::model::item::Item;
use wasteland_bot::model::WorldState;

#[derive(Parser)]
#[command(name = "engine-cli")]
#[command(about = "Offline operator tools for the wasteland-bot engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the top 10 survivors from a world-state snapshot.
    Leaderboard {
        /// Path to a JSON-serialized WorldState snapshot.
        state: PathBuf,
    },
    /// Print the top 10 clans by points from a world-state snapshot.
    ClanTop {
        /// Path to a JSON-serialized WorldState snapshot.
        state: PathBuf,
    },
    /// Print one player's inventory and core stats.
    Inspect {
        /// Path to a JSON-serialized WorldState snapshot.
        state: PathBuf,
        /// Player id to inspect.
        player_id: i64,
    },
    /// Validate a catalog JSON file for structural problems (shape).
    ValidateCatalog {
        /// Path to a JSON array of catalog items.
        catalog: PathBuf,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    match cli.command {
        Commands::Leaderboard { state } => run_leaderboard(&state),
        Commands::ClanTop { state } => run_clan_top(&state),
        Commands::Inspect { state, player_id } => run_inspect(&state, player_id),
        Commands::ValidateCatalog { catalog } => run_validate_catalog(&catalog),
    }
}

fn load_state(path: &PathBuf) -> WorldState {
    let raw = fs::read_to_string(path).expect("failed to read world-state snapshot");
    serde_json::from_str(&raw).expect("snapshot is not a valid WorldState")
}

fn run_leaderboard(path: &PathBuf) {
    let state = load_state(path);
    let mut players: Vec<_> = state.players.values().collect();
    players.sort_by(|a, b| b.survival_days.cmp(&a.survival_days));
    for (i, p) in players.into_iter().take(10).enumerate() {
        println!("{:>2}. {:<24} {} days (best {})", i + 1, p.name, p.survival_days, p.best_survival_days);
    }
}

fn run_clan_top(path: &PathBuf) {
    let state = load_state(path);
    let mut clans: Vec<_> = state.clans.values().collect();
    clans.sort_by(|a, b| b.points.cmp(&a.points));
    for (i, c) in clans.into_iter().take(10).enumerate() {
        println!("{:>2}. {:<24} {} pts ({} members)", i + 1, c.name, c.points, c.members.len());
    }
}

fn run_inspect(path: &PathBuf, player_id: i64) {
    let state = load_state(path);
    let Some(player) = state.players.get(&player_id) else {
        println!("no player with id {player_id} in this snapshot");
        return;
    };
    println!("{} (id {})", player.name, player.id);
    println!(" hp: {}/{}", player.hp, player.max_hp);
    println!(" infection: {} crimecoins: {}", player.infection, player.crimecoins);
    println!(" survival_days: {} (best {})", player.survival_days, player.best_survival_days);
    println!(" clan: {:?}", player.clan_id);
    for (label, slot) in [
        ("armor", &player.inventory.armor),
        ("helmet", &player.inventory.helmet),
        ("weapon", &player.inventory.weapon),
        ("mutation", &player.inventory.mutation),
        ("extra", &player.inventory.extra),
        ("sign", &player.inventory.sign),
    ] {
        match slot {
            Some(item) => println!(" {label}: {}", item.name),
            None => println!(" {label}: (empty)"),
        }
    }
}

fn run_validate_catalog(path: &PathBuf) {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) => {
            println!("[ERROR] failed to read file: {e}");
            return;
        }
    };
    let items: Vec<Item> = match serde_json::from_str(&raw) {
        Ok(items) => items,
        Err(e) => {
            println!("[ERROR] invalid JSON: {e}");
            return;
        }
    };

    let mut errors = 0;
    let mut warnings = 0;
    for (i, item) in items.iter().enumerate() {
        if item.name.trim().is_empty() {
            println!("[ERROR] items[{i}] has an empty name");
            errors += 1;
        }
        if item.chance < 0.0 {
            println!("[ERROR] items[{i}] ({}) has a negative chance", item.name);
            errors += 1;
        }
        if item.case_eligible && item.case_types.is_empty() {
            println!("[WARN] items[{i}] ({}) is case_eligible but lists no case_types", item.name);
            warnings += 1;
        }
    }

    let catalog = Catalog::load(items);
    println!("loaded {} items into catalog", catalog.all().len());
    println!("validation complete: {errors} errors, {warnings} warnings");
}
