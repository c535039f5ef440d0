//! Norse CCG - command line driver
//!
//! Runs seeded AI-vs-AI matches and validates card catalogs.

use anyhow::Context;
use clap::{Parser, Subcommand};
use norse_ccg::{
    ai::{play_match, AutoTurnRunner},
    config::EngineConfig,
    core::Side,
    game::{Engine, OutputMode, VerbosityLevel},
    loader::{CardCatalog, DeckLoader, MatchBuilder},
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Verbosity level for game output (names or numbers)
#[derive(Debug, Clone, Copy)]
struct VerbosityArg(VerbosityLevel);

impl std::str::FromStr for VerbosityArg {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "silent" | "0" => Ok(VerbosityArg(VerbosityLevel::Silent)),
            "minimal" | "1" => Ok(VerbosityArg(VerbosityLevel::Minimal)),
            "normal" | "2" => Ok(VerbosityArg(VerbosityLevel::Normal)),
            "verbose" | "3" => Ok(VerbosityArg(VerbosityLevel::Verbose)),
            _ => Err(format!(
                "invalid verbosity level '{s}' (expected: silent/0, minimal/1, normal/2, verbose/3)"
            )),
        }
    }
}

#[derive(Parser)]
#[command(name = "ccg")]
#[command(about = "Norse CCG - combat and trigger-resolution engine", long_about = None)]
struct Cli {
    /// Engine configuration (JSON); defaults apply to missing fields
    #[arg(long, global = true, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Card catalog (JSON array of definitions)
    #[arg(long, global = true, default_value = "catalog/core.json")]
    catalog: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a seeded AI-vs-AI match
    Simulate {
        /// Deck list for the player side
        #[arg(long, default_value = "decks/valkyrie.json")]
        deck1: PathBuf,

        /// Deck list for the opponent side
        #[arg(long, default_value = "decks/jotun.json")]
        deck2: PathBuf,

        /// Random seed (overrides the config)
        #[arg(long)]
        seed: Option<u64>,

        /// Stop after this many turns
        #[arg(long, default_value = "60")]
        max_turns: u32,

        /// Game log echo level (0=silent, 1=minimal, 2=normal, 3=verbose)
        #[arg(long, short = 'v', default_value = "normal")]
        verbosity: VerbosityArg,

        /// Pace automated turns with the configured action delay
        #[arg(long)]
        paced: bool,
    },

    /// Load a catalog and report skipped entries and unknown effects
    Validate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => EngineConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => EngineConfig::default(),
    };

    match cli.command {
        Commands::Simulate {
            deck1,
            deck2,
            seed,
            max_turns,
            verbosity,
            paced,
        } => run_simulate(config, &cli.catalog, &deck1, &deck2, seed, max_turns, verbosity.0, paced).await?,
        Commands::Validate => run_validate(&cli.catalog).await?,
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn run_simulate(
    config: EngineConfig,
    catalog_path: &Path,
    deck1: &Path,
    deck2: &Path,
    seed: Option<u64>,
    max_turns: u32,
    verbosity: VerbosityLevel,
    paced: bool,
) -> anyhow::Result<()> {
    let (catalog, report) = CardCatalog::load_async(catalog_path)
        .await
        .with_context(|| format!("loading catalog {}", catalog_path.display()))?;
    if !report.is_clean() {
        eprintln!("catalog: {} loaded, {} problem(s); run `ccg validate` for details", report.loaded, report.errors().len());
    }

    let mut builder = MatchBuilder::new(Arc::new(catalog))
        .config(config.clone())
        .deck(Side::Player, DeckLoader::load_from_file(deck1)?)
        .deck(Side::Opponent, DeckLoader::load_from_file(deck2)?);
    if let Some(seed) = seed {
        builder = builder.seed(seed);
    }
    let mut state = builder.build()?;
    state.log.set_verbosity(verbosity);
    if verbosity > VerbosityLevel::Silent {
        state.log.set_output_mode(OutputMode::Both);
    }

    let mut engine = Engine::new(state);
    let winner = if paced {
        let shared = Arc::new(tokio::sync::Mutex::new(engine));
        let runner = AutoTurnRunner::new(Arc::clone(&shared), &config);
        let winner = runner.run_match(max_turns).await?;
        engine = Arc::try_unwrap(shared)
            .map_err(|_| anyhow::anyhow!("engine still shared after the match"))?
            .into_inner();
        winner
    } else {
        play_match(&mut engine, max_turns)?
    };

    let state = engine.state();
    println!();
    match winner {
        Some(side) => println!("Winner: {} ({}) on turn {}", side, state.player(side).hero_name, state.turn_number()),
        None => println!("No winner after {} turns", state.turn_number().min(max_turns)),
    }
    for side in Side::BOTH {
        let player = state.player(side);
        println!(
            "  {} {}: {} health, {} armor, {} minion(s), {} card(s) in deck",
            side,
            player.hero_name,
            player.hero_health,
            player.hero_armor,
            player.battlefield.len(),
            player.deck.len()
        );
    }
    println!("  {} log entries, {} events published", state.log.len(), engine.bus().published());
    Ok(())
}

async fn run_validate(catalog_path: &Path) -> anyhow::Result<()> {
    let (catalog, report) = CardCatalog::load_async(catalog_path)
        .await
        .with_context(|| format!("loading catalog {}", catalog_path.display()))?;
    println!("{}: {} card(s) loaded", catalog_path.display(), report.loaded);
    for skipped in &report.skipped {
        let id = skipped.id.map_or_else(|| "?".to_string(), |id| id.to_string());
        println!("  skipped entry {} (id {}): {}", skipped.index, id, skipped.reason);
    }
    for (card, ty) in &report.unknown_effects {
        println!("  {card}: unknown effect type '{ty}' will be ignored");
    }
    let collectible = catalog.collectible().count();
    println!("  {} collectible, {} generated-only", collectible, catalog.len() - collectible);
    if !report.is_clean() {
        anyhow::bail!("catalog has {} problem(s)", report.errors().len());
    }
    Ok(())
}
