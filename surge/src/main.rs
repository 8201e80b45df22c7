//! Headless host for the healing surge chat commands.
//!
//! Loads a campaign file, reads chat lines from stdin and prints what the
//! table would see:
//!
//! ```bash
//! cargo run -p surge -- --campaign surge/campaign.example.json --seed 7
//! ```
//!
//! Each input line is `<player-id> [@token-id ...] <chat message>`, e.g.
//! `p-sam @tok-thorin !ihs -surge`.

mod headless;

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use surge_core::testing::{Campaign, MemoryHost};
use surge_core::{RouterConfig, SeededDice};

#[derive(Parser, Debug)]
#[command(name = "surge", version, about = "Play healing surge commands against a campaign file")]
struct Args {
    /// Campaign JSON file (characters, tokens, players, macros)
    #[arg(long)]
    campaign: PathBuf,

    /// Router configuration (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the campaign here on exit
    #[arg(long)]
    save: Option<PathBuf>,

    /// Seed for reproducible dice
    #[arg(long)]
    seed: Option<u64>,

    /// Increase verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbosity: u8) {
    let mut builder = env_logger::Builder::new();
    let base_level = match verbosity {
        0 => log::LevelFilter::Info,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    builder.filter_level(base_level);
    // RUST_LOG directives refine the base level
    builder.parse_default_env();
    builder.init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (RUST_LOG)
    dotenvy::dotenv().ok();

    let args = Args::parse();

    init_logging(args.verbose);

    let config = match &args.config {
        Some(path) => RouterConfig::load(path)
            .await
            .with_context(|| format!("loading config {}", path.display()))?,
        None => RouterConfig::default(),
    };

    let json = tokio::fs::read_to_string(&args.campaign)
        .await
        .with_context(|| format!("reading campaign {}", args.campaign.display()))?;
    let campaign = Campaign::from_json(&json).context("parsing campaign")?;
    log::info!(
        "Loaded {} characters, {} tokens, {} players",
        campaign.characters.len(),
        campaign.tokens.len(),
        campaign.players.len()
    );

    let dice = match args.seed {
        Some(seed) => SeededDice::new(seed),
        None => SeededDice::from_entropy(),
    };
    let host = MemoryHost::from_campaign(campaign, dice);
    log::info!("{} ready.", config.feedback_name);

    headless::run_headless(&host, config).await?;

    if let Some(path) = args.save {
        headless::save_campaign(&host, &path).await?;
        println!("[SAVED] Campaign saved to {}", path.display());
    }

    Ok(())
}
