use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use rematch_api::{ClientConfig, Platform, PlayerProfile, default_resolver};
use tracing::Level;
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Look up Rematch player profiles and recent matches",
    long_about = None
)]
struct Args {
    /// The username or platform ID to look up
    username: Option<String>,

    /// Restrict the lookup to one platform (steam, playstation, xbox)
    #[arg(short, long)]
    platform: Option<String>,

    /// List the newest tracked matches instead of looking up a player
    #[arg(long, value_name = "COUNT")]
    recent: Option<usize>,

    /// Where the signing secret is cached between runs
    #[arg(long, env = "REMATCH_CACHE_FILE")]
    cache_file: Option<PathBuf>,

    /// Chromium executable used for signing-key extraction
    #[arg(long, env = "REMATCH_BROWSER")]
    browser: Option<PathBuf>,

    /// Output the result in JSON format
    #[clap(long)]
    json: bool,

    /// Only log errors
    #[arg(short, long)]
    quiet: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose, args.quiet)?;

    let mut config = ClientConfig::default();
    if let Some(path) = args.cache_file {
        config = config.with_cache_path(path);
    }
    if let Some(path) = args.browser {
        config = config.with_browser_executable(path);
    }
    let resolver = default_resolver(config);

    if let Some(count) = args.recent {
        let matches = resolver
            .api()
            .recent_matches(count)
            .await
            .context("Failed to fetch recent matches")?;
        if args.json {
            println!("{}", serde_json::to_string_pretty(&matches)?);
        } else if matches.is_empty() {
            println!("{}", "No recent matches available.".yellow());
        } else {
            println!("{}", "Recent Matches:".green().bold());
            for item in &matches {
                println!("  {}", summarize_match(item).cyan());
            }
        }
        return Ok(());
    }

    let Some(username) = args.username else {
        anyhow::bail!("Provide a username to look up, or --recent to list matches.");
    };
    let platform = args
        .platform
        .as_deref()
        .map(Platform::from_str)
        .transpose()
        .context("Unknown platform")?;

    let pb = spinner("Looking up player...");
    let result = match platform {
        Some(platform) => resolver.search_user_by_platform(&username, platform).await,
        None => resolver.search_user_multi_platform(&username).await,
    };
    let profile = match result {
        Ok(profile) => profile,
        Err(e) => {
            pb.finish_and_clear();
            return Err(e).with_context(|| format!("Failed to look up \"{username}\""));
        }
    };
    pb.finish_with_message("Done");

    let Some(profile) = profile else {
        println!(
            "{}",
            format!("No tracked profile found for \"{username}\".").yellow()
        );
        return Ok(());
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&profile)?);
        return Ok(());
    }

    print_profile(&profile);
    Ok(())
}

fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.enable_steady_tick(Duration::from_millis(120));
    pb.set_style(
        ProgressStyle::with_template("{spinner:.blue} {msg}")
            .unwrap()
            .tick_strings(&[
                "▹▹▹▹▹",
                "▸▹▹▹▹",
                "▹▸▹▹▹",
                "▹▹▸▹▹",
                "▹▹▹▸▹",
                "▹▹▹▹▸",
                "▪▪▪▪▪",
            ]),
    );
    pb.set_message(message.to_string());
    pb
}

fn print_profile(profile: &PlayerProfile) {
    println!("\n{}", "Player Profile:".green().bold());

    println!("{} {}", "Name:".green(), profile.display_name.cyan());
    if !profile.platform.is_empty() {
        println!("{} {}", "Platform:".green(), profile.platform.cyan());
    }
    println!("{} {}", "Platform ID:".green(), profile.platform_id.cyan());
    println!("{} {}", "Rank (5v5):".green(), profile.rank.full.cyan());
    println!("{} {}", "Rank (3v3):".green(), profile.rank_3v3.full.cyan());

    let stats = &profile.stats;
    println!("\n{}", "Lifetime Stats:".green().bold());
    println!(
        "  {}: {}",
        "Matches".yellow(),
        stats.matches_played.to_string().cyan()
    );
    println!("  {}: {}", "Wins".yellow(), stats.wins.to_string().cyan());
    println!(
        "  {}: {}",
        "Win Rate".yellow(),
        format!("{:.1}%", stats.win_rate * 100.0).cyan()
    );
    println!("  {}: {}", "Goals".yellow(), stats.goals.to_string().cyan());
    println!(
        "  {}: {}",
        "Assists".yellow(),
        stats.assists.to_string().cyan()
    );
    println!("  {}: {}", "MVPs".yellow(), stats.mvps.to_string().cyan());
    println!(
        "  {}: {}",
        "Passes".yellow(),
        stats.passes.to_string().cyan()
    );
    println!(
        "  {}: {}",
        "Interceptions".yellow(),
        stats.interceptions.to_string().cyan()
    );
    println!("  {}: {}", "Saves".yellow(), stats.saves.to_string().cyan());

    if !profile.match_history.is_empty() {
        println!("\n{}", "Recent Matches:".green().bold());
        for item in profile.match_history.iter().take(5) {
            println!("  {}", summarize_match(item).cyan());
        }
    }
}

/// One-line rendition of an untyped match record.
fn summarize_match(item: &serde_json::Value) -> String {
    let compact = item.to_string();
    if compact.chars().count() > 100 {
        let truncated: String = compact.chars().take(100).collect();
        format!("{truncated}...")
    } else {
        compact
    }
}

fn init_logging(verbose: bool, quiet: bool) -> anyhow::Result<()> {
    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive(Level::INFO.into())
    };

    let subscriber = tracing_subscriber::registry().with(filter);

    subscriber
        .with(fmt::layer().with_target(false).with_level(verbose))
        .init();
    Ok(())
}
