use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use outfit::{
    Category, Collection, ItemId, OutfitAssistant, OutfitConfig, Payload, Recommendation,
};

/// Config file picked up from the working directory when `--config` is absent.
const DEFAULT_CONFIG_FILE: &str = "outfit.yaml";

#[derive(Parser, Debug)]
#[command(
    name = "outfit",
    version,
    about = "Outfit recommendations from your wardrobe, with marketplace suggestions"
)]
struct Cli {
    /// YAML configuration file (defaults to ./outfit.yaml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    /// Print results as JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Embed a garment photo and store it
    Add(AddArgs),
    /// List stored garments
    List(ListArgs),
    /// Rank outfits for a style prompt
    Recommend(RecommendArgs),
    /// Wardrobe pieces that go with a marketplace item
    Pair(PairArgs),
    /// Save an outfit by item ids
    Save(SaveArgs),
    /// Show saved outfits, newest first
    Saved,
    /// Delete every saved outfit
    ClearSaved,
}

#[derive(Args, Debug)]
struct AddArgs {
    /// Path to the garment photo
    image: PathBuf,

    /// Garment slot: top or bottom
    #[arg(long)]
    category: Category,

    #[arg(long)]
    description: Option<String>,

    /// Display name, mostly for marketplace items
    #[arg(long)]
    product_name: Option<String>,

    #[arg(long)]
    price: Option<f64>,

    /// Store in the marketplace instead of the wardrobe
    #[arg(long)]
    marketplace: bool,
}

#[derive(Args, Debug)]
struct ListArgs {
    /// List the marketplace instead of the wardrobe
    #[arg(long)]
    marketplace: bool,

    /// Maximum items (100 for the wardrobe, 50 for the marketplace by default)
    #[arg(long)]
    limit: Option<usize>,
}

#[derive(Args, Debug)]
struct RecommendArgs {
    /// Style prompt, e.g. "casual summer brunch"
    prompt: String,

    /// Number of outfits (defaults to recommend.outfit_limit)
    #[arg(long)]
    limit: Option<usize>,

    /// Skip marketplace suggestions
    #[arg(long)]
    no_marketplace: bool,
}

#[derive(Args, Debug)]
struct PairArgs {
    /// Marketplace item id
    id: String,

    #[arg(long)]
    limit: Option<usize>,
}

#[derive(Args, Debug)]
struct SaveArgs {
    #[arg(long)]
    top: String,

    #[arg(long)]
    bottom: String,

    #[arg(long)]
    prompt: String,

    #[arg(long)]
    score: Option<f32>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);

    let config_path = cli
        .config
        .clone()
        .or_else(|| Some(PathBuf::from(DEFAULT_CONFIG_FILE)).filter(|p| p.exists()));
    let config = OutfitConfig::load(config_path.as_deref()).with_context(|| match &config_path {
        Some(path) => format!("loading {}", path.display()),
        None => "loading default configuration".to_string(),
    })?;
    let assistant =
        OutfitAssistant::from_config(&config).context("initializing outfit assistant")?;

    run(&assistant, &config, cli.command, cli.json)
}

fn init_tracing(verbose: u8, json: bool) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn run(
    assistant: &OutfitAssistant,
    config: &OutfitConfig,
    command: Command,
    json: bool,
) -> Result<()> {
    match command {
        Command::Add(args) => {
            let collection = if args.marketplace {
                Collection::Marketplace
            } else {
                Collection::Wardrobe
            };
            let mut payload = Payload::new();
            if let Some(description) = args.description {
                payload = payload.with_description(description);
            }
            if let Some(name) = args.product_name {
                payload = payload.with_product_name(name);
            }
            if let Some(price) = args.price {
                payload = payload.with_price(price);
            }
            let id = assistant
                .add_item(collection, &args.image, args.category, payload)
                .with_context(|| format!("adding {}", args.image.display()))?;
            println!("{id}");
        }
        Command::List(args) => {
            let collection = if args.marketplace {
                Collection::Marketplace
            } else {
                Collection::Wardrobe
            };
            let items = assistant.list_items(collection, args.limit)?;
            if json {
                let payloads: Vec<&Payload> = items.iter().map(|item| &item.payload).collect();
                println!("{}", serde_json::to_string_pretty(&payloads)?);
            } else {
                for item in &items {
                    println!("{}\t{}", item.id, describe(&item.payload));
                }
            }
        }
        Command::Recommend(args) => {
            let limit = args.limit.unwrap_or(config.recommend.outfit_limit);
            let rec = assistant.generate_with(&args.prompt, limit, !args.no_marketplace)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&rec)?);
            } else {
                print_recommendation(&rec);
            }
        }
        Command::Pair(args) => {
            let found = assistant.pair_marketplace_item(&ItemId::from(args.id), args.limit)?;
            if json {
                let matches: Vec<Payload> = found
                    .matches
                    .iter()
                    .map(|item| item.payload.with_id(&item.id))
                    .collect();
                println!("{}", serde_json::to_string_pretty(&matches)?);
            } else {
                println!("{}", describe(&found.anchor));
                if found.matches.is_empty() {
                    println!("  no matching {} in your wardrobe", found.category);
                }
                for item in &found.matches {
                    println!("  + {}\t{}", item.id, describe(&item.payload));
                }
            }
        }
        Command::Save(args) => {
            let id = assistant.save_items(
                &ItemId::from(args.top),
                &ItemId::from(args.bottom),
                &args.prompt,
                args.score,
            )?;
            println!("saved outfit {id}");
        }
        Command::Saved => {
            let saved = assistant.saved_outfits()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&saved)?);
            } else {
                for outfit in &saved {
                    println!(
                        "#{} {} \"{}\": {} + {}",
                        outfit.id,
                        outfit.created_at.format("%Y-%m-%d %H:%M"),
                        outfit.prompt.as_deref().unwrap_or(""),
                        outfit
                            .top_description
                            .as_deref()
                            .or(outfit.top_image.as_deref())
                            .unwrap_or("?"),
                        outfit
                            .bottom_description
                            .as_deref()
                            .or(outfit.bottom_image.as_deref())
                            .unwrap_or("?"),
                    );
                }
            }
        }
        Command::ClearSaved => {
            let removed = assistant.clear_saved_outfits()?;
            println!("removed {removed} saved outfits");
        }
    }
    Ok(())
}

fn describe(payload: &Payload) -> String {
    let image = payload.image_path().map(Path::new);
    let name = payload
        .label()
        .map(str::to_string)
        .or_else(|| image.map(|p| p.display().to_string()))
        .unwrap_or_else(|| "<unnamed>".to_string());
    match payload.category() {
        Some(category) => format!("[{category}] {name}"),
        None => name,
    }
}

fn print_recommendation(rec: &Recommendation) {
    if rec.outfits.is_empty() {
        println!("Not enough items in your wardrobe to build an outfit.");
        return;
    }
    for (rank, pair) in rec.outfits.iter().enumerate() {
        println!(
            "{}. {} + {}  (score {:.3}, coherence {:.3}, relevance {:.3})",
            rank + 1,
            describe(&pair.top),
            describe(&pair.bottom),
            pair.score,
            pair.coherence,
            pair.query_relevance,
        );
    }
    if let Some(anchor) = &rec.anchor {
        println!("\nFrom the marketplace, to go with {}:", describe(anchor));
        if rec.marketplace_hits.is_empty() {
            println!("  nothing yet");
        }
        for hit in &rec.marketplace_hits {
            let price = hit.price().map(|p| format!("  ${p:.2}")).unwrap_or_default();
            println!("  - {}{}", describe(hit), price);
        }
    }
}
