//! trend-queue - Manage the scheduled post plan
//!
//! Unix-style tool for managing the per-user plan of scheduled posts.

use clap::{Parser, Subcommand};
use libtrendcast::config::resolve_data_path;
use libtrendcast::generate::{TemplateGenerator, TextGenerator};
use libtrendcast::logging;
use libtrendcast::pinning::{LocalPinner, MediaPinner};
use libtrendcast::{Config, Database, HhMm, MediaRef, PlanItem, Result, TrendcastError};

#[derive(Parser, Debug)]
#[command(name = "trend-queue")]
#[command(version)]
#[command(about = "Manage the scheduled post plan")]
#[command(long_about = "\
trend-queue - Manage the scheduled post plan

DESCRIPTION:
    trend-queue is a Unix-style tool for managing the Trendcast plan: a
    per-user queue of posts, each assigned a daily HH:MM slot. Items stay
    pending until trend-send publishes them, after which they are done.

COMMANDS:
    add     Queue a post at a time slot
    list    List all items in the plan
    due     List items due at a given slot
    done    Mark an item as published
    stats   Show plan statistics

USAGE EXAMPLES:
    # Queue a post for the 09:00 slot
    trend-queue add \"Morning update\" --at 09:00

    # Generate the text from a topic instead of writing it
    trend-queue add --topic \"solar adoption\" --at 14:00

    # Attach media by platform file id
    trend-queue add \"Chart of the day\" --at 22:00 \\
        --media-id AgACAgIAAxkBAAIB --media-type photo

    # List the plan in JSON format
    trend-queue list --format json

    # What would trend-send publish right now?
    trend-queue due

    # Mark item 3 as published by hand
    trend-queue done 3

CONFIGURATION:
    Configuration file: ~/.config/trendcast/config.toml
    Database location: ~/.local/share/trendcast/plan.db

    Override with environment variables:
        TRENDCAST_CONFIG    - Path to config file

EXIT CODES:
    0 - Success
    1 - Operation failed
    2 - Authentication error
    3 - Invalid input (bad slot, bad item id, etc.)

For more information, visit: https://github.com/trendcast/trendcast
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Queue owner; defaults to [defaults].user_id from the config
    #[arg(short, long, global = true)]
    user: Option<i64>,

    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Queue a post at a time slot
    Add {
        /// Post text (omit when using --topic)
        text: Option<String>,

        /// Daily time slot in HH:MM
        #[arg(long)]
        at: String,

        /// Item id; defaults to the next free id for this user
        #[arg(long)]
        id: Option<i64>,

        /// Generate the post text from this topic
        #[arg(long, conflicts_with = "text")]
        topic: Option<String>,

        /// Platform file id of an already-uploaded media asset
        #[arg(long, requires = "media_type")]
        media_id: Option<String>,

        /// Media type (e.g. photo)
        #[arg(long, requires = "media_id")]
        media_type: Option<String>,

        /// Pin a local file and attach it as a photo
        #[arg(long, conflicts_with = "media_id")]
        media_file: Option<std::path::PathBuf>,
    },

    /// List all items in the plan
    List {
        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// List items due at a given slot
    Due {
        /// Slot to evaluate in HH:MM; defaults to the current time
        #[arg(long)]
        at: Option<String>,

        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Mark an item as published
    Done {
        /// Item id to mark done
        item_id: i64,
    },

    /// Show plan statistics
    Stats {
        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    logging::init(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    let db = Database::new(&config.database.path).await?;
    let user_id = cli.user.unwrap_or(config.defaults.user_id);

    match cli.command {
        Commands::Add {
            text,
            at,
            id,
            topic,
            media_id,
            media_type,
            media_file,
        } => {
            cmd_add(
                &db, user_id, text, &at, id, topic, media_id, media_type, media_file,
            )
            .await?;
        }
        Commands::List { format } => {
            cmd_list(&db, user_id, &format).await?;
        }
        Commands::Due { at, format } => {
            cmd_due(&db, &config, user_id, at.as_deref(), &format).await?;
        }
        Commands::Done { item_id } => {
            cmd_done(&db, user_id, item_id).await?;
        }
        Commands::Stats { format } => {
            cmd_stats(&db, user_id, &format).await?;
        }
    }

    Ok(())
}

fn validate_format(format: &str) -> Result<()> {
    if format != "text" && format != "json" {
        return Err(TrendcastError::InvalidInput(format!(
            "Invalid format '{}'. Must be 'text' or 'json'",
            format
        )));
    }
    Ok(())
}

/// Queue a post at a time slot
#[allow(clippy::too_many_arguments)]
async fn cmd_add(
    db: &Database,
    user_id: i64,
    text: Option<String>,
    at: &str,
    id: Option<i64>,
    topic: Option<String>,
    media_id: Option<String>,
    media_type: Option<String>,
    media_file: Option<std::path::PathBuf>,
) -> Result<()> {
    let when: HhMm = at.parse()?;

    let text = match (text, topic) {
        (Some(text), None) => text,
        (None, Some(topic)) => TemplateGenerator::new().generate(&topic).await?,
        (None, None) => {
            return Err(TrendcastError::InvalidInput(
                "Provide the post text or --topic".to_string(),
            ))
        }
        (Some(_), Some(_)) => {
            // clap already rejects this combination
            return Err(TrendcastError::InvalidInput(
                "Provide the post text or --topic, not both".to_string(),
            ));
        }
    };

    let media = resolve_media(media_id, media_type, media_file).await?;

    let item_id = match id {
        Some(id) => id,
        None => db.next_item_id(user_id).await?,
    };

    let mut item = PlanItem::new(user_id, item_id, text, when);
    if let Some(media) = media {
        item = item.with_media(media);
    }

    db.insert_item(&item).await?;
    println!("Queued item {} at {}", item.item_id, item.when_hhmm);

    Ok(())
}

/// Turn the media CLI flags into a media reference
async fn resolve_media(
    media_id: Option<String>,
    media_type: Option<String>,
    media_file: Option<std::path::PathBuf>,
) -> Result<Option<MediaRef>> {
    if let (Some(id), Some(kind)) = (media_id, media_type) {
        return Ok(Some(MediaRef::new(id, kind)));
    }

    if let Some(path) = media_file {
        let bytes = std::fs::read(&path)
            .map_err(|e| TrendcastError::Media(format!("Cannot read {}: {}", path.display(), e)))?;
        let pinner = LocalPinner::new(resolve_data_path()?.join("media"));
        let address = pinner.pin(&bytes).await?;
        return Ok(Some(MediaRef::photo(address)));
    }

    Ok(None)
}

/// List all items in the plan
async fn cmd_list(db: &Database, user_id: i64, format: &str) -> Result<()> {
    validate_format(format)?;

    let items = db.list_items(user_id).await?;

    if format == "json" {
        output_items_json(&items);
    } else {
        output_items_text(&items);
    }

    Ok(())
}

/// List items due at a given slot
async fn cmd_due(
    db: &Database,
    config: &Config,
    user_id: i64,
    at: Option<&str>,
    format: &str,
) -> Result<()> {
    validate_format(format)?;

    let slot = match at {
        Some(at) => at.parse()?,
        None => HhMm::now_with_offset(config.defaults.utc_offset_minutes),
    };

    let items = db.due_items(user_id, &slot).await?;

    if format == "json" {
        output_items_json(&items);
    } else {
        output_items_text(&items);
    }

    Ok(())
}

/// Mark an item as published
async fn cmd_done(db: &Database, user_id: i64, item_id: i64) -> Result<()> {
    db.mark_done(user_id, item_id).await?;
    println!("Marked item {} done", item_id);
    Ok(())
}

/// Show plan statistics
async fn cmd_stats(db: &Database, user_id: i64, format: &str) -> Result<()> {
    validate_format(format)?;

    let stats = db.stats(user_id).await?;

    if format == "json" {
        let json = serde_json::json!({
            "pending": stats.pending,
            "done": stats.done,
        });
        println!("{}", serde_json::to_string_pretty(&json).unwrap());
    } else {
        println!("Pending: {}", stats.pending);
        println!("Done:    {}", stats.done);
    }

    Ok(())
}

/// Output items as JSON
fn output_items_json(items: &[PlanItem]) {
    let json: Vec<serde_json::Value> = items
        .iter()
        .map(|item| {
            serde_json::json!({
                "item_id": item.item_id,
                "text": item.text,
                "when_hhmm": item.when_hhmm.as_str(),
                "done": item.done,
                "media_file_id": item.media.as_ref().map(|m| m.file_id.clone()),
                "media_type": item.media.as_ref().map(|m| m.kind.clone()),
            })
        })
        .collect();

    println!("{}", serde_json::to_string_pretty(&json).unwrap());
}

/// Output items as human-readable text
fn output_items_text(items: &[PlanItem]) {
    for item in items {
        let status = if item.done { "done" } else { "pending" };
        let media = if item.media.is_some() { " [media]" } else { "" };
        println!(
            "{} | {} | {} | {}{}",
            item.item_id,
            item.when_hhmm,
            status,
            truncate_content(&item.text, 50),
            media
        );
    }
}

/// Truncate content to max length with ellipsis
fn truncate_content(content: &str, max_len: usize) -> String {
    if content.chars().count() <= max_len {
        content.to_string()
    } else {
        let cut: String = content.chars().take(max_len).collect();
        format!("{}...", cut)
    }
}
