// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use meal_journal::config::{DEFAULT_API_KEY, DEFAULT_API_URL};
use meal_journal::journal::now;
use meal_journal::notifications::FEED_SIZE;
use meal_journal::{
    ensure_seeded, handle, reseed, Command, Config, FuzzyMatcher, Journal, MealCategory,
    NotificationKind, SeedOptions, SeedOutcome, UiState, UsdaFoodSearch,
};

/// Personal meal log with a searchable food catalog
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory holding the catalog, log and notification tables
    #[arg(long, global = true, env = "MEAL_JOURNAL_DATA_DIR", default_value = "data")]
    data_dir: PathBuf,

    /// Food search endpoint used for seeding
    #[arg(long, global = true, env = "FDC_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Food search API key
    #[arg(long, global = true, env = "FDC_API_KEY", default_value = DEFAULT_API_KEY, hide_env_values = true)]
    api_key: String,

    /// Pause between seeding requests, in milliseconds
    #[arg(long, global = true, default_value_t = 300)]
    request_delay_ms: u64,

    #[command(subcommand)]
    command: Option<Cmd>,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Interactive terminal UI (default)
    Tui,

    /// Populate the catalog from the food search API if it is empty
    Seed {
        /// Drop the current catalog and seed again
        #[arg(long)]
        force: bool,
    },

    /// Fuzzy-search catalog meal names
    Search {
        query: String,

        #[arg(long, default_value_t = meal_journal::fuzzy::DEFAULT_THRESHOLD)]
        threshold: f64,

        /// Print similarity scores
        #[arg(long)]
        scores: bool,
    },

    /// Log a consumed meal
    Log {
        meal: String,

        #[arg(long, short)]
        category: MealCategory,

        /// Servings, greater than 0
        #[arg(long, short)]
        quantity: f64,
    },

    /// Manage the meal catalog
    Catalog {
        #[command(subcommand)]
        action: CatalogCmd,
    },

    /// Most recent log entries
    History {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },

    /// Notification feed
    Notifications {
        /// Show the full history instead of the latest few
        #[arg(long)]
        all: bool,
    },
}

#[derive(Subcommand, Debug)]
enum CatalogCmd {
    List,
    Add {
        name: String,

        #[arg(long, short)]
        category: MealCategory,
    },
    Edit {
        name: String,

        #[arg(long)]
        new_name: Option<String>,

        #[arg(long, short)]
        category: Option<MealCategory>,
    },
    Delete {
        name: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let interactive = matches!(cli.command, None | Some(Cmd::Tui));
    init_tracing(if interactive { "warn" } else { "info" });

    let config = Config {
        data_dir: cli.data_dir.clone(),
        api_url: cli.api_url.clone(),
        api_key: cli.api_key.clone(),
        request_delay: Duration::from_millis(cli.request_delay_ms),
        ..Config::default()
    };

    // The only fatal error: no usable data directory
    let journal = Journal::open(&config)?;

    match cli.command.unwrap_or(Cmd::Tui) {
        Cmd::Tui => run_ui_mode(&journal, &config)?,
        Cmd::Seed { force } => run_seed(&journal, &config, force)?,
        Cmd::Search {
            query,
            threshold,
            scores,
        } => run_search(&journal, &query, threshold, scores)?,
        Cmd::Log {
            meal,
            category,
            quantity,
        } => {
            let state = UiState {
                meal_input: meal,
                category,
                quantity,
                ..UiState::default()
            };
            run_commands(&journal, state, vec![Command::SaveMeal])?;
        }
        Cmd::Catalog { action } => run_catalog(&journal, action)?,
        Cmd::History { limit } => run_history(&journal, limit)?,
        Cmd::Notifications { all } => run_notifications(&journal, all)?,
    }

    Ok(())
}

fn init_tracing(default_level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn run_seed(journal: &Journal, config: &Config, force: bool) -> Result<()> {
    println!("🌱 Seeding meal catalog");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let search = UsdaFoodSearch::new(config)?;
    let options = SeedOptions::from_config(config);

    let outcome = if force {
        reseed(journal, &search, options)?
    } else {
        ensure_seeded(journal, &search, options)?
    };

    match outcome {
        SeedOutcome::AlreadySeeded(count) => {
            println!("✓ Catalog already has {} items (use --force to reseed)", count);
        }
        SeedOutcome::Seeded {
            items,
            from_api,
            used_defaults,
        } => {
            println!("✓ Catalog initialized with {} items", items);
            println!("✓ {} names fetched from the API", from_api);
            if used_defaults {
                println!("⚠️  API unavailable, installed the default catalog");
            }
        }
    }

    Ok(())
}

fn run_search(journal: &Journal, query: &str, threshold: f64, scores: bool) -> Result<()> {
    let entries = journal.catalog_entries()?;
    if entries.is_empty() {
        println!("📭 Catalog is empty. Run: meal-journal seed");
        return Ok(());
    }

    let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
    let matches = FuzzyMatcher::with_threshold(threshold).rank(query, &names);

    if matches.is_empty() {
        println!("💡 No matches found. You can add this as a new meal!");
        return Ok(());
    }

    for m in matches {
        let category = entries
            .iter()
            .find(|e| e.name == m.name)
            .map(|e| e.category.as_str())
            .unwrap_or("Unknown");
        if scores {
            println!("{:.3}  {:<50} {}", m.score, m.name, category);
        } else {
            println!("{:<50} {}", m.name, category);
        }
    }

    Ok(())
}

fn run_catalog(journal: &Journal, action: CatalogCmd) -> Result<()> {
    match action {
        CatalogCmd::List => {
            let entries = journal.catalog_entries()?;
            if entries.is_empty() {
                println!("📭 No meals in the database.");
                return Ok(());
            }
            println!("📊 Database contains {} meals", entries.len());
            for entry in entries {
                println!("  {:<50} {}", entry.name, entry.category);
            }
        }
        CatalogCmd::Add { name, category } => {
            let state = UiState {
                meal_input: name,
                category,
                ..UiState::default()
            };
            run_commands(journal, state, vec![Command::OpenAddPopup, Command::ConfirmAdd])?;
        }
        CatalogCmd::Edit {
            name,
            new_name,
            category,
        } => {
            let mut commands = vec![Command::OpenEdit(name)];
            if let Some(new_name) = new_name {
                commands.push(Command::SetPopupName(new_name));
            }
            if let Some(category) = category {
                commands.push(Command::SetPopupCategory(category));
            }
            commands.push(Command::ConfirmEdit);
            run_commands(journal, UiState::default(), commands)?;
        }
        CatalogCmd::Delete { name } => {
            run_commands(journal, UiState::default(), vec![Command::DeleteMeal(name)])?;
        }
    }

    Ok(())
}

/// Feed commands through the shared handlers, stopping at the first refusal
fn run_commands(journal: &Journal, mut state: UiState, commands: Vec<Command>) -> Result<()> {
    for command in commands {
        let catalog = journal.catalog_entries()?;
        let outcome = handle(&state, &catalog, command, now());
        journal.apply(&outcome.effects)?;

        let rejected = outcome.rejected();
        state = outcome.state;

        if let Some(status) = &state.status {
            let icon = match status.kind {
                NotificationKind::Success => "✅",
                NotificationKind::Warning => "⚠️ ",
                NotificationKind::Error => "❌",
                NotificationKind::Info => "💡",
            };
            println!("{} {}", icon, status.message);
        }

        if rejected {
            std::process::exit(1);
        }
    }

    Ok(())
}

fn run_history(journal: &Journal, limit: usize) -> Result<()> {
    let entries = journal.recent_logs(limit)?;
    if entries.is_empty() {
        println!("📝 No meal logs recorded yet.");
        return Ok(());
    }

    for entry in entries {
        println!(
            "{}  {:<10} {:<40} {}",
            entry.timestamp.format(meal_journal::db::TIMESTAMP_FORMAT),
            entry.category,
            entry.name,
            entry.quantity
        );
    }

    Ok(())
}

fn run_notifications(journal: &Journal, all: bool) -> Result<()> {
    let mut history = journal.notification_history()?;
    if history.is_empty() {
        println!("🔔 No notifications yet.");
        return Ok(());
    }

    let total = history.len();
    if !all {
        history.truncate(FEED_SIZE);
    }

    for n in &history {
        println!(
            "{}  {:<8} {}",
            n.timestamp.format(meal_journal::db::TIMESTAMP_FORMAT),
            n.kind,
            n.message
        );
    }

    if !all && total > FEED_SIZE {
        println!("📋 {} more (use --all to show all {})", total - FEED_SIZE, total);
    }

    Ok(())
}

#[cfg(feature = "tui")]
fn run_ui_mode(journal: &Journal, config: &Config) -> Result<()> {
    println!("🖥️  Loading Meal Journal...\n");

    let search = UsdaFoodSearch::new(config)?;
    if let Err(e) = ensure_seeded(journal, &search, SeedOptions::from_config(config)) {
        journal.notify(
            NotificationKind::Error,
            &format!("Error initializing database: {}", e),
        )?;
    }

    let mut app = ui::App::new(journal, config)?;
    ui::run_ui(&mut app)?;

    println!("\n✅ Meal Journal closed");

    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_journal: &Journal, _config: &Config) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use the subcommands: meal-journal --help");
    std::process::exit(1);
}
