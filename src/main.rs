use chrono::Local;
use clap::{Parser, Subcommand};
use colored::Colorize;
use eyre::{Result, eyre};
use shoplist::{Backend, ClearScope, Config, Filter, Item, KeyValueStorage, ListStore, StoreError, UuidV7Ids};
use std::path::PathBuf;
use std::process;
use tracing::Level;

type CliStore = ListStore<Box<dyn KeyValueStorage>, UuidV7Ids>;

#[derive(Parser)]
#[command(name = "shoplist")]
#[command(about = "shoplist - A shopping list kept in a local key-value store")]
#[command(version = env!("GIT_DESCRIBE"))]
struct Cli {
    /// Config file (default: <config_dir>/shoplist/shoplist.yml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory holding the list (overrides the config file)
    #[arg(short, long)]
    store_path: Option<PathBuf>,

    /// Storage backend: sqlite, file or memory (overrides the config file)
    #[arg(short, long)]
    backend: Option<Backend>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add an item to the top of the list
    Add {
        #[arg(required = true, num_args = 1..)]
        name: Vec<String>,
    },

    /// Show the list
    List {
        /// all, completed or incomplete
        #[arg(short, long, default_value = "all")]
        filter: Filter,

        /// Show ids and creation times
        #[arg(short, long)]
        long: bool,
    },

    /// Mark an item as completed
    Done { item: String },

    /// Mark an item as not completed
    Undone { item: String },

    /// Flip an item's completed flag
    Toggle { item: String },

    /// Rename an incomplete item
    Rename { item: String, name: String },

    /// Remove an item
    Remove { item: String },

    /// Move an item before another one, or to the end
    Move {
        item: String,

        #[arg(long)]
        before: Option<String>,
    },

    /// Remove every item, or only completed ones
    Clear {
        #[arg(long)]
        completed: bool,
    },
}

fn main() {
    if let Err(e) = run() {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .init();

    let config = Config::load(cli.config.as_deref())?.with_overrides(cli.backend, cli.store_path);

    let storage = config.open_storage()?;
    let mut store: CliStore = ListStore::open(storage, config.key.clone(), UuidV7Ids);

    match cli.command {
        Commands::Add { name } => match store.add(&name.join(" ")) {
            Ok(item) => println!("{} {}", "Added".green(), item.name),
            Err(e) if e.downcast_ref::<StoreError>().is_some() => {
                return Err(eyre!("Please enter an item name"));
            }
            Err(e) => return Err(e),
        },
        Commands::List { filter, long } => print_list(&store, filter, long),
        Commands::Done { item } => {
            let id = resolve(&store, &item)?;
            store.set_completed(&id, true)?;
            println!("{} {}", "Completed".green(), display_name(&store, &id));
        }
        Commands::Undone { item } => {
            let id = resolve(&store, &item)?;
            store.set_completed(&id, false)?;
            println!("{} {}", "Reopened".yellow(), display_name(&store, &id));
        }
        Commands::Toggle { item } => {
            let id = resolve(&store, &item)?;
            match store.toggle(&id)? {
                Some(true) => println!("{} {}", "Completed".green(), display_name(&store, &id)),
                Some(false) => println!("{} {}", "Reopened".yellow(), display_name(&store, &id)),
                None => {}
            }
        }
        Commands::Rename { item, name } => {
            let id = resolve(&store, &item)?;
            if !store.is_editable(&id) {
                return Err(eyre!("Completed items cannot be edited; mark it undone first"));
            }
            store.rename(&id, &name)?;
            println!("{} {}", "Renamed".green(), display_name(&store, &id));
        }
        Commands::Remove { item } => {
            let id = resolve(&store, &item)?;
            let name = display_name(&store, &id);
            store.remove(&id)?;
            println!("{} {}", "Removed".red(), name);
            if store.is_empty() {
                print_empty_notice();
            }
        }
        Commands::Move { item, before } => {
            let id = resolve(&store, &item)?;
            let before_id = before.as_deref().map(|b| resolve(&store, b)).transpose()?;
            if store.reorder(&id, before_id.as_deref())? {
                println!("{} {}", "Moved".green(), display_name(&store, &id));
            } else {
                println!("{} already in place", display_name(&store, &id));
            }
        }
        Commands::Clear { completed } => {
            let scope = if completed { ClearScope::Completed } else { ClearScope::All };
            let removed = store.clear(scope)?;
            println!("{} {} item(s)", "Cleared".red(), removed);
            if store.is_empty() {
                print_empty_notice();
            }
        }
    }

    Ok(())
}

/// Map a 1-based position or an exact id to an item id
fn resolve(store: &CliStore, reference: &str) -> Result<String> {
    if let Some(item) = store.get(reference) {
        return Ok(item.id.clone());
    }

    if let Ok(position) = reference.parse::<usize>() {
        if let Some(item) = position.checked_sub(1).and_then(|i| store.items().get(i)) {
            return Ok(item.id.clone());
        }
    }

    Err(eyre!("No item matches {}", reference))
}

fn display_name(store: &CliStore, id: &str) -> String {
    store.get(id).map(|item| item.name.clone()).unwrap_or_default()
}

fn print_list(store: &CliStore, filter: Filter, long: bool) {
    if store.is_empty() {
        print_empty_notice();
        return;
    }

    // Positions always refer to the full list so they can be passed back to other commands
    for (index, item) in store.items().iter().enumerate() {
        if filter.matches(item) {
            println!("{}", format_item(index + 1, item, long));
        }
    }
}

fn format_item(position: usize, item: &Item, long: bool) -> String {
    let check = if item.completed { "[x]".green() } else { "[ ]".normal() };
    let name = if item.completed {
        item.name.strikethrough().dimmed().to_string()
    } else {
        item.name.clone()
    };

    let mut line = format!("{:>3}. {} {}", position, check, name);
    if long {
        let created = item
            .created_at()
            .map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string());
        line.push_str(&format!("  {} {}", item.id.dimmed(), created.dimmed()));
    }
    line
}

fn print_empty_notice() {
    println!("{}", "Your shopping list is empty".dimmed());
}
