//! crashout - journal your chaotic moments
//!
//! Log what happened, get a reaction and a drama level, share it with your
//! circle, and pull a recap of the whole saga.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use crashout_core::format::{entry_age, severity_bar, short_id, truncate};
use crashout_core::generator::{create_text_generator, TextGenerator};
use crashout_core::recap::RecapSummary;
use crashout_core::{Category, Config, Database, Entry, Friend, Journal, User};

/// Characters of an entry id shown in listings.
const SHORT_ID_LEN: usize = 8;

#[derive(Parser, Debug)]
#[command(name = "crashout")]
#[command(about = "Journal your crashouts and get a reaction from the CRASHOUT Brain")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Set the local identity
    Login {
        #[arg(long)]
        name: String,
        /// Handle, with or without a leading @
        #[arg(long)]
        handle: String,
    },
    /// Forget the local identity (entries and friends are kept)
    Logout,
    /// Show the local identity
    Whoami,
    /// Log a new crashout
    Log {
        /// What happened
        description: String,
        /// Category label or slug (see `crashout categories`)
        #[arg(long, short, value_parser = parse_category, default_value = "other")]
        category: Category,
        /// Caption shown when sharing
        #[arg(long, default_value = "")]
        caption: String,
    },
    /// List every logged entry, most recent first
    Vault {
        /// Print the history as JSON
        #[arg(long)]
        json: bool,
    },
    /// Find entries whose description contains a query
    Search { query: String },
    /// Manage your circle
    Friends {
        #[command(subcommand)]
        command: FriendsCommand,
    },
    /// Send an entry to a friend
    Share {
        /// Entry id or unique id prefix
        entry: String,
        /// Friend handle
        friend: String,
    },
    /// Recap of the whole history
    Recap {
        /// Export format (md = markdown, json = JSON)
        #[arg(long)]
        export: Option<String>,
    },
    /// List the available categories
    Categories,
}

#[derive(Subcommand, Debug)]
enum FriendsCommand {
    /// Add a friend from `@handle` or `name@somewhere`
    Add { handle: String },
    /// List friends
    List,
    /// Show a friend and the last thing you sent them
    Show { handle: String },
}

fn parse_category(s: &str) -> std::result::Result<Category, String> {
    s.parse::<Category>().map_err(|e| e.to_string())
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = Config::load().context("failed to load configuration")?;
    let _log_guard = crashout_core::logging::init(&config.logging).ok();

    let db_path = Config::database_path();
    let db = Database::open(&db_path).context("failed to open database")?;
    db.migrate().context("failed to run migrations")?;

    let mut journal = Journal::load(db).context("failed to load journal")?;
    tracing::debug!(command = ?args.command, db = %db_path.display(), "Running command");

    match args.command {
        Command::Login { name, handle } => {
            let user = journal.login(&name, &handle)?;
            println!("Welcome, {} (@{})", user.name, user.handle);
        }
        Command::Logout => {
            journal.logout()?;
            println!("Logged out. Your vault is still here.");
        }
        Command::Whoami => {
            let user = require_user(&journal)?;
            println!("{} (@{})", user.name, user.handle);
        }
        Command::Log {
            description,
            category,
            caption,
        } => {
            require_user(&journal)?;
            let generator = generator(&config)?;
            let entry = journal
                .record_entry(generator.as_ref(), &description, &caption, category)
                .context("failed to log crashout")?;
            print_logged(entry);
        }
        Command::Vault { json } => {
            require_user(&journal)?;
            if json {
                println!("{}", serde_json::to_string_pretty(journal.history())?);
            } else if journal.history().is_empty() {
                println!("Your vault is empty. Log a crashout first.");
            } else {
                for entry in journal.history() {
                    print_entry(entry);
                }
            }
        }
        Command::Search { query } => {
            require_user(&journal)?;
            let matches = journal.search(&query);
            if matches.is_empty() {
                println!("No crashouts match \"{query}\".");
            }
            for entry in matches {
                print_entry(entry);
            }
        }
        Command::Friends { command } => {
            require_user(&journal)?;
            match command {
                FriendsCommand::Add { handle } => {
                    let friend = journal.add_friend(&handle)?;
                    println!("Added {} (@{}) to your circle", friend.name, friend.handle);
                }
                FriendsCommand::List => {
                    if journal.friends().is_empty() {
                        println!("Your circle is empty. Add someone with `crashout friends add`.");
                    }
                    for friend in journal.friends() {
                        println!("@{:<16} {:<20} {}", friend.handle, friend.name, friend.status);
                    }
                }
                FriendsCommand::Show { handle } => {
                    print_friend(journal.find_friend(&handle)?);
                }
            }
        }
        Command::Share { entry, friend } => {
            require_user(&journal)?;
            let friend = journal.share(&entry, &friend)?;
            println!("Sent to @{}:", friend.handle);
            if let Some(message) = &friend.last_message {
                println!("  {message}");
            }
        }
        Command::Recap { export } => {
            require_user(&journal)?;
            let generator = generator(&config)?;
            let summary = journal.recap(generator.as_ref());
            match export.as_deref() {
                Some("json") => print_json(&summary)?,
                Some("md") => print_markdown(&summary),
                Some(other) => anyhow::bail!("Unknown export format: {}. Use 'md' or 'json'", other),
                None => print_terminal(&summary),
            }
        }
        Command::Categories => print_categories(),
    }

    Ok(())
}

fn generator(config: &Config) -> Result<Box<dyn TextGenerator>> {
    create_text_generator(config.generator.as_ref()).context("failed to set up text generator")
}

fn require_user<S: crashout_core::KeyValueStore>(journal: &Journal<S>) -> Result<&User> {
    journal.user().context(
        "not logged in. Run `crashout login --name <NAME> --handle <HANDLE>` first",
    )
}

fn print_categories() {
    for category in Category::ALL {
        println!("{:<16} {}", category.slug(), category.label());
    }
}

fn print_logged(entry: &Entry) {
    println!();
    println!("  \"{}\"", entry.reaction);
    println!();
    println!("  Drama level: {} {}", severity_bar(entry.severity), entry.severity);
    println!("  Category:    {}", entry.category);
    println!("  Saved as:    {}", short_id(&entry.id, SHORT_ID_LEN));
    println!();
}

fn print_entry(entry: &Entry) {
    println!(
        "{}  {:<8} {:<22} {}",
        short_id(&entry.id, SHORT_ID_LEN),
        entry_age(entry),
        entry.category.label(),
        severity_bar(entry.severity)
    );
    println!("    {}", truncate(&entry.description, 72));
    println!("    \"{}\"  -> {}", entry.caption, entry.reaction);
    println!();
}

fn print_friend(friend: &Friend) {
    println!("{} (@{})", friend.name, friend.handle);
    println!("  Status: {}", friend.status);
    match &friend.last_message {
        Some(message) => println!("  Last sent: {message}"),
        None => println!("  Last sent: nothing yet"),
    }
}

fn print_terminal(summary: &RecapSummary) {
    println!();
    println!("+{}+", "-".repeat(60));
    println!("|{:^60}|", "YOUR CRASHOUT RECAP");
    println!("+{}+", "-".repeat(60));
    println!();

    println!("  {}", summary.headline);
    println!();

    println!("THE NUMBERS");
    println!("   Crashouts:     {}", summary.total);
    println!("   Top category:  {}", summary.top_category);
    println!("   Runner-up:     {}", summary.second_category);
    println!("   Peak chaos on: {}", summary.most_active_day);
    println!("   Chaos score:   {}/100", summary.chaos_score);
    println!();

    if !summary.stat_lines.is_empty() {
        println!("THE LORE");
        for line in &summary.stat_lines {
            println!("   - {line}");
        }
        println!();
    }

    println!("  {}", summary.closing_line);
    println!();
}

fn print_markdown(summary: &RecapSummary) {
    println!("# Crashout Recap");
    println!();
    println!("**{}**", summary.headline);
    println!();

    println!("## The Numbers");
    println!();
    println!("| Metric | Value |");
    println!("|--------|-------|");
    println!("| Crashouts | {} |", summary.total);
    println!("| Top category | {} |", summary.top_category);
    println!("| Runner-up | {} |", summary.second_category);
    println!("| Most active day | {} |", summary.most_active_day);
    println!("| Chaos score | {}/100 |", summary.chaos_score);
    println!();

    if !summary.stat_lines.is_empty() {
        println!("## The Lore");
        println!();
        for line in &summary.stat_lines {
            println!("- {line}");
        }
        println!();
    }

    println!("*{}*", summary.closing_line);
    println!();
    println!("---");
    println!("*Generated by crashout*");
}

fn print_json(summary: &RecapSummary) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(summary)?);
    Ok(())
}
