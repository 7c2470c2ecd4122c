//! # crashout-core
//!
//! Core library for crashout - a journal for chaotic moments.
//!
//! This library provides:
//! - Domain types for entries, categories, and friends
//! - The feedback procedure (reaction + severity for a new entry)
//! - The recap procedure (aggregates + narrative over the history)
//! - Snapshot storage with SQLite
//! - Configuration management
//! - Logging infrastructure
//!
//! Both procedures ask a [`generator::TextGenerator`] first and degrade to
//! local answers when it is offline, fails, or replies with garbage. They
//! never return an error.
//!
//! ## Example
//!
//! ```rust,no_run
//! use crashout_core::generator::create_text_generator;
//! use crashout_core::{Category, Config, Database, Journal};
//!
//! let config = Config::load().expect("failed to load config");
//!
//! let db = Database::open(&Config::database_path()).expect("failed to open database");
//! db.migrate().expect("failed to run migrations");
//!
//! let generator = create_text_generator(config.generator.as_ref()).expect("generator");
//! let mut journal = Journal::load(db).expect("failed to load journal");
//! let entry = journal
//!     .record_entry(generator.as_ref(), "Failed my chem quiz", "", Category::Academics)
//!     .expect("failed to record entry");
//! println!("{} ({})", entry.reaction, entry.severity);
//! ```

// Re-export commonly used items at the crate root
pub use config::Config;
pub use db::Database;
pub use error::{Error, Result};
pub use state::Journal;
pub use store::{KeyValueStore, MemoryStore};
pub use types::*;

// Public modules
pub mod config;
pub mod db;
pub mod error;
pub mod feedback;
pub mod format;
pub mod generator;
pub mod logging;
pub mod recap;
pub mod state;
pub mod store;
pub mod types;
