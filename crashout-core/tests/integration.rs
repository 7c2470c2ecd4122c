//! Integration tests for the journal over SQLite snapshots
//!
//! These tests drive `Journal` against a real database file and a scripted
//! text generator to verify the end-to-end log, share, and recap flow.

use crashout_core::db::Database;
use crashout_core::feedback::{local_reaction, GENERIC_REACTION};
use crashout_core::generator::{OfflineGenerator, ResponseShape, TextGenerator};
use crashout_core::recap::{FALLBACK_CHAOS_SCORE, FALLBACK_HEADLINE};
use crashout_core::store::{KeyValueStore, FRIENDS_KEY, HISTORY_KEY, USER_KEY};
use crashout_core::{Category, Entry, Error, Journal, Result};
use std::sync::Mutex;
use tempfile::TempDir;

/// Generator that answers each call with the next scripted reply.
struct ReplayGenerator {
    replies: Mutex<Vec<String>>,
}

impl ReplayGenerator {
    fn new(replies: &[&str]) -> Self {
        let mut replies: Vec<String> = replies.iter().map(|r| r.to_string()).collect();
        replies.reverse();
        Self {
            replies: Mutex::new(replies),
        }
    }

    fn remaining(&self) -> usize {
        self.replies.lock().unwrap().len()
    }
}

impl TextGenerator for ReplayGenerator {
    fn generate(&self, _prompt: &str, _shape: &ResponseShape) -> Result<String> {
        self.replies
            .lock()
            .unwrap()
            .pop()
            .ok_or_else(|| Error::Generator("no scripted reply left".to_string()))
    }

    fn describe(&self) -> String {
        "replay".to_string()
    }
}

fn open_db(dir: &TempDir) -> Database {
    let db = Database::open(&dir.path().join("crashout.db")).expect("open should succeed");
    db.migrate().expect("migrate should succeed");
    db
}

// ============================================
// Persistence
// ============================================

#[test]
fn test_journal_survives_reopen() {
    let dir = TempDir::new().unwrap();

    let first_id = {
        let mut journal = Journal::load(open_db(&dir)).unwrap();
        journal.login("Ada", "@ada").unwrap();
        journal.add_friend("@bestie").unwrap();
        let id = journal
            .record_entry(&OfflineGenerator, "Failed my chem quiz", "", Category::Academics)
            .unwrap()
            .id
            .clone();
        journal
            .record_entry(&OfflineGenerator, "Texted my ex", "no regrets", Category::LoveLife)
            .unwrap();
        id
    };

    let journal = Journal::load(open_db(&dir)).unwrap();
    assert_eq!(journal.user().unwrap().handle, "ada");
    assert_eq!(journal.friends()[0].handle, "bestie");

    let history = journal.history();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].description, "Texted my ex");
    assert_eq!(history[1].id, first_id);
    assert_eq!(
        history[1].reaction,
        local_reaction(Category::Academics),
        "offline entries use the category table"
    );
}

#[test]
fn test_snapshots_are_plain_json() {
    let dir = TempDir::new().unwrap();
    let mut journal = Journal::load(open_db(&dir)).unwrap();
    journal.login("Ada", "ada").unwrap();
    journal
        .record_entry(&OfflineGenerator, "lost my keys", "", Category::Silly)
        .unwrap();

    let db = open_db(&dir);
    let raw = db.load(HISTORY_KEY).unwrap().unwrap();
    let entries: Vec<Entry> = serde_json::from_str(&raw).unwrap();
    assert_eq!(entries.len(), 1);

    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(value[0]["category"], "Silly / Random");
    assert_eq!(value[0]["caption"], "Manifesting a better day...");
    assert!(value[0]["timestamp"].is_i64());

    let keys: Vec<String> = db
        .snapshot_keys()
        .unwrap()
        .into_iter()
        .map(|(key, _)| key)
        .collect();
    assert_eq!(keys, vec![HISTORY_KEY, USER_KEY]);
    assert!(!keys.iter().any(|k| k == FRIENDS_KEY));
}

#[test]
fn test_corrupt_snapshot_is_reported() {
    let dir = TempDir::new().unwrap();
    let db = open_db(&dir);
    db.save(HISTORY_KEY, "{not json").unwrap();

    let result = Journal::load(db);
    assert!(matches!(result, Err(Error::Storage(_))));
}

// ============================================
// Generator-backed flow
// ============================================

#[test]
fn test_remote_reactions_and_recap() {
    crashout_core::logging::init_test();
    let dir = TempDir::new().unwrap();
    let mut journal = Journal::load(open_db(&dir)).unwrap();
    journal.login("Ada", "ada").unwrap();

    let generator = ReplayGenerator::new(&[
        r#"{"reaction":"Main character energy.","severity":8}"#,
        "the brain is tired",
        r#"```json
{"headline":"A week of lore","stat_lines":["2 crashouts","Academics led"],"closing_line":"Touch grass.","chaos_score":71}
```"#,
    ]);

    let entry = journal
        .record_entry(&generator, "Fell asleep in the exam", "", Category::Academics)
        .unwrap();
    assert_eq!(entry.reaction, "Main character energy.");
    assert_eq!(entry.severity.get(), 8);

    let entry = journal
        .record_entry(&generator, "Overslept again", "", Category::Academics)
        .unwrap();
    assert_eq!(entry.reaction, GENERIC_REACTION);
    assert_eq!(entry.severity.get(), 5);

    let summary = journal.recap(&generator);
    assert_eq!(generator.remaining(), 0);
    assert_eq!(summary.total, 2);
    assert_eq!(summary.top_category, Category::Academics);
    assert_eq!(summary.second_category, Category::Silly);
    assert_eq!(summary.headline, "A week of lore");
    assert_eq!(summary.stat_lines, vec!["2 crashouts", "Academics led"]);
    assert_eq!(summary.chaos_score, 71);
}

#[test]
fn test_offline_recap_uses_fallback() {
    let dir = TempDir::new().unwrap();
    let mut journal = Journal::load(open_db(&dir)).unwrap();
    for description in ["one", "two", "three"] {
        journal
            .record_entry(&OfflineGenerator, description, "", Category::Family)
            .unwrap();
    }

    let summary = journal.recap(&OfflineGenerator);
    assert_eq!(summary.total, 3);
    assert_eq!(summary.top_category, Category::Family);
    assert_eq!(summary.chaos_score, FALLBACK_CHAOS_SCORE);
    assert_eq!(summary.headline, FALLBACK_HEADLINE);
    assert_eq!(summary.stat_lines, vec!["3 total moments of pure chaos."]);
}

#[test]
fn test_share_persists_last_message() {
    let dir = TempDir::new().unwrap();
    {
        let mut journal = Journal::load(open_db(&dir)).unwrap();
        journal.add_friend("sam@uni").unwrap();
        let id = journal
            .record_entry(&OfflineGenerator, "spilled coffee", "classic", Category::Other)
            .unwrap()
            .id
            .clone();
        journal.share(&id[..6], "SAMUNI").unwrap();
    }

    let journal = Journal::load(open_db(&dir)).unwrap();
    let friend = journal.find_friend("@samuni").unwrap();
    assert_eq!(friend.name, "sam");
    assert_eq!(
        friend.last_message.as_deref(),
        Some("\"classic\" - spilled coffee")
    );
}
