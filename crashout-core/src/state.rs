//! Application state.
//!
//! [`Journal`] owns the history, identity and friend list for the lifetime of
//! a session. It reads each snapshot once in [`Journal::load`] and writes the
//! affected snapshot in full after every change.

use crate::error::{Error, Result};
use crate::feedback::{self, Feedback};
use crate::generator::TextGenerator;
use crate::recap::{self, RecapSummary};
use crate::store::{load_json, save_json, KeyValueStore, FRIENDS_KEY, HISTORY_KEY, USER_KEY};
use crate::types::{Category, Entry, Friend, User, DEFAULT_CAPTION, DEFAULT_FRIEND_STATUS};
use chrono::Utc;
use uuid::Uuid;

/// In-memory journal bound to a snapshot store.
pub struct Journal<S: KeyValueStore> {
    store: S,
    user: Option<User>,
    history: Vec<Entry>,
    friends: Vec<Friend>,
}

/// Strip a leading `@` and surrounding whitespace from a handle.
fn normalize_handle(handle: &str) -> &str {
    let handle = handle.trim();
    handle.strip_prefix('@').unwrap_or(handle).trim()
}

impl<S: KeyValueStore> Journal<S> {
    /// Read all snapshots from `store`. Missing snapshots start empty.
    pub fn load(store: S) -> Result<Self> {
        let user: Option<User> = load_json(&store, USER_KEY)?;
        let history: Vec<Entry> = load_json(&store, HISTORY_KEY)?.unwrap_or_default();
        let friends: Vec<Friend> = load_json(&store, FRIENDS_KEY)?.unwrap_or_default();

        tracing::debug!(
            logged_in = user.is_some(),
            entries = history.len(),
            friends = friends.len(),
            "Journal loaded"
        );

        Ok(Self {
            store,
            user,
            history,
            friends,
        })
    }

    // ============================================
    // Identity
    // ============================================

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    /// Record the local identity. Nothing is verified.
    pub fn login(&mut self, name: &str, handle: &str) -> Result<&User> {
        let name = name.trim();
        let handle = normalize_handle(handle);
        if name.is_empty() {
            return Err(Error::InvalidUser("name must not be empty".to_string()));
        }
        if handle.is_empty() {
            return Err(Error::InvalidUser("handle must not be empty".to_string()));
        }

        let user = User {
            name: name.to_string(),
            handle: handle.to_string(),
        };
        save_json(&self.store, USER_KEY, &user)?;
        tracing::info!(handle = %user.handle, "Logged in");
        Ok(self.user.insert(user))
    }

    /// Forget the identity. History and friends are kept.
    pub fn logout(&mut self) -> Result<()> {
        self.store.remove(USER_KEY)?;
        if let Some(user) = self.user.take() {
            tracing::info!(handle = %user.handle, "Logged out");
        }
        Ok(())
    }

    // ============================================
    // History
    // ============================================

    /// All entries, most recent first.
    pub fn history(&self) -> &[Entry] {
        &self.history
    }

    /// Evaluate and store a new entry at the front of the history.
    ///
    /// A blank caption is replaced with [`DEFAULT_CAPTION`].
    pub fn record_entry(
        &mut self,
        generator: &dyn TextGenerator,
        description: &str,
        caption: &str,
        category: Category,
    ) -> Result<&Entry> {
        let description = description.trim();
        if description.is_empty() {
            return Err(Error::EmptyDescription);
        }

        let Feedback {
            reaction,
            severity,
            source,
        } = feedback::evaluate(generator, description, category);

        let caption = caption.trim();
        let entry = Entry {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now().timestamp_millis(),
            description: description.to_string(),
            caption: if caption.is_empty() {
                DEFAULT_CAPTION.to_string()
            } else {
                caption.to_string()
            },
            category,
            severity,
            reaction,
        };

        let mut history = Vec::with_capacity(self.history.len() + 1);
        history.push(entry);
        history.extend(self.history.iter().cloned());
        save_json(&self.store, HISTORY_KEY, &history)?;
        self.history = history;

        let entry = &self.history[0];
        tracing::info!(
            id = %entry.id,
            %category,
            severity = entry.severity.get(),
            ?source,
            "Entry recorded"
        );
        Ok(entry)
    }

    /// Entries whose description contains `query`, ignoring case.
    pub fn search(&self, query: &str) -> Vec<&Entry> {
        let needle = query.trim().to_lowercase();
        self.history
            .iter()
            .filter(|e| needle.is_empty() || e.description.to_lowercase().contains(&needle))
            .collect()
    }

    /// Find an entry by full id or unique id prefix.
    pub fn find_entry(&self, id: &str) -> Result<&Entry> {
        let id = id.trim();
        if id.is_empty() {
            return Err(Error::EntryNotFound(id.to_string()));
        }
        if let Some(entry) = self.history.iter().find(|e| e.id == id) {
            return Ok(entry);
        }

        let mut matches = self.history.iter().filter(|e| e.id.starts_with(id));
        match (matches.next(), matches.next()) {
            (Some(entry), None) => Ok(entry),
            _ => Err(Error::EntryNotFound(id.to_string())),
        }
    }

    /// Recap over the full history.
    pub fn recap(&self, generator: &dyn TextGenerator) -> RecapSummary {
        recap::summarize(generator, &self.history)
    }

    // ============================================
    // Friends
    // ============================================

    pub fn friends(&self) -> &[Friend] {
        &self.friends
    }

    /// Look up a friend by handle, ignoring case and a leading `@`.
    pub fn find_friend(&self, handle: &str) -> Result<&Friend> {
        let position = self.friend_position(handle)?;
        Ok(&self.friends[position])
    }

    fn friend_position(&self, handle: &str) -> Result<usize> {
        let wanted = normalize_handle(handle);
        self.friends
            .iter()
            .position(|f| f.handle.eq_ignore_ascii_case(wanted))
            .ok_or_else(|| Error::FriendNotFound(wanted.to_string()))
    }

    /// Add a friend from `@handle` or `name@somewhere` style input.
    ///
    /// The handle is the input with its first `@` removed; the name is the
    /// part before that `@`, or the handle when that part is empty. Handles
    /// are unique, compared case-insensitively.
    pub fn add_friend(&mut self, input: &str) -> Result<&Friend> {
        let input = input.trim();
        let handle = input.replacen('@', "", 1).trim().to_string();
        if handle.is_empty() {
            return Err(Error::InvalidUser("friend handle must not be empty".to_string()));
        }
        if self
            .friends
            .iter()
            .any(|f| f.handle.eq_ignore_ascii_case(&handle))
        {
            return Err(Error::DuplicateFriend(handle));
        }

        let name = input
            .split('@')
            .next()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(handle.as_str())
            .to_string();

        let friend = Friend {
            id: Uuid::new_v4().to_string(),
            name,
            handle,
            status: DEFAULT_FRIEND_STATUS.to_string(),
            last_message: None,
        };

        let mut friends = self.friends.clone();
        friends.push(friend);
        save_json(&self.store, FRIENDS_KEY, &friends)?;
        self.friends = friends;

        let friend = &self.friends[self.friends.len() - 1];
        tracing::info!(handle = %friend.handle, "Friend added");
        Ok(friend)
    }

    /// Deliver an entry to a friend, replacing their previous message.
    pub fn share(&mut self, entry_id: &str, friend_handle: &str) -> Result<&Friend> {
        let message = self.find_entry(entry_id)?.share_message();
        let position = self.friend_position(friend_handle)?;

        let mut friends = self.friends.clone();
        friends[position].last_message = Some(message);
        save_json(&self.store, FRIENDS_KEY, &friends)?;
        self.friends = friends;

        let friend = &self.friends[position];
        tracing::info!(handle = %friend.handle, entry = entry_id, "Entry shared");
        Ok(friend)
    }
}
