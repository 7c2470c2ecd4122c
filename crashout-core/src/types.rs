//! Core domain types for crashout
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **Entry** | One journaled chaotic moment: description, caption, category, severity, reaction |
//! | **Category** | Closed set of seven labels; both a tag and an aggregation key |
//! | **Severity** | The "drama level", an integer 1-10 |
//! | **Reaction** | The short witty line returned for an entry |
//! | **User** | The local identity (unchecked; there is no auth model) |
//! | **Friend** | A contact in the circle that entries can be shared with |

use crate::error::{Error, Result};
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================
// Category
// ============================================

/// Closed classification for entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "Academics")]
    Academics,
    #[serde(rename = "Love Life")]
    LoveLife,
    #[serde(rename = "Annoying People")]
    AnnoyingPeople,
    #[serde(rename = "Family")]
    Family,
    #[serde(rename = "Stress / Overthinking")]
    Stress,
    #[serde(rename = "Silly / Random")]
    Silly,
    #[serde(rename = "Other")]
    #[default]
    Other,
}

impl Category {
    /// All categories in display order.
    pub const ALL: [Category; 7] = [
        Category::Academics,
        Category::LoveLife,
        Category::AnnoyingPeople,
        Category::Family,
        Category::Stress,
        Category::Silly,
        Category::Other,
    ];

    /// Display label (also the persisted form).
    pub fn label(&self) -> &'static str {
        match self {
            Category::Academics => "Academics",
            Category::LoveLife => "Love Life",
            Category::AnnoyingPeople => "Annoying People",
            Category::Family => "Family",
            Category::Stress => "Stress / Overthinking",
            Category::Silly => "Silly / Random",
            Category::Other => "Other",
        }
    }

    /// Short kebab-case name for command lines.
    pub fn slug(&self) -> &'static str {
        match self {
            Category::Academics => "academics",
            Category::LoveLife => "love-life",
            Category::AnnoyingPeople => "annoying-people",
            Category::Family => "family",
            Category::Stress => "stress",
            Category::Silly => "silly",
            Category::Other => "other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for Category {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        Category::ALL
            .into_iter()
            .find(|c| c.label().eq_ignore_ascii_case(wanted) || c.slug().eq_ignore_ascii_case(wanted))
            .or_else(|| match wanted.to_ascii_lowercase().as_str() {
                "love" => Some(Category::LoveLife),
                "people" => Some(Category::AnnoyingPeople),
                "overthinking" | "stress-overthinking" => Some(Category::Stress),
                "random" | "silly-random" => Some(Category::Silly),
                _ => None,
            })
            .ok_or_else(|| Error::UnknownCategory(s.to_string()))
    }
}

// ============================================
// Severity
// ============================================

/// Drama level, always within `[Severity::MIN, Severity::MAX]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Severity(u8);

impl Severity {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 10;

    /// Returns `None` when `value` is out of range.
    pub fn new(value: u8) -> Option<Self> {
        (Self::MIN..=Self::MAX).contains(&value).then_some(Self(value))
    }

    /// Round and clamp an arbitrary number into range. NaN maps to the minimum.
    pub fn clamped(value: f64) -> Self {
        if value.is_nan() {
            return Self(Self::MIN);
        }
        let clamped = value.round().clamp(Self::MIN as f64, Self::MAX as f64);
        Self(clamped as u8)
    }

    pub fn get(&self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Severity {
    type Error = String;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        Severity::new(value).ok_or_else(|| format!("severity {value} is outside 1-10"))
    }
}

impl From<Severity> for u8 {
    fn from(value: Severity) -> Self {
        value.0
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/10", self.0)
    }
}

// ============================================
// Entry
// ============================================

/// Caption stored when the user leaves it blank.
pub const DEFAULT_CAPTION: &str = "Manifesting a better day...";

/// One journaled moment. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Opaque unique token
    pub id: String,
    /// Creation time, epoch milliseconds
    pub timestamp: i64,
    /// What happened
    pub description: String,
    /// User-written caption
    pub caption: String,
    pub category: Category,
    pub severity: Severity,
    /// The witty line returned by the feedback procedure
    pub reaction: String,
}

impl Entry {
    /// Creation time as a UTC datetime, if the millisecond value is representable.
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.timestamp).single()
    }

    /// Message delivered to a friend when this entry is shared.
    pub fn share_message(&self) -> String {
        format!("\"{}\" - {}", self.caption, self.description)
    }
}

// ============================================
// People
// ============================================

/// Local identity. Nothing checks it; it just labels the journal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub name: String,
    pub handle: String,
}

/// Status shown for newly added friends.
pub const DEFAULT_FRIEND_STATUS: &str = "CHILLING";

/// A contact in the circle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Friend {
    pub id: String,
    pub name: String,
    pub handle: String,
    pub status: String,
    /// Last shared entry; each share overwrites it
    #[serde(default)]
    pub last_message: Option<String>,
}
