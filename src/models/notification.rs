//! Notification model
//!
//! A notification records that `actor` did something (`verb`) that concerns
//! `recipient`, optionally pointing at the object it happened to.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of object a notification points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    User,
    Post,
    Comment,
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetKind::User => write!(f, "user"),
            TargetKind::Post => write!(f, "post"),
            TargetKind::Comment => write!(f, "comment"),
        }
    }
}

impl FromStr for TargetKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(TargetKind::User),
            "post" => Ok(TargetKind::Post),
            "comment" => Ok(TargetKind::Comment),
            _ => Err(anyhow::anyhow!("Invalid notification target type: {}", s)),
        }
    }
}

/// The object a notification refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationTarget {
    pub kind: TargetKind,
    pub id: i64,
}

impl NotificationTarget {
    pub fn user(id: i64) -> Self {
        Self { kind: TargetKind::User, id }
    }

    pub fn post(id: i64) -> Self {
        Self { kind: TargetKind::Post, id }
    }

    pub fn comment(id: i64) -> Self {
        Self { kind: TargetKind::Comment, id }
    }
}

/// Notification entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: i64,
    pub recipient_id: i64,
    pub actor_id: i64,
    pub verb: String,
    pub target: Option<NotificationTarget>,
    pub is_read: bool,
    pub timestamp: DateTime<Utc>,
}

/// A notification about to be written
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub recipient_id: i64,
    pub actor_id: i64,
    pub verb: String,
    pub target: Option<NotificationTarget>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_kind_round_trip_through_text() {
        for kind in [TargetKind::User, TargetKind::Post, TargetKind::Comment] {
            assert_eq!(TargetKind::from_str(&kind.to_string()).unwrap(), kind);
        }
        assert_eq!(TargetKind::from_str("POST").unwrap(), TargetKind::Post);
        assert!(TargetKind::from_str("book").is_err());
    }
}
