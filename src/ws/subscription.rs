//! Per-connection subscription manager.
//!
//! Tracks which account uids a WebSocket client is subscribed to and
//! provides server-side event filtering.

use std::collections::HashSet;

/// Uid that subscribes to every account.
pub const WILDCARD: &str = "*";

/// Manages the set of account subscriptions for a single WebSocket
/// connection.
#[derive(Debug, Default)]
pub struct SubscriptionManager {
    /// Subscribed uids. If `subscribe_all` is true, this set is ignored.
    uids: HashSet<String>,
    /// Whether the client subscribes to all accounts (wildcard `"*"`).
    subscribe_all: bool,
}

impl SubscriptionManager {
    /// Creates a new empty subscription manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds uids to the subscription set. `"*"` enables the wildcard.
    ///
    /// Returns the uids that were added explicitly.
    pub fn subscribe(&mut self, uids: &[String]) -> Vec<String> {
        let mut added = Vec::new();
        for uid in uids.iter().map(|u| u.trim()).filter(|u| !u.is_empty()) {
            if uid == WILDCARD {
                self.subscribe_all = true;
            } else if self.uids.insert(uid.to_string()) {
                added.push(uid.to_string());
            }
        }
        added
    }

    /// Removes uids from the subscription set. `"*"` drops the wildcard.
    pub fn unsubscribe(&mut self, uids: &[String]) {
        for uid in uids.iter().map(|u| u.trim()) {
            if uid == WILDCARD {
                self.subscribe_all = false;
            } else {
                self.uids.remove(uid);
            }
        }
    }

    /// Returns `true` if events of `uid` pass the subscription filter.
    #[must_use]
    pub fn matches(&self, uid: &str) -> bool {
        self.subscribe_all || self.uids.contains(uid)
    }

    /// Returns the number of explicitly subscribed uids.
    #[must_use]
    pub fn count(&self) -> usize {
        self.uids.len()
    }

    /// Returns `true` if the wildcard subscription is active.
    #[must_use]
    pub fn is_subscribed_all(&self) -> bool {
        self.subscribe_all
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn uids(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn empty_matches_nothing() {
        let mgr = SubscriptionManager::new();
        assert!(!mgr.matches("u1"));
    }

    #[test]
    fn subscribe_specific_account() {
        let mut mgr = SubscriptionManager::new();
        assert_eq!(mgr.subscribe(&uids(&["u1", " u1 ", ""])), uids(&["u1"]));
        assert!(mgr.matches("u1"));
        assert!(!mgr.matches("u2"));
        assert_eq!(mgr.count(), 1);
    }

    #[test]
    fn wildcard_matches_everything_until_dropped() {
        let mut mgr = SubscriptionManager::new();
        assert!(mgr.subscribe(&uids(&["*"])).is_empty());
        assert!(mgr.matches("u1"));
        assert!(mgr.is_subscribed_all());

        mgr.unsubscribe(&uids(&["*"]));
        assert!(!mgr.matches("u1"));
    }

    #[test]
    fn unsubscribe_removes_account() {
        let mut mgr = SubscriptionManager::new();
        mgr.subscribe(&uids(&["u1", "u2"]));
        mgr.unsubscribe(&uids(&["u1"]));
        assert!(!mgr.matches("u1"));
        assert!(mgr.matches("u2"));
    }
}
