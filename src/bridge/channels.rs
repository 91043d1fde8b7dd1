//! Per-channel fingerprint bookkeeping.
//!
//! This module provides the `ChannelTable`, which records the last fingerprint pushed to the
//! widget on each notification channel. The orchestrator consults it before every push and
//! updates it only after the widget accepted the notification. It also counts pushes, skips
//! and failures so a bridge session can be summarized when it ends.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, info};

/// A logical notification stream with its own last-sent fingerprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Channel {
    Cart,
    Product,
    Variant,
    Page,
    Locale,
}

impl Channel {
    pub const ALL: [Channel; 5] = [
        Channel::Cart,
        Channel::Product,
        Channel::Variant,
        Channel::Page,
        Channel::Locale,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Cart => "cart",
            Channel::Product => "product",
            Channel::Variant => "variant",
            Channel::Page => "page",
            Channel::Locale => "locale",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Last accepted push on a channel
#[derive(Debug, Clone)]
pub struct ChannelRecord {
    pub fingerprint: String,
    pub last_pushed_at: DateTime<Utc>,
}

/// Fingerprint table owned by a single bridge instance
#[derive(Debug, Default)]
pub struct ChannelTable {
    records: HashMap<Channel, ChannelRecord>,
    stats: HashMap<Channel, ChannelCounters>,
    last_logged_pushes: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChannelCounters {
    pub pushed: u64,
    pub suppressed: u64,
    pub failed: u64,
}

impl ChannelTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `fingerprint` differs from the last one accepted on `channel`.
    ///
    /// A channel that never pushed has no fingerprint, so anything differs from it.
    pub fn has_changed(&self, channel: Channel, fingerprint: &str) -> bool {
        self.records
            .get(&channel)
            .is_none_or(|record| record.fingerprint != fingerprint)
    }

    /// Record a push the widget accepted.
    pub fn record_pushed(&mut self, channel: Channel, fingerprint: String) {
        self.records.insert(
            channel,
            ChannelRecord {
                fingerprint,
                last_pushed_at: Utc::now(),
            },
        );
        self.stats.entry(channel).or_default().pushed += 1;
    }

    pub fn record_suppressed(&mut self, channel: Channel) {
        self.stats.entry(channel).or_default().suppressed += 1;
    }

    /// Record a push the widget rejected. The stored fingerprint stays as it was.
    pub fn record_failed(&mut self, channel: Channel) {
        self.stats.entry(channel).or_default().failed += 1;
    }

    /// Drop `channel`'s fingerprint so its next value is pushed whatever it is.
    pub fn forget(&mut self, channel: Channel) {
        if self.records.remove(&channel).is_some() {
            debug!("Forgot {} channel fingerprint", channel);
        }
    }

    pub fn last_pushed_at(&self, channel: Channel) -> Option<DateTime<Utc>> {
        self.records.get(&channel).map(|record| record.last_pushed_at)
    }

    pub fn fingerprint(&self, channel: Channel) -> Option<&str> {
        self.records
            .get(&channel)
            .map(|record| record.fingerprint.as_str())
    }

    /// Log the totals every `every` accepted pushes, or when forced.
    pub fn log_progress(&mut self, every: u64, force: bool) {
        let stats = self.get_stats();
        let since_last = stats.total_pushed().saturating_sub(self.last_logged_pushes);
        if force || (every > 0 && since_last >= every) {
            info!("Bridge channels: {}", stats.summary());
            for channel in Channel::ALL {
                if let Some(at) = self.last_pushed_at(channel) {
                    debug!("Last {} push at {}", channel, at.format("%H:%M:%S%.3f"));
                }
            }
            self.last_logged_pushes = stats.total_pushed();
        }
    }

    pub fn get_stats(&self) -> ChannelStats {
        ChannelStats {
            per_channel: Channel::ALL
                .iter()
                .map(|channel| {
                    (
                        *channel,
                        self.stats.get(channel).copied().unwrap_or_default(),
                    )
                })
                .collect(),
        }
    }
}

/// Push statistics for a bridge session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelStats {
    pub per_channel: Vec<(Channel, ChannelCounters)>,
}

impl ChannelStats {
    pub fn counters(&self, channel: Channel) -> ChannelCounters {
        self.per_channel
            .iter()
            .find(|(c, _)| *c == channel)
            .map(|(_, counters)| *counters)
            .unwrap_or_default()
    }

    pub fn total_pushed(&self) -> u64 {
        self.per_channel.iter().map(|(_, c)| c.pushed).sum()
    }

    /// Get a human-readable summary of the channel statistics
    pub fn summary(&self) -> String {
        self.per_channel
            .iter()
            .map(|(channel, c)| {
                let mut line = format!("{} {} pushed/{} suppressed", channel, c.pushed, c.suppressed);
                if c.failed > 0 {
                    line.push_str(&format!("/{} failed", c.failed));
                }
                line
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_channel_always_changed() {
        let table = ChannelTable::new();
        assert!(table.has_changed(Channel::Cart, ""));
        assert!(table.has_changed(Channel::Cart, "{}"));
    }

    #[test]
    fn pushed_fingerprint_suppresses_repeat() {
        let mut table = ChannelTable::new();
        table.record_pushed(Channel::Page, "\"home\"".to_string());

        assert!(!table.has_changed(Channel::Page, "\"home\""));
        assert!(table.has_changed(Channel::Page, "\"product\""));
        // channels are independent
        assert!(table.has_changed(Channel::Locale, "\"home\""));
    }

    #[test]
    fn failures_do_not_touch_the_fingerprint() {
        let mut table = ChannelTable::new();
        table.record_pushed(Channel::Cart, "a".to_string());
        table.record_failed(Channel::Cart);

        assert_eq!(table.fingerprint(Channel::Cart), Some("a"));
        assert_eq!(
            table.get_stats().counters(Channel::Cart),
            ChannelCounters {
                pushed: 1,
                suppressed: 0,
                failed: 1
            }
        );
    }

    #[test]
    fn forgotten_channel_pushes_again() {
        let mut table = ChannelTable::new();
        table.record_pushed(Channel::Product, "p".to_string());
        assert!(table.last_pushed_at(Channel::Product).is_some());

        table.forget(Channel::Product);

        assert!(table.has_changed(Channel::Product, "p"));
        assert_eq!(table.last_pushed_at(Channel::Product), None);
        // counters survive
        assert_eq!(table.get_stats().counters(Channel::Product).pushed, 1);
    }

    #[test]
    fn summary_lists_every_channel() {
        let mut table = ChannelTable::new();
        table.record_pushed(Channel::Cart, "a".to_string());
        table.record_suppressed(Channel::Cart);

        let summary = table.get_stats().summary();
        assert!(summary.starts_with("cart 1 pushed/1 suppressed"));
        assert!(summary.contains("locale 0 pushed/0 suppressed"));
        assert_eq!(table.get_stats().total_pushed(), 1);
    }
}
