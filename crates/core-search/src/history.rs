//! Process-wide search-string histories, one ring per flavor.
//!
//! The registry is built once at startup from `SearchConfig` and handed to
//! each session by `&mut`; it outlives every session so strings committed in
//! one are available to the next.

use core_config::{RotationPolicy, SearchConfig};
use core_ring::{RingBuffer, RotationMode};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HistoryFlavor {
    Text,
    Regex,
}

impl HistoryFlavor {
    pub fn from_regex_flag(regex: bool) -> Self {
        if regex {
            HistoryFlavor::Regex
        } else {
            HistoryFlavor::Text
        }
    }
}

#[derive(Debug)]
pub struct HistoryRegistry {
    text: RingBuffer<String>,
    regex: RingBuffer<String>,
}

impl Default for HistoryRegistry {
    fn default() -> Self {
        Self::from_config(&SearchConfig::defaults())
    }
}

impl HistoryRegistry {
    pub fn new(capacity: usize, mode: RotationMode) -> Self {
        Self {
            text: RingBuffer::new(capacity).with_mode(mode),
            regex: RingBuffer::new(capacity).with_mode(mode),
        }
    }

    pub fn from_config(cfg: &SearchConfig) -> Self {
        let mode = match cfg.rotation() {
            RotationPolicy::Wrap => RotationMode::Wrap,
            RotationPolicy::Bounded => RotationMode::Bounded,
        };
        Self::new(cfg.effective_history_capacity, mode)
    }

    pub fn ring(&self, flavor: HistoryFlavor) -> &RingBuffer<String> {
        match flavor {
            HistoryFlavor::Text => &self.text,
            HistoryFlavor::Regex => &self.regex,
        }
    }

    pub fn ring_mut(&mut self, flavor: HistoryFlavor) -> &mut RingBuffer<String> {
        match flavor {
            HistoryFlavor::Text => &mut self.text,
            HistoryFlavor::Regex => &mut self.regex,
        }
    }

    /// Append a committed string unless the ring considers it a duplicate.
    /// Returns whether it was stored.
    pub fn remember(&mut self, flavor: HistoryFlavor, value: &str) -> bool {
        let ring = self.ring_mut(flavor);
        if ring.is_duplicate(value) {
            debug!(target: "search.history", ?flavor, "history_duplicate_skipped");
            return false;
        }
        let stored = ring.put_next(value.to_string()).is_ok();
        debug!(target: "search.history", ?flavor, len = ring.len(), stored, "history_remembered");
        stored
    }

    /// Most recently stored string.
    pub fn latest(&self, flavor: HistoryFlavor) -> Option<&str> {
        self.ring(flavor).current().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flavors_are_independent() {
        let mut h = HistoryRegistry::new(4, RotationMode::Wrap);
        assert!(h.remember(HistoryFlavor::Text, "foo"));
        assert!(h.remember(HistoryFlavor::Regex, "f.o"));
        assert_eq!(h.latest(HistoryFlavor::Text), Some("foo"));
        assert_eq!(h.latest(HistoryFlavor::Regex), Some("f.o"));
    }

    #[test]
    fn duplicates_and_empty_strings_are_not_stored() {
        let mut h = HistoryRegistry::new(4, RotationMode::Wrap);
        assert!(h.remember(HistoryFlavor::Text, "foo"));
        assert!(!h.remember(HistoryFlavor::Text, "foo"));
        assert!(!h.remember(HistoryFlavor::Text, ""));
        assert_eq!(h.ring(HistoryFlavor::Text).len(), 1);
    }

    #[test]
    fn built_from_config() {
        let cfg = core_config::parse("[history]\ncapacity = 2\nrotation = \"bounded\"\n").unwrap();
        let h = HistoryRegistry::from_config(&cfg);
        assert_eq!(h.ring(HistoryFlavor::Text).capacity(), 2);
        assert_eq!(h.ring(HistoryFlavor::Regex).mode(), RotationMode::Bounded);
    }
}
