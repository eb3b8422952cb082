//! Cross-run ledger of previously-seen record identifiers, one capped
//! insertion-ordered sequence per source.
//!
//! The backing file is a single JSON object `{ "hpd": ["123", ...], ... }`.
//! Loading tolerates a missing or corrupt file (the run proceeds with empty
//! state, at worst re-notifying already-seen leads); unknown source keys in
//! the file are ignored and missing keys default empty, so the schema can
//! drift in either direction without a fatal error.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::io::Write;
use std::path::{Path, PathBuf};

use leadtrap_common::{MonitorError, SourceKind};
use tracing::{info, warn};

/// Identifiers kept per source. Oldest evicted first once exceeded.
pub const RETENTION: usize = 2000;

#[derive(Debug, Default)]
struct SeenIds {
    /// Discovery order, oldest first.
    order: Vec<String>,
    /// Same ids, for O(1) membership.
    index: HashSet<String>,
}

#[derive(Debug)]
pub struct Ledger {
    path: PathBuf,
    sources: HashMap<SourceKind, SeenIds>,
}

impl Ledger {
    /// Load the ledger from `path`. Never fails: a missing file starts
    /// empty, a corrupt file is logged and replaced with empty state.
    pub fn load(path: impl Into<PathBuf>) -> Ledger {
        let path = path.into();
        let mut ledger = Ledger {
            path: path.clone(),
            sources: SourceKind::ALL
                .iter()
                .map(|k| (*k, SeenIds::default()))
                .collect(),
        };

        let raw = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(_) => {
                info!(path = %path.display(), "No ledger file, starting empty");
                return ledger;
            }
        };

        let parsed: BTreeMap<String, Vec<String>> = match serde_json::from_slice(&raw) {
            Ok(map) => map,
            Err(err) => {
                warn!(path = %path.display(), %err, "Corrupt ledger file, starting empty");
                return ledger;
            }
        };

        for (key, ids) in parsed {
            let Some(kind) = SourceKind::from_key(&key) else {
                warn!(key, "Ignoring unknown source key in ledger file");
                continue;
            };
            let seen = ledger.sources.entry(kind).or_default();
            for id in ids {
                if seen.index.insert(id.clone()) {
                    seen.order.push(id);
                }
            }
        }

        ledger
    }

    pub fn contains(&self, source: SourceKind, id: &str) -> bool {
        self.sources
            .get(&source)
            .is_some_and(|seen| seen.index.contains(id))
    }

    /// Record an identifier. Returns `true` if it was not already present.
    pub fn record(&mut self, source: SourceKind, id: &str) -> bool {
        let seen = self.sources.entry(source).or_default();
        if !seen.index.insert(id.to_string()) {
            return false;
        }
        seen.order.push(id.to_string());
        true
    }

    pub fn len(&self, source: SourceKind) -> usize {
        self.sources.get(&source).map_or(0, |seen| seen.order.len())
    }

    pub fn is_empty(&self) -> bool {
        self.sources.values().all(|seen| seen.order.is_empty())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Trim each source to the newest `RETENTION` ids and write the full
    /// state atomically (temp file in the target directory, then rename).
    pub fn persist(&mut self) -> Result<(), MonitorError> {
        for seen in self.sources.values_mut() {
            if seen.order.len() > RETENTION {
                let evict = seen.order.len() - RETENTION;
                for id in seen.order.drain(..evict) {
                    seen.index.remove(&id);
                }
            }
        }

        let state: BTreeMap<&str, &Vec<String>> = self
            .sources
            .iter()
            .map(|(kind, seen)| (kind.key(), &seen.order))
            .collect();
        let json = serde_json::to_vec(&state)
            .map_err(|err| MonitorError::LedgerPersist(err.to_string()))?;

        let dir = self.path.parent().filter(|p| !p.as_os_str().is_empty());
        let mut tmp = tempfile::NamedTempFile::new_in(dir.unwrap_or(Path::new(".")))
            .map_err(|err| MonitorError::LedgerPersist(err.to_string()))?;
        tmp.write_all(&json)
            .map_err(|err| MonitorError::LedgerPersist(err.to_string()))?;
        tmp.persist(&self.path)
            .map_err(|err| MonitorError::LedgerPersist(err.to_string()))?;

        info!(path = %self.path.display(), "Ledger persisted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_starts_empty() {
        let dir = tempfile::TempDir::new().unwrap();
        let ledger = Ledger::load(dir.path().join("seen_leads.json"));
        assert!(ledger.is_empty());
        for kind in SourceKind::ALL {
            assert_eq!(ledger.len(kind), 0);
        }
    }

    #[test]
    fn record_and_contains() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut ledger = Ledger::load(dir.path().join("seen_leads.json"));

        assert!(ledger.record(SourceKind::Hpd, "v1"));
        assert!(!ledger.record(SourceKind::Hpd, "v1"));
        assert!(ledger.contains(SourceKind::Hpd, "v1"));
        // Same id under another source is independent.
        assert!(!ledger.contains(SourceKind::Dob, "v1"));
        assert_eq!(ledger.len(SourceKind::Hpd), 1);
    }

    #[test]
    fn persist_roundtrip() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("seen_leads.json");

        let mut ledger = Ledger::load(&path);
        ledger.record(SourceKind::Hpd, "v1");
        ledger.record(SourceKind::Reddit, "abc123");
        ledger.persist().unwrap();

        let reloaded = Ledger::load(&path);
        assert!(reloaded.contains(SourceKind::Hpd, "v1"));
        assert!(reloaded.contains(SourceKind::Reddit, "abc123"));
        assert!(!reloaded.contains(SourceKind::Hpd, "v2"));
    }

    #[test]
    fn corrupt_file_starts_empty() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("seen_leads.json");
        std::fs::write(&path, b"{not json").unwrap();

        let ledger = Ledger::load(&path);
        assert!(ledger.is_empty());
    }

    #[test]
    fn unknown_source_keys_ignored() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("seen_leads.json");
        std::fs::write(&path, br#"{"hpd": ["v1"], "myspace": ["x"]}"#).unwrap();

        let ledger = Ledger::load(&path);
        assert!(ledger.contains(SourceKind::Hpd, "v1"));
        assert_eq!(ledger.len(SourceKind::Hpd), 1);
    }

    #[test]
    fn retention_evicts_oldest_first() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("seen_leads.json");

        let mut ledger = Ledger::load(&path);
        for i in 0..RETENTION + 100 {
            ledger.record(SourceKind::Complaints311, &format!("id-{i}"));
        }
        ledger.persist().unwrap();

        assert_eq!(ledger.len(SourceKind::Complaints311), RETENTION);
        // The first 100 were evicted, the newest cap survives.
        assert!(!ledger.contains(SourceKind::Complaints311, "id-0"));
        assert!(!ledger.contains(SourceKind::Complaints311, "id-99"));
        assert!(ledger.contains(SourceKind::Complaints311, "id-100"));
        assert!(ledger.contains(SourceKind::Complaints311, &format!("id-{}", RETENTION + 99)));

        // Evicted ids become recordable again after reload.
        let mut reloaded = Ledger::load(&path);
        assert!(reloaded.record(SourceKind::Complaints311, "id-0"));
    }
}
