//! Per-entry outcomes of batch registry operations.

use crate::error::ConfigError;
use std::collections::BTreeMap;

/// What happened to one entry during a batch operation.
#[derive(Debug)]
pub enum EntryOutcome {
    Saved,
    /// The file was missing and a default was written.
    Created,
    Reloaded,
    /// The file was gone, so the entry was evicted.
    Removed,
    Failed(ConfigError),
}

impl EntryOutcome {
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            EntryOutcome::Saved | EntryOutcome::Created | EntryOutcome::Reloaded
        )
    }
}

/// Outcome of `save_all`, `load_all` or `reload_all`, keyed by file name.
#[derive(Debug, Default)]
pub struct BatchReport {
    outcomes: BTreeMap<String, EntryOutcome>,
}

impl BatchReport {
    pub(crate) fn record(&mut self, file_name: impl Into<String>, outcome: EntryOutcome) {
        self.outcomes.insert(file_name.into(), outcome);
    }

    pub fn outcome(&self, file_name: &str) -> Option<&EntryOutcome> {
        self.outcomes.get(file_name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &EntryOutcome)> {
        self.outcomes.iter().map(|(name, outcome)| (name.as_str(), outcome))
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Entries that were saved, created or reloaded.
    pub fn success_count(&self) -> usize {
        self.outcomes.values().filter(|o| o.is_success()).count()
    }

    pub fn removed_count(&self) -> usize {
        self.removed().count()
    }

    pub fn removed(&self) -> impl Iterator<Item = &str> {
        self.iter()
            .filter(|(_, outcome)| matches!(outcome, EntryOutcome::Removed))
            .map(|(name, _)| name)
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &ConfigError)> {
        self.iter().filter_map(|(name, outcome)| match outcome {
            EntryOutcome::Failed(err) => Some((name, err)),
            _ => None,
        })
    }

    pub fn failure_count(&self) -> usize {
        self.failures().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts() {
        let mut report = BatchReport::default();
        report.record("a.json", EntryOutcome::Reloaded);
        report.record("b.json", EntryOutcome::Removed);
        report.record(
            "c.json",
            EntryOutcome::Failed(ConfigError::NotRegistered {
                file_name: "c.json".into(),
            }),
        );
        report.record("d.json", EntryOutcome::Created);

        assert_eq!(report.len(), 4);
        assert_eq!(report.success_count(), 2);
        assert_eq!(report.removed_count(), 1);
        assert_eq!(report.removed().collect::<Vec<_>>(), vec!["b.json"]);
        assert_eq!(report.failure_count(), 1);
        assert_eq!(report.failures().next().map(|(name, _)| name), Some("c.json"));
        assert!(matches!(report.outcome("a.json"), Some(EntryOutcome::Reloaded)));
        assert!(report.outcome("zzz.json").is_none());
    }
}
