use std::collections::HashSet;
use std::str::FromStr;

use crate::error::TableError;
use crate::store::RowStore;

/// Which duplicate detection strategy to run. Parsed from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DedupStrategy {
    Store,
    Memory,
}

impl FromStr for DedupStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "store" => Ok(DedupStrategy::Store),
            "memory" => Ok(DedupStrategy::Memory),
            invalid => Err(format!("{} is not a valid dedup strategy", invalid)),
        }
    }
}

/// Decides whether an incoming message id has been seen before.
///
/// `StoreBacked` queries the row store and therefore stays correct across
/// process restarts. `MemoryBacked` keeps a growing id set in process memory:
/// no query per message, but the set resets on restart, so it is only valid
/// within a single process lifetime.
pub enum DuplicateDetector {
    StoreBacked,
    MemoryBacked { seen: HashSet<i64> },
}

impl DuplicateDetector {
    pub fn new(strategy: DedupStrategy) -> Self {
        match strategy {
            DedupStrategy::Store => DuplicateDetector::StoreBacked,
            DedupStrategy::Memory => DuplicateDetector::MemoryBacked {
                seen: HashSet::new(),
            },
        }
    }

    /// True iff `message_id` was already seen. The memory-backed variant
    /// notes the id unconditionally, so asking is also recording.
    pub async fn is_duplicate(
        &mut self,
        store: &RowStore,
        message_id: i64,
    ) -> Result<bool, TableError> {
        match self {
            DuplicateDetector::StoreBacked => store.exists(message_id).await,
            DuplicateDetector::MemoryBacked { seen } => Ok(!seen.insert(message_id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_backed_flags_second_sighting() {
        let store = RowStore::new("messages", "sqlite::memory:").await.unwrap();
        let mut detector = DuplicateDetector::new(DedupStrategy::Memory);

        assert!(!detector.is_duplicate(&store, 1).await.unwrap());
        assert!(detector.is_duplicate(&store, 1).await.unwrap());
        assert!(!detector.is_duplicate(&store, 2).await.unwrap());
    }

    #[tokio::test]
    async fn store_backed_consults_the_row_store() {
        let store = RowStore::new("messages", "sqlite::memory:").await.unwrap();
        let mut detector = DuplicateDetector::new(DedupStrategy::Store);

        // Nothing inserted yet: repeated checks stay negative.
        assert!(!detector.is_duplicate(&store, 1).await.unwrap());
        assert!(!detector.is_duplicate(&store, 1).await.unwrap());
    }

    #[test]
    fn strategy_parses_from_config_values() {
        assert_eq!("store".parse::<DedupStrategy>().unwrap(), DedupStrategy::Store);
        assert_eq!("memory".parse::<DedupStrategy>().unwrap(), DedupStrategy::Memory);
        assert!("redis".parse::<DedupStrategy>().is_err());
    }
}
