//! Cache types

use serde::{Deserialize, Serialize};

/// Statistics about the disk cache
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub entries: usize,
    pub total_size: u64,
    pub hits: u64,
    pub misses: u64,
    pub writes: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_field_names() {
        let stats = CacheStats {
            entries: 3,
            total_size: 12345,
            hits: 7,
            misses: 2,
            writes: 3,
        };

        let value = serde_json::to_value(&stats).unwrap();
        assert_eq!(value["entries"], 3);
        assert_eq!(value["total_size"], 12345);
        assert_eq!(value["writes"], 3);

        let back: CacheStats = serde_json::from_value(value).unwrap();
        assert_eq!(back, stats);
    }
}
