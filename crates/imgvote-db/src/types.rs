use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Like counter row
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ImageLikesRow {
    pub id: String,
    pub likes: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Id and count, as returned by ranking queries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct LikeCount {
    pub id: String,
    pub likes: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_count_serialization() {
        let count = LikeCount {
            id: "0b6e3f0c".to_string(),
            likes: 7,
        };
        let json = serde_json::to_value(&count).unwrap();
        assert_eq!(json["id"], "0b6e3f0c");
        assert_eq!(json["likes"], 7);
    }
}
