//! Profile and team tables built from raw spreadsheet rows

use serde::{Deserialize, Serialize};

/// Column holding the team number in the team sheet
const TEAM_NUMBER_COLUMN: usize = 0;

/// Profile sheet: header row plus non-blank data rows
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileTable {
    pub headers: Vec<String>,
    pub profiles: Vec<Vec<String>>,
}

impl ProfileTable {
    /// First row is the header; rows whose cells are all blank are dropped.
    /// Fewer than two rows means the sheet has no data yet: `None`.
    pub fn from_rows(rows: Vec<Vec<String>>) -> Option<Self> {
        if rows.len() < 2 {
            return None;
        }

        let mut rows = rows.into_iter();
        let headers = rows.next().unwrap_or_default();
        let profiles = rows
            .filter(|row| row.iter().any(|cell| !cell.trim().is_empty()))
            .collect();

        Some(Self { headers, profiles })
    }
}

/// Team sheet: header row plus rows with a valid team number
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamTable {
    pub headers: Vec<String>,
    pub teams: Vec<Vec<String>>,
}

impl TeamTable {
    /// First row is the header; data rows are kept only when their team
    /// number cell is a positive integer. Fewer than two rows yields `None`.
    pub fn from_rows(rows: Vec<Vec<String>>) -> Option<Self> {
        if rows.len() < 2 {
            return None;
        }

        let mut rows = rows.into_iter();
        let headers = rows.next().unwrap_or_default();
        let teams = rows
            .filter(|row| {
                row.get(TEAM_NUMBER_COLUMN)
                    .is_some_and(|cell| is_valid_team_number(cell))
            })
            .collect();

        Some(Self { headers, teams })
    }
}

/// ASCII digits only (after trimming) with a value greater than zero
pub fn is_valid_team_number(cell: &str) -> bool {
    let cell = cell.trim();
    !cell.is_empty()
        && cell.bytes().all(|b| b.is_ascii_digit())
        && cell.bytes().any(|b| b != b'0')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_team_number_validation() {
        assert!(is_valid_team_number("3"));
        assert!(is_valid_team_number(" 12 "));
        assert!(is_valid_team_number("03"));
        assert!(is_valid_team_number("99999999999999999999999"));

        assert!(!is_valid_team_number("0"));
        assert!(!is_valid_team_number("000"));
        assert!(!is_valid_team_number(""));
        assert!(!is_valid_team_number("   "));
        assert!(!is_valid_team_number("abc"));
        assert!(!is_valid_team_number("-1"));
        assert!(!is_valid_team_number("1.5"));
        assert!(!is_valid_team_number("３"));
    }

    #[test]
    fn test_team_table_filters_rows() {
        let table = TeamTable::from_rows(vec![
            row(&["팀(조) 번호", "인원", "현재 실제 인원", "팀장"]),
            row(&["0", "4", "4", "zero"]),
            row(&["", "4", "4", "blank"]),
            row(&["abc", "4", "4", "letters"]),
            row(&["3", "4", "3", "kept"]),
            row(&[]),
        ])
        .unwrap();

        assert_eq!(table.headers[0], "팀(조) 번호");
        assert_eq!(table.teams.len(), 1);
        assert_eq!(table.teams[0][3], "kept");
    }

    #[test]
    fn test_profile_table_drops_blank_rows() {
        let table = ProfileTable::from_rows(vec![
            row(&["Timestamp", "Name", "Bio"]),
            row(&["2025-09-01", "Kim", "hello"]),
            row(&["", "  ", ""]),
            row(&[]),
            row(&["", "Lee", ""]),
        ])
        .unwrap();

        assert_eq!(table.headers, row(&["Timestamp", "Name", "Bio"]));
        assert_eq!(table.profiles.len(), 2);
        assert_eq!(table.profiles[1][1], "Lee");
    }

    #[test]
    fn test_header_only_has_no_table() {
        assert_eq!(ProfileTable::from_rows(vec![row(&["Timestamp", "Name"])]), None);
        assert_eq!(TeamTable::from_rows(vec![]), None);
    }

    #[test]
    fn test_table_serialization_shape() {
        let table = TeamTable::from_rows(vec![row(&["번호"]), row(&["1"])]).unwrap();
        let json = serde_json::to_value(&table).unwrap();
        assert_eq!(json["headers"][0], "번호");
        assert_eq!(json["teams"][0][0], "1");
    }
}
