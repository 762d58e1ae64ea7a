use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContributionDay {
    pub date: String,
    pub count: u32,
    pub level: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Week {
    pub days: Vec<ContributionDay>,
}

/// One fully computed calendar, exactly as it gets cached on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub login: String,
    pub total: u32,
    pub weeks: Vec<Week>,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub today_count: u32,
    pub fetched_at: i64,
}

#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub login: String,
    pub token: Option<String>,
}

/// Maps GitHub's calendar cell colors onto intensity levels 0..=4.
/// Unknown colors fall back on the count: zero stays 0, anything else is 4.
pub fn level_for_color(color: &str, count: u32) -> u8 {
    match color.to_ascii_lowercase().as_str() {
        "#ebedf0" | "#161b22" => 0,
        "#9be9a8" | "#0e4429" => 1,
        "#40c463" | "#006d32" => 2,
        "#30a14e" | "#26a641" => 3,
        "#216e39" | "#39d353" => 4,
        _ => {
            if count == 0 {
                0
            } else {
                4
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_for_known_light_colors() {
        assert_eq!(level_for_color("#ebedf0", 0), 0);
        assert_eq!(level_for_color("#9be9a8", 1), 1);
        assert_eq!(level_for_color("#40c463", 4), 2);
        assert_eq!(level_for_color("#30a14e", 8), 3);
        assert_eq!(level_for_color("#216e39", 20), 4);
    }

    #[test]
    fn level_for_known_dark_colors() {
        assert_eq!(level_for_color("#161b22", 0), 0);
        assert_eq!(level_for_color("#0e4429", 1), 1);
        assert_eq!(level_for_color("#006d32", 4), 2);
        assert_eq!(level_for_color("#26a641", 8), 3);
        assert_eq!(level_for_color("#39d353", 20), 4);
    }

    #[test]
    fn level_ignores_hex_case() {
        assert_eq!(level_for_color("#EBEDF0", 0), 0);
        assert_eq!(level_for_color("#39D353", 9), 4);
    }

    #[test]
    fn unknown_color_falls_back_to_count() {
        assert_eq!(level_for_color("#123456", 0), 0);
        assert_eq!(level_for_color("#123456", 3), 4);
        assert_eq!(level_for_color("", 1), 4);
    }

    #[test]
    fn snapshot_round_trips_through_json() {
        let snapshot = Snapshot {
            login: "octocat".to_string(),
            total: 1234,
            weeks: vec![Week {
                days: vec![ContributionDay {
                    date: "2026-08-22".to_string(),
                    count: 5,
                    level: 2,
                }],
            }],
            current_streak: 3,
            longest_streak: 11,
            today_count: 5,
            fetched_at: 1_766_000_000_000,
        };
        let json = serde_json::to_string(&snapshot).unwrap();
        let back: Snapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snapshot);
    }

}
