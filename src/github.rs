use std::fmt;
use std::time::Duration;

use reqwest::blocking::Client;
use serde::Deserialize;

use crate::models::{level_for_color, ContributionDay, Week};

const GRAPHQL_URL: &str = "https://api.github.com/graphql";

const CALENDAR_QUERY: &str = "\
query($login: String!) { \
user(login: $login) { \
contributionsCollection { \
contributionCalendar { \
totalContributions \
weeks { contributionDays { date contributionCount color } } \
} } } }";

#[derive(Debug, Clone)]
pub enum GithubError {
    Unauthorized,
    RateLimited,
    UserNotFound(String),
    Api(String),
    Network(String),
}

impl fmt::Display for GithubError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GithubError::Unauthorized => {
                write!(f, "GitHub rejected the request. Check your token.")
            }
            GithubError::RateLimited => {
                write!(f, "GitHub rate limit hit. Try again later or add a token.")
            }
            GithubError::UserNotFound(login) => write!(f, "No GitHub user named '{login}'."),
            GithubError::Api(message) => write!(f, "GitHub API error: {message}"),
            GithubError::Network(message) => write!(f, "Network error: {message}"),
        }
    }
}

impl std::error::Error for GithubError {}

/// One fetched contribution calendar, before streaks are computed.
#[derive(Debug, Clone)]
pub struct Calendar {
    pub total: u32,
    pub weeks: Vec<Week>,
}

#[derive(Clone)]
pub struct GithubClient {
    client: Client,
    token: Option<String>,
}

impl GithubClient {
    pub fn new(token: Option<String>) -> Self {
        let client = Client::builder()
            .user_agent("streakwall")
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to build HTTP client");
        Self { client, token }
    }

    /// Fetches the rolling-year contribution calendar for `login`.
    /// The Bearer header is attached only when a token is present.
    pub fn fetch_calendar(&self, login: &str) -> Result<Calendar, GithubError> {
        let body = serde_json::json!({
            "query": CALENDAR_QUERY,
            "variables": { "login": login },
        });

        let mut request = self.client.post(GRAPHQL_URL).json(&body);

        if let Some(token) = &self.token {
            request = request.header("Authorization", format!("Bearer {}", token));
        }

        let response = request
            .send()
            .map_err(|err| GithubError::Network(err.to_string()))?;

        if response.status() == 401 || response.status() == 403 {
            return Err(GithubError::Unauthorized);
        }

        if response.status() == 429 {
            return Err(GithubError::RateLimited);
        }

        if !response.status().is_success() {
            return Err(GithubError::Api(response.status().to_string()));
        }

        let payload = response
            .json::<GraphQlResponse>()
            .map_err(|err| GithubError::Network(err.to_string()))?;

        parse_calendar(login, payload)
    }
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    data: Option<ResponseData>,
    errors: Option<Vec<GraphQlError>>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct ResponseData {
    user: Option<UserNode>,
}

#[derive(Debug, Deserialize)]
struct UserNode {
    #[serde(rename = "contributionsCollection")]
    contributions: ContributionsNode,
}

#[derive(Debug, Deserialize)]
struct ContributionsNode {
    #[serde(rename = "contributionCalendar")]
    calendar: CalendarNode,
}

#[derive(Debug, Deserialize)]
struct CalendarNode {
    #[serde(rename = "totalContributions")]
    total_contributions: u32,
    weeks: Vec<WeekNode>,
}

#[derive(Debug, Deserialize)]
struct WeekNode {
    #[serde(rename = "contributionDays")]
    contribution_days: Vec<DayNode>,
}

#[derive(Debug, Deserialize)]
struct DayNode {
    date: String,
    #[serde(rename = "contributionCount")]
    contribution_count: u32,
    color: String,
}

fn parse_calendar(login: &str, payload: GraphQlResponse) -> Result<Calendar, GithubError> {
    if let Some(errors) = payload.errors {
        if let Some(first) = errors.into_iter().next() {
            return Err(GithubError::Api(first.message));
        }
    }

    let user = payload
        .data
        .and_then(|data| data.user)
        .ok_or_else(|| GithubError::UserNotFound(login.to_string()))?;

    let calendar = user.contributions.calendar;
    let weeks = calendar
        .weeks
        .into_iter()
        .map(|week| Week {
            days: week
                .contribution_days
                .into_iter()
                .map(|day| ContributionDay {
                    level: level_for_color(&day.color, day.contribution_count),
                    count: day.contribution_count,
                    date: day.date,
                })
                .collect(),
        })
        .collect();

    Ok(Calendar {
        total: calendar.total_contributions,
        weeks,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(value: serde_json::Value) -> GraphQlResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn parses_calendar_payload() {
        let payload = response(serde_json::json!({
            "data": {
                "user": {
                    "contributionsCollection": {
                        "contributionCalendar": {
                            "totalContributions": 42,
                            "weeks": [
                                {
                                    "contributionDays": [
                                        { "date": "2026-08-21", "contributionCount": 0, "color": "#ebedf0" },
                                        { "date": "2026-08-22", "contributionCount": 7, "color": "#216e39" }
                                    ]
                                }
                            ]
                        }
                    }
                }
            }
        }));

        let calendar = parse_calendar("octocat", payload).unwrap();
        assert_eq!(calendar.total, 42);
        assert_eq!(calendar.weeks.len(), 1);
        let days = &calendar.weeks[0].days;
        assert_eq!(days[0].level, 0);
        assert_eq!(days[1].level, 4);
        assert_eq!(days[1].count, 7);
        assert_eq!(days[1].date, "2026-08-22");
    }

    #[test]
    fn missing_user_maps_to_user_not_found() {
        let payload = response(serde_json::json!({ "data": { "user": null } }));
        match parse_calendar("ghost", payload) {
            Err(GithubError::UserNotFound(login)) => assert_eq!(login, "ghost"),
            other => panic!("expected UserNotFound, got {:?}", other),
        }
    }

    #[test]
    fn graphql_errors_surface_their_message() {
        let payload = response(serde_json::json!({
            "data": null,
            "errors": [ { "message": "token scope missing" } ]
        }));
        match parse_calendar("octocat", payload) {
            Err(GithubError::Api(message)) => assert_eq!(message, "token scope missing"),
            other => panic!("expected Api error, got {:?}", other),
        }
    }
}
