use tracing::{info, warn};

use crate::dates;
use crate::github::{Calendar, GithubClient, GithubError};
use crate::models::{Credentials, Snapshot};
use crate::stats::{compute_stats, sorted_days};
use crate::storage::{self, Storage};

/// A snapshot ready to display, plus whether it came from the cache
/// because GitHub could not be reached.
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub snapshot: Snapshot,
    pub stale: bool,
}

pub struct Fetcher {
    storage: Storage,
}

impl Fetcher {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    /// Fetches a fresh calendar and persists it. On failure the last
    /// cached snapshot is served instead, marked stale; the error only
    /// propagates when there is nothing cached to fall back on.
    pub fn fetch(&self, credentials: &Credentials) -> Result<FetchOutcome, GithubError> {
        let client = GithubClient::new(credentials.token.clone());
        let fetched = client.fetch_calendar(&credentials.login).map(|calendar| {
            build_snapshot(
                &credentials.login,
                calendar,
                &dates::today_key(),
                storage::now_millis(),
            )
        });

        if let Ok(snapshot) = &fetched {
            info!(login = %credentials.login, total = snapshot.total, "fetched contribution calendar");
            if let Err(err) = self.storage.write_snapshot(snapshot) {
                warn!("failed to persist snapshot: {err}");
            }
        }

        resolve(fetched, || self.storage.read_snapshot())
    }
}

fn resolve(
    fetched: Result<Snapshot, GithubError>,
    cached: impl FnOnce() -> Option<Snapshot>,
) -> Result<FetchOutcome, GithubError> {
    match fetched {
        Ok(snapshot) => Ok(FetchOutcome {
            snapshot,
            stale: false,
        }),
        Err(err) => match cached() {
            Some(snapshot) => {
                warn!("fetch failed ({err}); serving cached snapshot");
                Ok(FetchOutcome {
                    snapshot,
                    stale: true,
                })
            }
            None => Err(err),
        },
    }
}

pub fn build_snapshot(login: &str, calendar: Calendar, today: &str, fetched_at: i64) -> Snapshot {
    let days = sorted_days(&calendar.weeks);
    let stats = compute_stats(&days, today);
    Snapshot {
        login: login.to_string(),
        total: calendar.total,
        weeks: calendar.weeks,
        current_streak: stats.current_streak,
        longest_streak: stats.longest_streak,
        today_count: stats.today_count,
        fetched_at,
    }
}
