use std::thread;
use std::time::Duration;

use chrono::{DateTime, Local};
use tracing::{error, info};

use crate::dates;
use crate::storage::Storage;
use crate::wallpaper::{self, ApplyError, WallpaperTarget};

const RETRY_MINUTES: u64 = 15;

/// Local wall-clock time of the daily refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    pub hour: u32,
    pub minute: u32,
}

impl Default for Schedule {
    fn default() -> Self {
        Self { hour: 0, minute: 5 }
    }
}

impl Schedule {
    pub fn parse(value: &str) -> Result<Self, String> {
        let (hour, minute) = value
            .split_once(':')
            .ok_or_else(|| "Invalid time format. Use HH:MM.".to_string())?;
        let hour: u32 = hour
            .parse()
            .map_err(|_| "Invalid time format. Use HH:MM.".to_string())?;
        let minute: u32 = minute
            .parse()
            .map_err(|_| "Invalid time format. Use HH:MM.".to_string())?;
        if hour > 23 || minute > 59 {
            return Err("Time must be between 00:00 and 23:59.".to_string());
        }
        Ok(Self { hour, minute })
    }

    /// The next anchor strictly after `now`. An anchor that already
    /// passed today moves to tomorrow.
    pub fn next_run(&self, now: DateTime<Local>) -> DateTime<Local> {
        let mut next = dates::local_datetime(now.date_naive(), self.hour, self.minute, 0);
        if next <= now {
            next += chrono::Duration::days(1);
        }
        next
    }
}

/// Refreshes the wallpaper once a day at the scheduled time, retrying
/// failed refreshes every 15 minutes until the next anchor takes over.
pub fn run(storage: &Storage, target: &WallpaperTarget, schedule: Schedule, immediately: bool) {
    info!(
        output = %target.output.display(),
        "daemon started; refreshing daily at {:02}:{:02}",
        schedule.hour,
        schedule.minute
    );

    if immediately {
        refresh_with_retries(storage, target, schedule);
    }

    loop {
        let now = Local::now();
        let next = schedule.next_run(now);
        let wait = (next - now).to_std().unwrap_or(Duration::from_secs(60));
        info!("next refresh at {}", next.format("%Y-%m-%d %H:%M:%S"));
        thread::sleep(wait);
        refresh_with_retries(storage, target, schedule);
    }
}

fn refresh_with_retries(storage: &Storage, target: &WallpaperTarget, schedule: Schedule) {
    loop {
        match wallpaper::apply(storage, target) {
            Ok(outcome) => {
                if outcome.stale {
                    info!("GitHub unreachable; wallpaper rebuilt from the cached snapshot");
                } else {
                    info!(total = outcome.snapshot.total, "wallpaper refreshed");
                }
                return;
            }
            Err(ApplyError::NotConfigured) => {
                info!("no GitHub username configured; skipping this cycle");
                return;
            }
            Err(err) => {
                let now = Local::now();
                let retry_at = now + chrono::Duration::minutes(RETRY_MINUTES as i64);
                if retry_at >= schedule.next_run(now) {
                    error!("refresh failed: {err}; the next scheduled run comes first");
                    return;
                }
                error!("refresh failed: {err}; retrying in {RETRY_MINUTES} minutes");
                thread::sleep(Duration::from_secs(RETRY_MINUTES * 60));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(date: (i32, u32, u32), hour: u32, minute: u32) -> DateTime<Local> {
        let date = NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap();
        dates::local_datetime(date, hour, minute, 0)
    }

    #[test]
    fn parse_accepts_padded_and_bare_hours() {
        assert_eq!(Schedule::parse("00:05").unwrap(), Schedule { hour: 0, minute: 5 });
        assert_eq!(Schedule::parse("7:30").unwrap(), Schedule { hour: 7, minute: 30 });
    }

    #[test]
    fn parse_rejects_out_of_range_times() {
        assert!(Schedule::parse("24:00").is_err());
        assert!(Schedule::parse("12:60").is_err());
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(Schedule::parse("noonish").is_err());
        assert!(Schedule::parse("12").is_err());
        assert!(Schedule::parse("aa:bb").is_err());
    }

    #[test]
    fn next_run_later_today() {
        let schedule = Schedule { hour: 23, minute: 0 };
        let now = at((2026, 8, 22), 10, 0);
        assert_eq!(schedule.next_run(now), at((2026, 8, 22), 23, 0));
    }

    #[test]
    fn next_run_rolls_to_tomorrow_when_passed() {
        let schedule = Schedule { hour: 0, minute: 5 };
        let now = at((2026, 8, 22), 10, 0);
        assert_eq!(schedule.next_run(now), at((2026, 8, 23), 0, 5));
    }

    #[test]
    fn next_run_at_the_anchor_moves_on() {
        let schedule = Schedule { hour: 12, minute: 30 };
        let now = at((2026, 8, 22), 12, 30);
        assert_eq!(schedule.next_run(now), at((2026, 8, 23), 12, 30));
    }
}
