use crate::models::{ContributionDay, Week};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ContributionStats {
    pub current_streak: u32,
    pub longest_streak: u32,
    pub today_count: u32,
}

/// Flattens calendar weeks into one chronological day list.
pub fn sorted_days(weeks: &[Week]) -> Vec<ContributionDay> {
    let mut days: Vec<ContributionDay> = weeks
        .iter()
        .flat_map(|week| week.days.iter().cloned())
        .collect();
    days.sort_by(|a, b| a.date.cmp(&b.date));
    days
}

/// Streak math over a chronological day list. The current streak counts
/// backwards from `today` and only starts once that exact date is seen,
/// so a calendar that does not include today yields zero even when
/// yesterday ended a long run.
pub fn compute_stats(days: &[ContributionDay], today: &str) -> ContributionStats {
    let today_count = days
        .iter()
        .find(|day| day.date == today)
        .map(|day| day.count)
        .unwrap_or(0);

    let mut current_streak = 0;
    let mut found_today = false;
    for day in days.iter().rev() {
        if day.date == today {
            found_today = true;
        }
        if found_today {
            if day.count > 0 {
                current_streak += 1;
            } else {
                break;
            }
        }
    }

    let mut longest_streak = 0;
    let mut run = 0;
    for day in days {
        if day.count > 0 {
            run += 1;
            longest_streak = longest_streak.max(run);
        } else {
            run = 0;
        }
    }

    ContributionStats {
        current_streak,
        longest_streak,
        today_count,
    }
}
