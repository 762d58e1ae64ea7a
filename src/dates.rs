use chrono::{Datelike, DateTime, Local, NaiveDate, TimeZone};

const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map_err(|_| "Invalid date format. Use YYYY-MM-DD.".to_string())
}

pub fn date_key(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn today_key() -> String {
    date_key(Local::now().date_naive())
}

pub fn current_year() -> i32 {
    Local::now().year()
}

pub fn month_of_key(value: &str) -> Option<u32> {
    parse_date(value).ok().map(|date| date.month())
}

pub fn month_label(month: u32) -> &'static str {
    match month {
        1 => "Jan",
        2 => "Feb",
        3 => "Mar",
        4 => "Apr",
        5 => "May",
        6 => "Jun",
        7 => "Jul",
        8 => "Aug",
        9 => "Sep",
        10 => "Oct",
        11 => "Nov",
        12 => "Dec",
        _ => "",
    }
}

pub fn local_datetime(date: NaiveDate, hour: u32, minute: u32, second: u32) -> DateTime<Local> {
    let result = Local.with_ymd_and_hms(date.year(), date.month(), date.day(), hour, minute, second);
    result
        .earliest()
        .or_else(|| result.latest())
        .unwrap_or_else(Local::now)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_date_valid() {
        let date = parse_date("2026-02-03").unwrap();
        assert_eq!(date.year(), 2026);
        assert_eq!(date.month(), 2);
        assert_eq!(date.day(), 3);
    }

    #[test]
    fn parse_date_invalid() {
        assert!(parse_date("02-03-2026").is_err());
    }

    #[test]
    fn date_key_round_trips() {
        let date = NaiveDate::from_ymd_opt(2026, 8, 22).unwrap();
        let key = date_key(date);
        assert_eq!(key, "2026-08-22");
        assert_eq!(parse_date(&key).unwrap(), date);
    }

    #[test]
    fn month_of_key_reads_month() {
        assert_eq!(month_of_key("2026-11-30"), Some(11));
        assert_eq!(month_of_key("november"), None);
    }

    #[test]
    fn month_labels_cover_year() {
        assert_eq!(month_label(1), "Jan");
        assert_eq!(month_label(12), "Dec");
        assert_eq!(month_label(13), "");
    }
}
