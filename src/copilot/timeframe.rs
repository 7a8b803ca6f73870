//! Resolution of timeframe phrases ("tonight", "tomorrow", "monday",
//! "feb 3") to concrete dates.

use chrono::{Datelike, Duration, NaiveDate, Weekday};

/// Resolve a timeframe phrase relative to `today`. Unrecognized or absent
/// phrases resolve to today; a named weekday resolves to its next strictly
/// future occurrence.
pub fn resolve_target_date(timeframe: Option<&str>, today: NaiveDate) -> NaiveDate {
    let Some(raw) = timeframe else {
        return today;
    };
    let phrase = raw.trim().to_lowercase();
    match phrase.as_str() {
        "" | "tonight" | "today" => return today,
        "tomorrow" => return today + Duration::days(1),
        _ => {}
    }

    if let Some(weekday) = parse_weekday(&phrase) {
        return next_occurrence(today, weekday);
    }

    if let Some(date) = parse_month_day(&phrase, today.year()) {
        return date;
    }

    today
}

fn parse_weekday(phrase: &str) -> Option<Weekday> {
    match phrase {
        "monday" => Some(Weekday::Mon),
        "tuesday" => Some(Weekday::Tue),
        "wednesday" => Some(Weekday::Wed),
        "thursday" => Some(Weekday::Thu),
        "friday" => Some(Weekday::Fri),
        "saturday" => Some(Weekday::Sat),
        "sunday" => Some(Weekday::Sun),
        _ => None,
    }
}

/// The next strictly-future occurrence of a weekday; a same-day request
/// means next week.
fn next_occurrence(today: NaiveDate, weekday: Weekday) -> NaiveDate {
    let today_num = today.weekday().num_days_from_monday() as i64;
    let target_num = weekday.num_days_from_monday() as i64;
    let mut days_ahead = (target_num - today_num).rem_euclid(7);
    if days_ahead == 0 {
        days_ahead = 7;
    }
    today + Duration::days(days_ahead)
}

/// Parse literal month-day phrases: "feb 3", "february 3rd". Invalid
/// dates (e.g. "feb 31") return `None` and fall through to today.
fn parse_month_day(phrase: &str, year: i32) -> Option<NaiveDate> {
    let mut parts = phrase.split_whitespace();
    let month = parse_month(parts.next()?)?;
    let day_raw = parts.next()?;
    let day: u32 = day_raw
        .trim_end_matches(|c: char| c.is_ascii_alphabetic() || c == ',')
        .parse()
        .ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

fn parse_month(raw: &str) -> Option<u32> {
    const MONTHS: [&str; 12] = [
        "january",
        "february",
        "march",
        "april",
        "may",
        "june",
        "july",
        "august",
        "september",
        "october",
        "november",
        "december",
    ];
    let lower = raw.to_lowercase();
    MONTHS
        .iter()
        .position(|m| *m == lower || (lower.len() >= 3 && m.starts_with(&lower[..3]) && lower.len() == 3))
        .map(|i| i as u32 + 1)
}

/// Pull the first 4-digit year out of a timeframe phrase ("2015-16 season"
/// -> 2015). Used to pin leaders queries to a season.
pub fn extract_year(timeframe: &str) -> Option<u16> {
    let bytes = timeframe.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i].is_ascii_digit() {
            let start = i;
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
            if i - start == 4 {
                if let Ok(year) = timeframe[start..i].parse() {
                    return Some(year);
                }
            }
        } else {
            i += 1;
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wed() -> NaiveDate {
        // 2026-01-14 is a Wednesday.
        NaiveDate::from_ymd_opt(2026, 1, 14).unwrap()
    }

    #[test]
    fn tonight_and_empty_resolve_to_today() {
        assert_eq!(resolve_target_date(None, wed()), wed());
        assert_eq!(resolve_target_date(Some("tonight"), wed()), wed());
        assert_eq!(resolve_target_date(Some("today"), wed()), wed());
    }

    #[test]
    fn tomorrow_is_one_day_out() {
        assert_eq!(
            resolve_target_date(Some("tomorrow"), wed()),
            NaiveDate::from_ymd_opt(2026, 1, 15).unwrap()
        );
    }

    #[test]
    fn weekdays_resolve_strictly_forward() {
        // Friday from a Wednesday is two days out.
        assert_eq!(
            resolve_target_date(Some("friday"), wed()),
            NaiveDate::from_ymd_opt(2026, 1, 16).unwrap()
        );
        // Monday wraps to next week.
        assert_eq!(
            resolve_target_date(Some("monday"), wed()),
            NaiveDate::from_ymd_opt(2026, 1, 19).unwrap()
        );
        // Same weekday means a week out, not today.
        assert_eq!(
            resolve_target_date(Some("wednesday"), wed()),
            NaiveDate::from_ymd_opt(2026, 1, 21).unwrap()
        );
    }

    #[test]
    fn month_day_phrases_resolve_in_current_year() {
        assert_eq!(
            resolve_target_date(Some("feb 3"), wed()),
            NaiveDate::from_ymd_opt(2026, 2, 3).unwrap()
        );
        assert_eq!(
            resolve_target_date(Some("february 3rd"), wed()),
            NaiveDate::from_ymd_opt(2026, 2, 3).unwrap()
        );
    }

    #[test]
    fn invalid_month_days_fall_through_to_today() {
        assert_eq!(resolve_target_date(Some("feb 31"), wed()), wed());
        assert_eq!(resolve_target_date(Some("smarch 1"), wed()), wed());
        assert_eq!(resolve_target_date(Some("next year sometime"), wed()), wed());
    }

    #[test]
    fn year_extraction() {
        assert_eq!(extract_year("2015-16"), Some(2015));
        assert_eq!(extract_year("in 2015"), Some(2015));
        assert_eq!(extract_year("the 2015-2016 season"), Some(2015));
        assert_eq!(extract_year("last 5 games"), None);
        assert_eq!(extract_year("career"), None);
    }
}
