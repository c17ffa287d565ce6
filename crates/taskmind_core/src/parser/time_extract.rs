//! Date and time-of-day extraction.
//!
//! # Responsibility
//! - Resolve relative and absolute date expressions against a caller clock.
//! - Combine a resolved date with a time-of-day into a reminder timestamp.
//!
//! # Invariants
//! - Never samples the wall clock; `now` is always supplied.
//! - Date patterns are checked in fixed order and the first valid hit wins, so
//!   a relative word beats an absolute date in the same text.
//! - `reminder_time` is only set when a date was resolved.
//! - Month offsets are fixed day counts (`下个月` = +30 days), not calendar
//!   months.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

/// Relative-day words and their fixed offsets, in scan order.
pub const RELATIVE_DAY_WORDS: &[(&str, i64)] = &[
    ("今天", 0),
    ("今日", 0),
    ("明天", 1),
    ("明日", 1),
    ("后天", 2),
    ("下周", 7),
    ("下个月", 30),
];

static DAYS_LATER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{1,3})天后").expect("valid days-later regex"));
static ISO_DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{4})-(\d{1,2})-(\d{1,2})").expect("valid iso date regex"));
static CN_DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{1,2})月(\d{1,2})[日号]").expect("valid month-day regex"));
static SLASH_DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{1,2})/(\d{1,2})").expect("valid slash date regex"));

static CLOCK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{1,2}):(\d{2})").expect("valid clock regex"));
static HOUR_MINUTE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(上午|下午|晚上)?(\d{1,2})点(\d{1,2})分?").expect("valid hour-minute regex")
});
static MORNING_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"上午(\d{1,2})点").expect("valid morning regex"));
static AFTERNOON_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"下午(\d{1,2})点").expect("valid afternoon regex"));
static EVENING_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"晚上(\d{1,2})点").expect("valid evening regex"));
static BARE_HOUR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{1,2})点").expect("valid bare hour regex"));

/// Result of scanning one text for time expressions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeExtraction {
    pub due_date: Option<NaiveDate>,
    pub reminder_time: Option<NaiveDateTime>,
}

impl TimeExtraction {
    /// Days between `today` and the due date, when a due date exists.
    pub fn days_until_due(&self, today: NaiveDate) -> Option<i64> {
        self.due_date.map(|due| (due - today).num_days())
    }
}

/// Extracts a due date and optional reminder from `text`.
///
/// `now` is the reference instant; only its date part is used for offsets and
/// for the default year of `M月D日` / `M/D` dates.
pub fn extract_time(text: &str, now: NaiveDateTime) -> TimeExtraction {
    let lowered = text.to_lowercase();
    let today = now.date();

    let Some(due_date) = resolve_date(&lowered, today) else {
        return TimeExtraction::default();
    };

    let reminder_time = resolve_time_of_day(&lowered).map(|time| due_date.and_time(time));
    TimeExtraction {
        due_date: Some(due_date),
        reminder_time,
    }
}

/// Resolves only the date part; exposed for callers that show a date preview.
pub fn resolve_date(text: &str, today: NaiveDate) -> Option<NaiveDate> {
    if let Some(offset) = RELATIVE_DAY_WORDS
        .iter()
        .find(|(word, _)| text.contains(word))
        .map(|(_, offset)| *offset)
    {
        return today.checked_add_signed(Duration::days(offset));
    }

    if let Some(days) = DAYS_LATER_RE
        .captures(text)
        .and_then(|caps| capture_number::<i64>(&caps, 1))
    {
        return today.checked_add_signed(Duration::days(days));
    }

    let year = today.year();
    let absolute = [
        ISO_DATE_RE.captures(text).and_then(|caps| {
            NaiveDate::from_ymd_opt(
                capture_number(&caps, 1)?,
                capture_number(&caps, 2)?,
                capture_number(&caps, 3)?,
            )
        }),
        CN_DATE_RE.captures(text).and_then(|caps| {
            NaiveDate::from_ymd_opt(year, capture_number(&caps, 1)?, capture_number(&caps, 2)?)
        }),
        SLASH_DATE_RE.captures(text).and_then(|caps| {
            NaiveDate::from_ymd_opt(year, capture_number(&caps, 1)?, capture_number(&caps, 2)?)
        }),
    ];
    absolute.into_iter().flatten().next()
}

/// Resolves the first valid time-of-day expression in fixed pattern order.
pub fn resolve_time_of_day(text: &str) -> Option<NaiveTime> {
    let clock = CLOCK_RE.captures(text).and_then(|caps| {
        NaiveTime::from_hms_opt(capture_number(&caps, 1)?, capture_number(&caps, 2)?, 0)
    });
    if clock.is_some() {
        return clock;
    }

    let hour_minute = HOUR_MINUTE_RE.captures(text).and_then(|caps| {
        let hour = capture_number::<u32>(&caps, 2)?;
        let hour = match caps.get(1).map(|m| m.as_str()) {
            Some(period) => apply_period(period, hour),
            None => hour,
        };
        NaiveTime::from_hms_opt(hour, capture_number(&caps, 3)?, 0)
    });
    if hour_minute.is_some() {
        return hour_minute;
    }

    let period_patterns: [(&Lazy<Regex>, &str); 3] = [
        (&MORNING_RE, "上午"),
        (&AFTERNOON_RE, "下午"),
        (&EVENING_RE, "晚上"),
    ];
    for (pattern, period) in period_patterns {
        let time = pattern.captures(text).and_then(|caps| {
            let hour = apply_period(period, capture_number(&caps, 1)?);
            NaiveTime::from_hms_opt(hour, 0, 0)
        });
        if time.is_some() {
            return time;
        }
    }

    BARE_HOUR_RE
        .captures(text)
        .and_then(|caps| NaiveTime::from_hms_opt(capture_number(&caps, 1)?, 0, 0))
}

fn apply_period(period: &str, hour: u32) -> u32 {
    match period {
        "下午" if hour < 12 => hour + 12,
        "晚上" => (hour + 18).min(23),
        _ => hour,
    }
}

fn capture_number<T: std::str::FromStr>(caps: &Captures<'_>, index: usize) -> Option<T> {
    caps.get(index).and_then(|m| m.as_str().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::{apply_period, extract_time, resolve_time_of_day};
    use chrono::{NaiveDate, NaiveTime};

    fn now() -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap()
    }

    #[test]
    fn evening_hour_is_clamped() {
        assert_eq!(apply_period("晚上", 8), 23);
        assert_eq!(apply_period("晚上", 2), 20);
        assert_eq!(apply_period("下午", 12), 12);
    }

    #[test]
    fn invalid_clock_falls_through_to_later_patterns() {
        assert_eq!(
            resolve_time_of_day("25:00 然后上午10点"),
            NaiveTime::from_hms_opt(10, 0, 0)
        );
    }

    #[test]
    fn time_without_date_yields_nothing() {
        let extraction = extract_time("下午3点开会", now());
        assert_eq!(extraction.due_date, None);
        assert_eq!(extraction.reminder_time, None);
    }

    #[test]
    fn invalid_calendar_date_is_skipped() {
        let extraction = extract_time("2月30日 或者 3/5", now());
        assert_eq!(extraction.due_date, NaiveDate::from_ymd_opt(2024, 3, 5));
    }
}
