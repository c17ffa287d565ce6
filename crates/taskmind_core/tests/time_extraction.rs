use chrono::{NaiveDate, NaiveDateTime};
use taskmind_core::extract_time;

fn now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(8, 0, 0)
        .unwrap()
}

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

fn at(day: NaiveDate, hour: u32, minute: u32) -> Option<NaiveDateTime> {
    Some(day.and_hms_opt(hour, minute, 0).unwrap())
}

#[test]
fn relative_words_use_fixed_offsets() {
    let cases = [
        ("今天把周报写完", date(2024, 1, 1)),
        ("明日复盘", date(2024, 1, 2)),
        ("后天去体检", date(2024, 1, 3)),
        ("下周交方案", date(2024, 1, 8)),
        ("下个月续费", date(2024, 1, 31)),
        ("10天后回访客户", date(2024, 1, 11)),
    ];
    for (text, expected) in cases {
        assert_eq!(extract_time(text, now()).due_date, Some(expected), "input: {text}");
    }
}

#[test]
fn absolute_dates_are_recognised() {
    let iso = extract_time("2024-03-15 14:30 架构评审", now());
    assert_eq!(iso.due_date, Some(date(2024, 3, 15)));
    assert_eq!(iso.reminder_time, at(date(2024, 3, 15), 14, 30));

    let month_day = extract_time("5月1日下午3点出发", now());
    assert_eq!(month_day.due_date, Some(date(2024, 5, 1)));
    assert_eq!(month_day.reminder_time, at(date(2024, 5, 1), 15, 0));

    let slash = extract_time("12/25 圣诞聚会", now());
    assert_eq!(slash.due_date, Some(date(2024, 12, 25)));
    assert_eq!(slash.reminder_time, None);
}

#[test]
fn relative_word_beats_absolute_date() {
    let extraction = extract_time("明天或者2024-05-01都行", now());
    assert_eq!(extraction.due_date, Some(date(2024, 1, 2)));
}

#[test]
fn invalid_calendar_dates_are_skipped() {
    let extraction = extract_time("2月30日提交", now());
    assert_eq!(extraction.due_date, None);
}

#[test]
fn time_of_day_periods_are_applied() {
    let tomorrow = date(2024, 1, 2);
    let cases = [
        ("明天上午9点", at(tomorrow, 9, 0)),
        ("明天下午3点30分", at(tomorrow, 15, 30)),
        ("明天下午12点", at(tomorrow, 12, 0)),
        ("明天晚上8点", at(tomorrow, 23, 0)),
        ("明天8点", at(tomorrow, 8, 0)),
        ("明天 18:45", at(tomorrow, 18, 45)),
    ];
    for (text, expected) in cases {
        assert_eq!(extract_time(text, now()).reminder_time, expected, "input: {text}");
    }
}

#[test]
fn time_without_date_sets_nothing() {
    let extraction = extract_time("下午3点开会", now());
    assert_eq!(extraction.due_date, None);
    assert_eq!(extraction.reminder_time, None);
}

#[test]
fn days_until_due_counts_from_today() {
    let extraction = extract_time("后天提交", now());
    assert_eq!(extraction.days_until_due(now().date()), Some(2));
    assert_eq!(extract_time("随时", now()).days_until_due(now().date()), None);
}
