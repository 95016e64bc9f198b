//! Schedule aggregate: creation, pattern replacement, series edits and
//! exception bookkeeping.

use cadence_engine::{
    ErrorKind, ExceptionKind, Frequency, PatternFields, RecurrencePattern, Schedule,
    ScheduleError, ScheduleRecord, ScheduleSpan, SeriesEdit, Weekdays,
};
use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use uuid::Uuid;

fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .and_then(|date| date.and_hms_opt(h, min, 0))
        .expect("valid test datetime")
}

fn span(start: NaiveDateTime, end: NaiveDateTime) -> ScheduleSpan {
    ScheduleSpan::new(start, end).expect("valid span")
}

/// Daily standup, 09:00-09:30, starting 2025-01-01.
fn standup(pattern: RecurrencePattern, end: Option<NaiveDateTime>) -> Schedule {
    Schedule::create(
        Uuid::new_v4(),
        "Standup",
        Some("Daily sync".to_string()),
        span(at(2025, 1, 1, 9, 0), at(2025, 1, 1, 9, 30)),
        false,
        Some("Europe/Berlin".to_string()),
        pattern,
        end,
    )
    .expect("valid schedule")
}

fn daily() -> RecurrencePattern {
    RecurrencePattern::daily(1).expect("valid daily pattern")
}

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

#[test]
fn create_populates_every_field() {
    let calendar_id = Uuid::new_v4();
    let schedule = Schedule::create(
        calendar_id,
        "Standup",
        None,
        span(at(2025, 1, 1, 9, 0), at(2025, 1, 1, 9, 30)),
        false,
        Some("Europe/Berlin".to_string()),
        daily(),
        None,
    )
    .expect("valid schedule");

    assert_ne!(schedule.id(), Uuid::nil());
    assert_eq!(schedule.calendar_id(), calendar_id);
    assert_eq!(schedule.title(), "Standup");
    assert_eq!(schedule.description(), None);
    assert_eq!(schedule.start_date(), at(2025, 1, 1, 9, 0));
    assert_eq!(schedule.end_date(), at(2025, 1, 1, 9, 30));
    assert_eq!(schedule.duration(), TimeDelta::minutes(30));
    assert_eq!(schedule.time_zone(), Some("Europe/Berlin"));
    assert_eq!(schedule.recurrence_pattern(), &daily());
    assert_eq!(schedule.recurrence_end_date(), None);
    assert!(schedule.exceptions().is_empty());
}

#[test]
fn create_assigns_fresh_ids() {
    let a = standup(daily(), None);
    let b = standup(daily(), None);
    assert_ne!(a.id(), b.id());
}

#[test]
fn create_rejects_blank_title() {
    for title in ["", "   "] {
        let err = Schedule::create(
            Uuid::new_v4(),
            title,
            None,
            span(at(2025, 1, 1, 9, 0), at(2025, 1, 1, 10, 0)),
            false,
            None,
            daily(),
            None,
        )
        .expect_err("blank title");
        assert_eq!(err, ScheduleError::EmptyTitle);
        assert_eq!(err.kind(), ErrorKind::Validation);
    }
}

#[test]
fn span_rejects_end_before_start() {
    assert_eq!(
        ScheduleSpan::new(at(2025, 1, 1, 10, 0), at(2025, 1, 1, 9, 0)),
        Err(ScheduleError::InvalidSpan)
    );
    let zero = span(at(2025, 1, 1, 9, 0), at(2025, 1, 1, 9, 0));
    assert_eq!(zero.duration(), TimeDelta::zero());
}

#[test]
fn create_with_explicit_end_date() {
    let end = at(2025, 3, 31, 9, 0);
    let schedule = standup(daily(), Some(end));
    assert_eq!(schedule.recurrence_end_date(), Some(end));
}

#[test]
fn create_rejects_end_date_before_start() {
    let err = Schedule::create(
        Uuid::new_v4(),
        "Standup",
        None,
        span(at(2025, 1, 1, 9, 0), at(2025, 1, 1, 9, 30)),
        false,
        None,
        daily(),
        Some(at(2024, 12, 31, 9, 0)),
    )
    .expect_err("end before start");
    assert_eq!(err, ScheduleError::EndBeforeStart(at(2024, 12, 31, 9, 0)));
}

// ---------------------------------------------------------------------------
// Occurrence count back-solving
// ---------------------------------------------------------------------------

#[test]
fn daily_count_resolves_end_date() {
    let pattern = RecurrencePattern::create(Frequency::Daily, 1, None, None, None, Some(10))
        .expect("valid pattern");
    let schedule = standup(pattern, None);
    assert_eq!(schedule.recurrence_end_date(), Some(at(2025, 1, 10, 9, 0)));
}

#[test]
fn count_of_one_ends_on_the_start() {
    let pattern = RecurrencePattern::create(Frequency::Daily, 1, None, None, None, Some(1))
        .expect("valid pattern");
    let schedule = standup(pattern, None);
    assert_eq!(schedule.recurrence_end_date(), Some(schedule.start_date()));
}

#[test]
fn weekly_count_counts_from_first_flagged_day() {
    // Starts Thursday 2024-08-01; Mon|Fri series runs Fri 2, Mon 5, Fri 9, Mon 12.
    let mut schedule = Schedule::create(
        Uuid::new_v4(),
        "Gym",
        None,
        span(at(2024, 8, 1, 9, 30), at(2024, 8, 1, 10, 30)),
        false,
        None,
        RecurrencePattern::weekly(1, Weekdays::MONDAY | Weekdays::FRIDAY).expect("valid"),
        None,
    )
    .expect("valid schedule");

    schedule
        .set_recurrence_pattern(
            Frequency::Weekly,
            1,
            Some(Weekdays::MONDAY | Weekdays::FRIDAY),
            None,
            None,
            Some(4),
            None,
        )
        .expect("valid pattern");
    assert_eq!(schedule.recurrence_end_date(), Some(at(2024, 8, 12, 9, 30)));
}

#[test]
fn count_and_end_date_are_mutually_exclusive() {
    let mut schedule = standup(daily(), None);
    let err = schedule
        .set_recurrence_pattern(
            Frequency::Daily,
            1,
            None,
            None,
            None,
            Some(3),
            Some(at(2025, 2, 1, 9, 0)),
        )
        .expect_err("both given");
    assert_eq!(err, ScheduleError::CountAndEndDate);
}

#[test]
fn zero_count_is_rejected() {
    let mut schedule = standup(daily(), None);
    assert_eq!(
        schedule.set_recurrence_pattern(Frequency::Daily, 1, None, None, None, Some(0), None),
        Err(ScheduleError::InvalidOccurrenceCount)
    );
}

#[test]
fn non_repeating_count_ends_on_the_start() {
    let mut schedule = standup(daily(), None);
    schedule
        .set_recurrence_pattern(Frequency::None, 1, None, None, None, Some(3), None)
        .expect("non-repeating is accepted");
    assert_eq!(schedule.recurrence_pattern().frequency(), Frequency::None);
    assert_eq!(schedule.recurrence_end_date(), Some(schedule.start_date()));
}

#[test]
fn failed_pattern_change_leaves_schedule_untouched() {
    let end = at(2025, 6, 30, 9, 0);
    let mut schedule = standup(daily(), Some(end));
    let before = schedule.clone();

    let err = schedule
        .set_recurrence_pattern(Frequency::Weekly, 1, None, None, None, None, None)
        .expect_err("weekly without days");
    assert!(matches!(err, ScheduleError::InvalidPattern(_)));
    assert_eq!(schedule, before);
}

#[test]
fn replacing_pattern_without_end_clears_it() {
    let mut schedule = standup(daily(), Some(at(2025, 6, 30, 9, 0)));
    schedule
        .set_recurrence_pattern(Frequency::Monthly, 1, None, Some(1), None, None, None)
        .expect("valid monthly");
    assert_eq!(schedule.recurrence_end_date(), None);
    assert_eq!(schedule.recurrence_pattern().day_of_month(), Some(1));
}

// ---------------------------------------------------------------------------
// Series and detail edits
// ---------------------------------------------------------------------------

#[test]
fn update_series_moves_span_and_keeps_pattern() {
    let mut schedule = standup(daily(), None);
    schedule
        .update_series(
            span(at(2025, 2, 1, 10, 0), at(2025, 2, 1, 11, 0)),
            false,
            Some("UTC".to_string()),
        )
        .expect("valid update");

    assert_eq!(schedule.start_date(), at(2025, 2, 1, 10, 0));
    assert_eq!(schedule.end_date(), at(2025, 2, 1, 11, 0));
    assert_eq!(schedule.time_zone(), Some("UTC"));
    assert_eq!(schedule.recurrence_pattern(), &daily());
}

#[test]
fn update_series_requires_start_before_end() {
    let mut schedule = standup(daily(), None);
    let same = span(at(2025, 2, 1, 10, 0), at(2025, 2, 1, 10, 0));
    assert_eq!(
        schedule.update_series(same, false, None),
        Err(ScheduleError::InvalidSpan)
    );
    assert_eq!(schedule.start_date(), at(2025, 1, 1, 9, 0));
}

#[test]
fn all_day_series_is_normalized_to_midnight() {
    let mut schedule = standup(daily(), None);
    schedule
        .update_series(span(at(2025, 2, 1, 10, 15), at(2025, 2, 3, 8, 45)), true, None)
        .expect("valid update");

    assert!(schedule.is_all_day());
    assert_eq!(schedule.start_date(), at(2025, 2, 1, 0, 0));
    assert_eq!(schedule.end_date(), at(2025, 2, 3, 0, 0));
    assert_eq!(schedule.time_zone(), None);
}

#[test]
fn update_details_replaces_title_and_description() {
    let mut schedule = standup(daily(), None);
    schedule
        .update_details("Retro", None)
        .expect("valid details");
    assert_eq!(schedule.title(), "Retro");
    assert_eq!(schedule.description(), None);

    assert_eq!(schedule.update_details(" ", None), Err(ScheduleError::EmptyTitle));
    assert_eq!(schedule.title(), "Retro");
}

fn edit(pattern: PatternFields) -> SeriesEdit {
    SeriesEdit {
        span: span(at(2025, 3, 3, 14, 0), at(2025, 3, 3, 15, 0)),
        is_all_day: false,
        time_zone: None,
        title: "Planning".to_string(),
        description: None,
        pattern,
        recurrence_end_date: None,
    }
}

#[test]
fn edit_series_applies_everything() {
    let mut schedule = standup(daily(), None);
    let weekly = RecurrencePattern::weekly(2, Weekdays::MONDAY).expect("valid weekly");

    schedule.edit_series(edit(weekly.fields())).expect("valid edit");

    assert_eq!(schedule.title(), "Planning");
    assert_eq!(schedule.start_date(), at(2025, 3, 3, 14, 0));
    assert_eq!(schedule.recurrence_pattern(), &weekly);
}

#[test]
fn edit_series_is_all_or_nothing() {
    let mut schedule = standup(daily(), None);
    let before = schedule.clone();

    let bad_pattern = PatternFields {
        frequency: Frequency::Monthly,
        interval: 1,
        day_of_week: None,
        day_of_month: None,
        month: None,
        occurrence_count: None,
    };
    let err = schedule.edit_series(edit(bad_pattern)).expect_err("monthly without a day");
    assert!(matches!(err, ScheduleError::InvalidPattern(_)));
    assert_eq!(schedule, before);
}

#[test]
fn edit_series_to_non_repeating_ignores_interval() {
    let mut schedule = standup(daily(), None);
    let once = PatternFields {
        frequency: Frequency::None,
        interval: 0,
        day_of_week: None,
        day_of_month: None,
        month: None,
        occurrence_count: None,
    };
    schedule.edit_series(edit(once)).expect("non-repeating edit");
    assert_eq!(schedule.recurrence_pattern(), &RecurrencePattern::once());
}

// ---------------------------------------------------------------------------
// Exceptions
// ---------------------------------------------------------------------------

#[test]
fn exceptions_are_recorded_in_order() {
    let mut schedule = standup(daily(), None);
    let moved = Uuid::new_v4();
    let materialized = Uuid::new_v4();

    schedule.skip(at(2025, 1, 3, 9, 0)).expect("skip");
    schedule.reschedule(at(2025, 1, 2, 9, 0), moved).expect("reschedule");
    schedule
        .set_series_event(at(2025, 1, 4, 9, 0), materialized)
        .expect("materialize");

    let kinds: Vec<_> = schedule.exceptions().iter().map(|e| e.kind()).collect();
    assert_eq!(
        kinds,
        vec![
            ExceptionKind::Skipped,
            ExceptionKind::Rescheduled { event_id: moved },
            ExceptionKind::Materialized { event_id: materialized },
        ]
    );
    assert!(schedule.exceptions().iter().all(|e| e.schedule_id() == schedule.id()));
    assert_eq!(schedule.exceptions()[1].original_date(), at(2025, 1, 2, 9, 0));
    assert_eq!(schedule.exceptions()[1].event_id(), Some(moved));
}

#[test]
fn exception_before_start_is_rejected() {
    let mut schedule = standup(daily(), None);
    let early = at(2024, 12, 31, 9, 0);

    assert_eq!(schedule.skip(early), Err(ScheduleError::OccurrenceBeforeStart(early)));
    assert_eq!(
        schedule.reschedule(early, Uuid::new_v4()),
        Err(ScheduleError::OccurrenceBeforeStart(early))
    );
    assert_eq!(
        schedule.set_series_event(early, Uuid::new_v4()),
        Err(ScheduleError::OccurrenceBeforeStart(early))
    );
    assert!(schedule.exceptions().is_empty());
}

#[test]
fn exception_on_start_is_allowed() {
    let mut schedule = standup(daily(), None);
    schedule.skip(schedule.start_date()).expect("start date is an occurrence");
    assert_eq!(schedule.exceptions().len(), 1);
}

#[test]
fn second_exception_for_same_date_is_rejected() {
    let mut schedule = standup(daily(), None);
    let date = at(2025, 1, 2, 9, 0);
    schedule.skip(date).expect("first exception");

    assert_eq!(
        schedule.set_series_event(date, Uuid::new_v4()),
        Err(ScheduleError::DuplicateException(date))
    );
    assert_eq!(schedule.exceptions().len(), 1);
}

// ---------------------------------------------------------------------------
// Storage record
// ---------------------------------------------------------------------------

#[test]
fn json_round_trip_preserves_schedule() {
    let mut schedule = standup(daily(), Some(at(2025, 12, 31, 9, 0)));
    schedule.skip(at(2025, 1, 2, 9, 0)).expect("skip");
    schedule
        .reschedule(at(2025, 1, 3, 9, 0), Uuid::new_v4())
        .expect("reschedule");

    let json = serde_json::to_string(&schedule).expect("serialize");
    let back: Schedule = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(back, schedule);
}

#[test]
fn record_conversion_validates() {
    let schedule = standup(daily(), None);

    let mut record: ScheduleRecord = schedule.to_record();
    assert_eq!(Schedule::try_from(record.clone()), Ok(schedule.clone()));

    record.title = String::new();
    assert_eq!(Schedule::try_from(record.clone()), Err(ScheduleError::EmptyTitle));

    record.title = "Standup".to_string();
    record.end_date = at(2024, 12, 31, 9, 0);
    assert_eq!(Schedule::try_from(record.clone()), Err(ScheduleError::InvalidSpan));

    record.end_date = record.start_date;
    record.recurrence_end_date = Some(at(2024, 6, 1, 0, 0));
    assert_eq!(
        Schedule::try_from(record),
        Err(ScheduleError::EndBeforeStart(at(2024, 6, 1, 0, 0)))
    );
}

#[test]
fn record_with_invalid_pattern_fails_to_deserialize() {
    let schedule = standup(daily(), None);
    let mut json = serde_json::to_value(&schedule).expect("serialize");
    json["recurrence_pattern"] = serde_json::json!({"frequency": "weekly", "interval": 1});

    assert!(serde_json::from_value::<Schedule>(json).is_err());
}
