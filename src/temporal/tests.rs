//! Tests for temporal module

use super::*;
use chrono::{NaiveDate, Timelike};
use test_case::test_case;

// ============================================================================
// Shape Masking Tests
// ============================================================================

#[test]
fn test_shape_of_masks_digits_only() {
    assert_eq!(shape_of("2024-03-05 10:20:30"), "xxxx-xx-xx xx:xx:xx");
    assert_eq!(shape_of("2024-03-05"), "xxxx-xx-xx");
    assert_eq!(shape_of("not-a-date"), "not-a-date");
    assert_eq!(shape_of(""), "");
}

// ============================================================================
// Known Layout Tests
// ============================================================================

#[test_case("2024-03-05 10:20:30", (2024, 3, 5), (10, 20, 30) ; "datetime with seconds")]
#[test_case("2024-03-05", (2024, 3, 5), (0, 0, 0) ; "date only")]
#[test_case("2024-03-05 10:20:30 +0200", (2024, 3, 5), (10, 20, 30) ; "positive offset")]
#[test_case("2024-03-05 10:20:30 -0500", (2024, 3, 5), (10, 20, 30) ; "negative offset")]
#[test_case("2024-03-05T10:20:30", (2024, 3, 5), (10, 20, 30) ; "iso naive")]
#[test_case("2024-03-05T10:20:30+01:00", (2024, 3, 5), (10, 20, 30) ; "iso with offset")]
fn test_parse_known_layouts(input: &str, date: (i32, u32, u32), time: (u32, u32, u32)) {
    let ts = parse_timestamp(input).unwrap();
    assert_eq!(
        ts.date(),
        NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap()
    );
    let local = ts.naive_local();
    assert_eq!((local.hour(), local.minute(), local.second()), time);
}

#[test]
fn test_parse_keeps_offset() {
    let ts = parse_timestamp("2024-03-05 23:30:00 +0200").unwrap();
    assert_eq!(ts.inner().offset().local_minus_utc(), 2 * 3600);
    // Same instant as 21:30 UTC
    assert_eq!(ts.inner().naive_utc().hour(), 21);
}

#[test]
fn test_parse_strips_surrounding_quotes() {
    let ts = parse_timestamp("\"2024-03-05\"").unwrap();
    assert_eq!(ts.date(), NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());
}

// ============================================================================
// Failure Tests
// ============================================================================

#[test_case("not-a-date" ; "words")]
#[test_case("" ; "empty")]
#[test_case("05/03/2024" ; "slash layout")]
#[test_case("2024-03-05 10:20" ; "missing seconds")]
fn test_parse_unrecognized_shape(input: &str) {
    let err = parse_timestamp(input).unwrap_err();
    assert!(matches!(err, TimestampError::Unrecognized { .. }), "{err:?}");
}

#[test]
fn test_parse_invalid_calendar_value() {
    let err = parse_timestamp("2024-13-45").unwrap_err();
    assert!(matches!(err, TimestampError::Invalid { .. }));

    let err = parse_timestamp("2024-02-30 10:00:00").unwrap_err();
    assert!(matches!(err, TimestampError::Invalid { .. }));
}

#[test]
fn test_unrecognized_error_reports_shape() {
    let err = parse_timestamp("12.01.2024").unwrap_err();
    assert_eq!(
        err.to_string(),
        "unrecognized date layout 'xx.xx.xxxx' for input '12.01.2024'"
    );
}

// ============================================================================
// Serialization Tests
// ============================================================================

#[test]
fn test_display_uses_canonical_layout() {
    assert_eq!(
        parse_timestamp("2024-03-05").unwrap().to_string(),
        "2024-03-05 00:00:00"
    );
    assert_eq!(
        parse_timestamp("2024-03-05 10:20:30 +0200")
            .unwrap()
            .to_string(),
        "2024-03-05 10:20:30"
    );
}

#[test]
fn test_serde_uses_canonical_layout() {
    let ts: Timestamp = "2024-03-05T08:09:10".parse().unwrap();
    let json = serde_json::to_string(&ts).unwrap();
    assert_eq!(json, "\"2024-03-05 08:09:10\"");

    let back: Timestamp = serde_json::from_str("\"2024-03-05\"").unwrap();
    assert_eq!(back.to_string(), "2024-03-05 00:00:00");

    assert!(serde_json::from_str::<Timestamp>("\"yesterday\"").is_err());
}

#[test]
fn test_from_date_is_midnight_utc() {
    let day = NaiveDate::from_ymd_opt(2023, 12, 31).unwrap();
    let ts = Timestamp::from_date(day);
    assert_eq!(ts.date(), day);
    assert_eq!(ts.inner().offset().local_minus_utc(), 0);
}
