//! Shape-driven timestamp parser and the canonical timestamp type

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;
use thiserror::Error;

/// Output layout for every timestamp, regardless of the layout it was parsed from
pub const CANONICAL_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

static DIGIT_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new("[0-9]").unwrap());

/// How the matched text is turned into a timestamp
#[derive(Debug, Clone, Copy)]
enum LayoutKind {
    /// Wall-clock time, interpreted as UTC
    Naive,
    /// Calendar date at midnight UTC
    DateOnly,
    /// Wall-clock time with an explicit offset
    Zoned,
}

#[derive(Debug)]
struct Layout {
    shape: &'static str,
    format: &'static str,
    kind: LayoutKind,
}

/// Known layouts, in the order they are tried
static LAYOUTS: &[Layout] = &[
    Layout {
        shape: "xxxx-xx-xx xx:xx:xx",
        format: CANONICAL_FORMAT,
        kind: LayoutKind::Naive,
    },
    Layout {
        shape: "xxxx-xx-xx",
        format: "%Y-%m-%d",
        kind: LayoutKind::DateOnly,
    },
    Layout {
        shape: "xxxx-xx-xx xx:xx:xx +xxxx",
        format: "%Y-%m-%d %H:%M:%S %z",
        kind: LayoutKind::Zoned,
    },
    Layout {
        shape: "xxxx-xx-xx xx:xx:xx -xxxx",
        format: "%Y-%m-%d %H:%M:%S %z",
        kind: LayoutKind::Zoned,
    },
    Layout {
        shape: "xxxx-xx-xxTxx:xx:xx",
        format: "%Y-%m-%dT%H:%M:%S",
        kind: LayoutKind::Naive,
    },
    Layout {
        shape: "xxxx-xx-xxTxx:xx:xx+xx:xx",
        format: "%Y-%m-%dT%H:%M:%S%:z",
        kind: LayoutKind::Zoned,
    },
    Layout {
        shape: "xxxx-xx-xxTxx:xx:xx-xx:xx",
        format: "%Y-%m-%dT%H:%M:%S%:z",
        kind: LayoutKind::Zoned,
    },
];

/// Why a string could not be turned into a [`Timestamp`]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimestampError {
    /// The digit-masked shape matches no known layout
    #[error("unrecognized date layout '{shape}' for input '{input}'")]
    Unrecognized { input: String, shape: String },

    /// The shape is known but the value is not a real date/time (e.g. month 13)
    #[error("invalid date '{input}': {message}")]
    Invalid { input: String, message: String },
}

/// Canonical timestamp decoded from the API or the relational mirror
///
/// Keeps the offset it was parsed with; layouts without an offset are UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Timestamp(DateTime<FixedOffset>);

impl Timestamp {
    /// Wrap an offset-aware datetime
    pub fn new(inner: DateTime<FixedOffset>) -> Self {
        Self(inner)
    }

    /// Interpret a wall-clock time as UTC
    pub fn from_naive_utc(naive: NaiveDateTime) -> Self {
        Self(Utc.from_utc_datetime(&naive).fixed_offset())
    }

    /// Midnight UTC of a calendar date
    pub fn from_date(date: NaiveDate) -> Self {
        Self::from_naive_utc(date.and_time(NaiveTime::MIN))
    }

    /// The underlying datetime
    pub fn inner(&self) -> DateTime<FixedOffset> {
        self.0
    }

    /// Calendar day in the timestamp's own offset (truncated to the day)
    pub fn date(&self) -> NaiveDate {
        self.0.date_naive()
    }

    /// Wall-clock time in the timestamp's own offset
    pub fn naive_local(&self) -> NaiveDateTime {
        self.0.naive_local()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(CANONICAL_FORMAT))
    }
}

impl FromStr for Timestamp {
    type Err = TimestampError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_timestamp(s)
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_timestamp(&raw).map_err(serde::de::Error::custom)
    }
}

/// Mask every ASCII digit with `x`
pub fn shape_of(input: &str) -> String {
    DIGIT_REGEX.replace_all(input, "x").into_owned()
}

/// Parse a timestamp in any of the known layouts
///
/// Surrounding double quotes are stripped first, as the API sometimes
/// double-encodes date strings.
pub fn parse_timestamp(input: &str) -> Result<Timestamp, TimestampError> {
    let text = input.trim_matches('"');
    let shape = shape_of(text);

    let layout = LAYOUTS
        .iter()
        .find(|layout| layout.shape == shape)
        .ok_or_else(|| TimestampError::Unrecognized {
            input: text.to_string(),
            shape: shape.clone(),
        })?;

    let invalid = |e: chrono::ParseError| TimestampError::Invalid {
        input: text.to_string(),
        message: e.to_string(),
    };

    match layout.kind {
        LayoutKind::Naive => NaiveDateTime::parse_from_str(text, layout.format)
            .map(Timestamp::from_naive_utc)
            .map_err(invalid),
        LayoutKind::DateOnly => NaiveDate::parse_from_str(text, layout.format)
            .map(Timestamp::from_date)
            .map_err(invalid),
        LayoutKind::Zoned => DateTime::parse_from_str(text, layout.format)
            .map(Timestamp::new)
            .map_err(invalid),
    }
}
