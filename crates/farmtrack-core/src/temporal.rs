//! Date normalization shared by every derived view.
//!
//! Persisted records carry dates as ISO strings, epoch milliseconds or
//! native instants. [`normalize`] is the single place that turns any of
//! those into a [`Normalized`] verdict; nothing else parses dates.

use serde::{Serialize, Serializer};
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime, Time, UtcOffset};

/// Instants outside this year range are rejected so offset conversion stays in bounds.
const MAX_INSTANT_YEAR: i32 = 9998;

/// A date field as it arrived from storage.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DateValue {
    /// No value (null, missing).
    #[default]
    Absent,
    /// Textual representation, expected to be ISO 8601.
    Text(String),
    /// Native instant.
    Instant(OffsetDateTime),
    /// Milliseconds since the Unix epoch.
    EpochMillis(i64),
}

impl DateValue {
    /// Convenience constructor for textual dates.
    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Store a calendar date as `YYYY-MM-DD` text.
    #[must_use]
    pub fn from_date(date: Date) -> Self {
        Self::Text(format_iso_date(date))
    }

    /// True when there is nothing to parse.
    #[must_use]
    pub fn is_absent(&self) -> bool {
        match self {
            Self::Absent => true,
            Self::Text(text) => text.trim().is_empty(),
            Self::Instant(_) | Self::EpochMillis(_) => false,
        }
    }
}

impl From<OffsetDateTime> for DateValue {
    fn from(value: OffsetDateTime) -> Self {
        Self::Instant(value)
    }
}

impl Serialize for DateValue {
    fn serialize<S>(&self, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Absent => s.serialize_none(),
            Self::Text(text) => s.serialize_str(text),
            Self::Instant(instant) => {
                let text = instant.format(&Rfc3339).map_err(serde::ser::Error::custom)?;
                s.serialize_str(&text)
            }
            Self::EpochMillis(millis) => s.serialize_i64(*millis),
        }
    }
}

/// A successfully parsed point on the calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Moment {
    /// Calendar date without time of day (`YYYY-MM-DD`).
    Date(Date),
    /// Wall-clock date and time without an offset.
    Floating(PrimitiveDateTime),
    /// Unambiguous instant.
    Instant(OffsetDateTime),
}

impl Moment {
    /// Calendar date as seen by an observer at `offset`.
    ///
    /// Wall-clock values keep their own date; instants are shifted first.
    #[must_use]
    pub fn calendar_date(self, offset: UtcOffset) -> Date {
        match self {
            Self::Date(date) => date,
            Self::Floating(dt) => dt.date(),
            Self::Instant(instant) => instant.to_offset(offset).date(),
        }
    }

    /// Calendar date in the value's own frame of reference.
    #[must_use]
    pub fn own_date(self) -> Date {
        match self {
            Self::Date(date) => date,
            Self::Floating(dt) => dt.date(),
            Self::Instant(instant) => instant.date(),
        }
    }

    /// The moment as an instant; wall-clock values are read as UTC.
    #[must_use]
    pub fn instant(self) -> OffsetDateTime {
        match self {
            Self::Date(date) => PrimitiveDateTime::new(date, Time::MIDNIGHT).assume_utc(),
            Self::Floating(dt) => dt.assume_utc(),
            Self::Instant(instant) => instant,
        }
    }
}

/// Verdict of [`normalize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Normalized {
    moment: Option<Moment>,
}

impl Normalized {
    /// Verdict for a value that could not be interpreted.
    pub const INVALID: Self = Self { moment: None };

    /// True when the value represents a real point in time.
    #[must_use]
    pub const fn valid(&self) -> bool {
        self.moment.is_some()
    }

    /// Parsed moment, if valid.
    #[must_use]
    pub const fn moment(&self) -> Option<Moment> {
        self.moment
    }

    /// Canonical instant, if valid.
    #[must_use]
    pub fn instant(&self) -> Option<OffsetDateTime> {
        self.moment.map(Moment::instant)
    }

    /// Calendar date as seen from `offset`, if valid.
    #[must_use]
    pub fn calendar_date(&self, offset: UtcOffset) -> Option<Date> {
        self.moment.map(|moment| moment.calendar_date(offset))
    }

    /// `YYYY-MM-DD` in the value's own frame of reference, if valid.
    #[must_use]
    pub fn iso_date(&self) -> Option<String> {
        self.moment.map(|moment| format_iso_date(moment.own_date()))
    }
}

/// Interpret a stored date value.
///
/// Accepted text forms: `YYYY-MM-DD`, RFC 3339 datetimes, and offset-less
/// `YYYY-MM-DDTHH:MM[:SS[.fff]]`. Anything else, including impossible
/// calendar dates such as `2024-02-30`, yields [`Normalized::INVALID`].
#[must_use]
pub fn normalize(value: &DateValue) -> Normalized {
    let moment = match value {
        DateValue::Absent => None,
        DateValue::Text(text) => parse_text(text.trim()),
        DateValue::Instant(instant) => in_range(*instant).map(Moment::Instant),
        DateValue::EpochMillis(millis) => {
            OffsetDateTime::from_unix_timestamp_nanos(i128::from(*millis) * 1_000_000)
                .ok()
                .and_then(in_range)
                .map(Moment::Instant)
        }
    };
    Normalized { moment }
}

fn parse_text(text: &str) -> Option<Moment> {
    if text.is_empty() {
        return None;
    }
    if let Ok(date) = Date::parse(text, format_description!("[year]-[month]-[day]")) {
        return Some(Moment::Date(date));
    }
    if let Ok(instant) = OffsetDateTime::parse(text, &Rfc3339) {
        return in_range(instant).map(Moment::Instant);
    }
    let floating = PrimitiveDateTime::parse(
        text,
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second][optional [.[subsecond]]]"),
    )
    .or_else(|_| {
        PrimitiveDateTime::parse(text, format_description!("[year]-[month]-[day]T[hour]:[minute]"))
    });
    floating.ok().map(Moment::Floating)
}

fn in_range(instant: OffsetDateTime) -> Option<OffsetDateTime> {
    (instant.year().abs() <= MAX_INSTANT_YEAR).then_some(instant)
}

/// Render a date as `YYYY-MM-DD`.
#[must_use]
pub fn format_iso_date(date: Date) -> String {
    format!(
        "{:04}-{:02}-{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}
