//! caltimer — calendar-based schedule expressions.
//!
//! Seven-field timer schedules (second, minute, hour, day-of-month,
//! month, day-of-week, year) with relative day-of-month forms such as
//! `last fri` and `-3`, an optional start/end window, and an inclusive
//! next-fire-time search.
//!
//! # Examples
//!
//! ```
//! use caltimer::ScheduleExpression;
//!
//! let expr = ScheduleExpression::builder()
//!     .hour("9")
//!     .day_of_month("last fri")
//!     .build()
//!     .unwrap();
//!
//! let from: jiff::Zoned = "2050-07-01T00:00:00[UTC]".parse().unwrap();
//! let next = expr.next_from(&from).unwrap();
//! assert_eq!(next.to_string(), "2050-07-29T09:00:00+00:00[UTC]");
//! ```

pub mod ast;
pub mod display;
pub mod error;
pub mod eval;
pub mod parser;

pub use ast::{
    FieldKind, FieldUnit, FieldValue, ListEntry, RelativeDay, ScheduleBuilder, ScheduleExpression,
};
pub use error::ParseError;
pub use eval::{BoundedFireTimes, Ceiling, FireTimes, MonthContext};
pub use parser::{parse_field, validate};

use jiff::civil::DateTime;
use jiff::Zoned;
#[cfg(feature = "serde")]
use serde::{Deserialize, Deserializer, Serialize, Serializer};

// --- ScheduleExpression convenience methods ---

impl ScheduleExpression {
    /// Compute the next fire time at or after `reference`.
    ///
    /// `None` means the schedule never fires again: the expression is
    /// unsatisfiable, its window has closed, or its years ran out.
    pub fn next_from(&self, reference: &Zoned) -> Option<Zoned> {
        eval::next_from(self, reference)
    }

    /// Compute the next matching civil datetime, ignoring the window
    /// and timezone attributes.
    pub fn next_civil_from(&self, reference: DateTime) -> Option<DateTime> {
        eval::next_civil(self, reference)
    }

    /// Check whether `at`, truncated to the second, is exactly a fire
    /// time.
    pub fn matches(&self, at: &Zoned) -> bool {
        eval::matches(self, at)
    }

    /// Iterate over fire times starting at or after `from`.
    pub fn fire_times(&self, from: &Zoned) -> FireTimes<'_> {
        FireTimes::new(self, from.clone())
    }

    /// Iterate over fire times within the inclusive `[from, to]` window.
    pub fn between(&self, from: &Zoned, to: &Zoned) -> BoundedFireTimes<'_> {
        BoundedFireTimes::new(self, from.clone(), to.clone())
    }
}

#[cfg(feature = "serde")]
impl Serialize for ScheduleExpression {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("second", &self.second.canonical(FieldKind::Second))?;
        map.serialize_entry("minute", &self.minute.canonical(FieldKind::Minute))?;
        map.serialize_entry("hour", &self.hour.canonical(FieldKind::Hour))?;
        map.serialize_entry(
            "dayOfMonth",
            &self.day_of_month.canonical(FieldKind::DayOfMonth),
        )?;
        map.serialize_entry("month", &self.month.canonical(FieldKind::Month))?;
        map.serialize_entry(
            "dayOfWeek",
            &self.day_of_week.canonical(FieldKind::DayOfWeek),
        )?;
        map.serialize_entry("year", &self.year.canonical(FieldKind::Year))?;
        if let Some(start) = &self.start {
            map.serialize_entry("start", &start.to_string())?;
        }
        if let Some(end) = &self.end {
            map.serialize_entry("end", &end.to_string())?;
        }
        if let Some(name) = self.timezone.as_ref().and_then(|tz| tz.iana_name()) {
            map.serialize_entry("timezone", name)?;
        }
        map.end()
    }
}

#[cfg(feature = "serde")]
impl<'de> Deserialize<'de> for ScheduleExpression {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct Raw {
            second: Option<String>,
            minute: Option<String>,
            hour: Option<String>,
            #[serde(rename = "dayOfMonth")]
            day_of_month: Option<String>,
            month: Option<String>,
            #[serde(rename = "dayOfWeek")]
            day_of_week: Option<String>,
            year: Option<String>,
            start: Option<String>,
            end: Option<String>,
            timezone: Option<String>,
        }

        let raw = Raw::deserialize(deserializer)?;
        let mut builder = ScheduleExpression::builder();
        if let Some(text) = raw.second {
            builder = builder.second(text);
        }
        if let Some(text) = raw.minute {
            builder = builder.minute(text);
        }
        if let Some(text) = raw.hour {
            builder = builder.hour(text);
        }
        if let Some(text) = raw.day_of_month {
            builder = builder.day_of_month(text);
        }
        if let Some(text) = raw.month {
            builder = builder.month(text);
        }
        if let Some(text) = raw.day_of_week {
            builder = builder.day_of_week(text);
        }
        if let Some(text) = raw.year {
            builder = builder.year(text);
        }
        if let Some(text) = raw.start {
            let start: Zoned = text.parse().map_err(serde::de::Error::custom)?;
            builder = builder.start(start);
        }
        if let Some(text) = raw.end {
            let end: Zoned = text.parse().map_err(serde::de::Error::custom)?;
            builder = builder.end(end);
        }
        if let Some(name) = raw.timezone {
            builder = builder.timezone(name);
        }
        builder.build().map_err(serde::de::Error::custom)
    }
}

#[cfg(all(test, feature = "serde"))]
mod serde_tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_serialize_shape() {
        let expr = ScheduleExpression::builder()
            .hour("9")
            .day_of_month("last fri")
            .timezone("UTC")
            .build()
            .unwrap();
        let value = serde_json::to_value(&expr).unwrap();
        assert_eq!(
            value,
            json!({
                "second": "0",
                "minute": "0",
                "hour": "9",
                "dayOfMonth": "last fri",
                "month": "*",
                "dayOfWeek": "*",
                "year": "*",
                "timezone": "UTC",
            })
        );
    }

    #[test]
    fn test_round_trip() {
        let start: Zoned = "2026-01-01T00:00:00[UTC]".parse().unwrap();
        let expr = ScheduleExpression::builder()
            .second("*/15")
            .day_of_week("sat-wed")
            .start(start)
            .build()
            .unwrap();
        let text = serde_json::to_string(&expr).unwrap();
        let back: ScheduleExpression = serde_json::from_str(&text).unwrap();
        assert_eq!(back, expr);
    }

    #[test]
    fn test_deserialize_applies_defaults() {
        let expr: ScheduleExpression = serde_json::from_value(json!({"hour": "12"})).unwrap();
        assert_eq!(expr.field(FieldKind::Minute).canonical(FieldKind::Minute), "0");
        assert_eq!(expr.field(FieldKind::Month), &FieldValue::Wildcard);
    }

    #[test]
    fn test_deserialize_rejects_bad_field() {
        let err = serde_json::from_value::<ScheduleExpression>(json!({"hour": "25"})).unwrap_err();
        assert!(err.to_string().contains("hour"));
    }

    #[test]
    fn test_deserialize_rejects_bad_timezone() {
        let err = serde_json::from_value::<ScheduleExpression>(
            json!({"timezone": "Nowhere/Void"}),
        )
        .unwrap_err();
        assert!(err.to_string().contains("timezone"));
    }
}
