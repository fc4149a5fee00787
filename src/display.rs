//! Canonical text for fields and whole expressions.
//!
//! Canonical text lowercases names, drops redundant whitespace, and
//! always re-parses to the value it came from.

use std::fmt;

use crate::ast::{
    month_name, weekday_name, FieldKind, FieldUnit, FieldValue, ListEntry, RelativeDay,
    ScheduleExpression,
};

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FieldValue {
    /// Canonical text for this field under `kind`.
    pub fn canonical(&self, kind: FieldKind) -> String {
        match self {
            FieldValue::Wildcard => "*".to_string(),
            FieldValue::Single(unit) => unit_text(*unit, kind),
            FieldValue::Range(lo, hi) => {
                format!("{}-{}", unit_text(*lo, kind), unit_text(*hi, kind))
            }
            FieldValue::List(entries) => {
                let parts: Vec<String> = entries.iter().map(|e| entry_text(*e, kind)).collect();
                parts.join(",")
            }
            FieldValue::Increment { start, step } => match start {
                Some(start) => format!("{start}/{step}"),
                None => format!("*/{step}"),
            },
        }
    }
}

fn entry_text(entry: ListEntry, kind: FieldKind) -> String {
    match entry {
        ListEntry::Unit(unit) => unit_text(unit, kind),
        ListEntry::Range(lo, hi) => format!("{}-{}", unit_text(lo, kind), unit_text(hi, kind)),
    }
}

fn unit_text(unit: FieldUnit, kind: FieldKind) -> String {
    match unit {
        FieldUnit::Value(v) => match kind {
            FieldKind::Month => month_name(v).to_string(),
            FieldKind::DayOfWeek => weekday_name(v).to_string(),
            _ => v.to_string(),
        },
        FieldUnit::Relative(rel) => relative_text(rel),
    }
}

fn relative_text(rel: RelativeDay) -> String {
    match rel {
        RelativeDay::Last => "last".to_string(),
        RelativeDay::FromEnd(n) => format!("-{n}"),
        RelativeDay::NthWeekday { nth, weekday } => {
            format!("{} {}", ordinal(nth), weekday_name(i16::from(weekday)))
        }
        RelativeDay::LastWeekday { weekday } => {
            format!("last {}", weekday_name(i16::from(weekday)))
        }
    }
}

fn ordinal(nth: i8) -> &'static str {
    match nth {
        1 => "1st",
        2 => "2nd",
        3 => "3rd",
        4 => "4th",
        _ => "5th",
    }
}

impl fmt::Display for ScheduleExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "second={} minute={} hour={} dayOfMonth={} month={} dayOfWeek={} year={}",
            self.second.canonical(FieldKind::Second),
            self.minute.canonical(FieldKind::Minute),
            self.hour.canonical(FieldKind::Hour),
            self.day_of_month.canonical(FieldKind::DayOfMonth),
            self.month.canonical(FieldKind::Month),
            self.day_of_week.canonical(FieldKind::DayOfWeek),
            self.year.canonical(FieldKind::Year),
        )?;
        if let Some(start) = &self.start {
            write!(f, " start={start}")?;
        }
        if let Some(end) = &self.end {
            write!(f, " end={end}")?;
        }
        if let Some(name) = self.timezone.as_ref().and_then(|tz| tz.iana_name()) {
            write!(f, " timezone={name}")?;
        }
        Ok(())
    }
}
