//! Text-to-structure parsing for the seven schedule fields.
//!
//! Each field is parsed on its own against its kind's domain. The same
//! routine backs both [`parse_field`] and [`validate`], so a field is
//! valid exactly when it parses.

use crate::ast::{
    month_number, weekday_number, FieldKind, FieldUnit, FieldValue, ListEntry, RelativeDay,
};
use crate::error::ParseError;

/// Whether `text` is a valid expression for `kind`.
pub fn validate(text: &str, kind: FieldKind) -> bool {
    parse_field(text, kind).is_ok()
}

/// Parse one field's text into its structured form.
pub fn parse_field(text: &str, kind: FieldKind) -> Result<FieldValue, ParseError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ParseError::empty(kind));
    }
    if text == "*" {
        return Ok(FieldValue::Wildcard);
    }
    if text.contains(',') {
        return parse_list(text, kind);
    }
    if let Some(increment) = parse_increment(text, kind)? {
        return Ok(increment);
    }
    Ok(match parse_entry(text, kind)? {
        ListEntry::Unit(unit) => FieldValue::Single(unit),
        ListEntry::Range(lo, hi) => FieldValue::Range(lo, hi),
    })
}

/// `start/step` increments. `None` when the text has no '/' at all.
fn parse_increment(text: &str, kind: FieldKind) -> Result<Option<FieldValue>, ParseError> {
    let Some((start_text, step_text)) = text.split_once('/') else {
        return Ok(None);
    };
    let (start_text, step_text) = (start_text.trim(), step_text.trim());
    if start_text.is_empty() || step_text.is_empty() {
        return Err(ParseError::malformed(kind, text));
    }
    let start = if start_text == "*" {
        None
    } else {
        let value: i16 = start_text
            .parse()
            .map_err(|_| ParseError::malformed(kind, text))?;
        let value = if kind == FieldKind::DayOfWeek && value == 0 {
            7
        } else {
            value
        };
        let (min, max) = kind.domain();
        if value < min || value > max {
            return Err(ParseError::out_of_range(kind, text));
        }
        Some(value)
    };
    let step: i16 = step_text
        .parse()
        .map_err(|_| ParseError::malformed(kind, text))?;
    if step < 1 || step > kind.width() {
        return Err(ParseError::out_of_range(kind, text));
    }
    Ok(Some(FieldValue::Increment { start, step }))
}

/// Comma-separated units and ranges. `*` and increments are not legal
/// list entries. Entries equal after name resolution collapse to one.
fn parse_list(text: &str, kind: FieldKind) -> Result<FieldValue, ParseError> {
    let mut entries: Vec<ListEntry> = Vec::new();
    for part in text.split(',') {
        let part = part.trim();
        if part.is_empty() || part == "*" || part.contains('/') {
            return Err(ParseError::malformed(kind, text));
        }
        let entry = parse_entry(part, kind)?;
        if !entries.contains(&entry) {
            entries.push(entry);
        }
    }
    // Deduplication can leave one entry; keep the simpler shape then.
    if let [entry] = entries[..] {
        return Ok(match entry {
            ListEntry::Unit(unit) => FieldValue::Single(unit),
            ListEntry::Range(lo, hi) => FieldValue::Range(lo, hi),
        });
    }
    Ok(FieldValue::List(entries))
}

/// A unit, or a `lo-hi` range between two units.
fn parse_entry(text: &str, kind: FieldKind) -> Result<ListEntry, ParseError> {
    if let Some(unit) = parse_unit(text, kind) {
        return Ok(ListEntry::Unit(unit));
    }
    // Try each '-' as the range separator: negative day offsets carry a
    // leading '-' of their own, so the first split is not always right.
    for (i, ch) in text.char_indices() {
        if ch != '-' || i == 0 {
            continue;
        }
        let (lo_text, hi_text) = (text[..i].trim(), text[i + 1..].trim());
        if lo_text.is_empty() || hi_text.is_empty() {
            continue;
        }
        if let (Some(lo), Some(hi)) = (parse_unit(lo_text, kind), parse_unit(hi_text, kind)) {
            return Ok(ListEntry::Range(lo, hi));
        }
    }
    Err(classify(text, kind))
}

/// A numeral, a 3-letter name, or (day-of-month only) a relative form.
fn parse_unit(text: &str, kind: FieldKind) -> Option<FieldUnit> {
    if kind == FieldKind::DayOfMonth {
        if let Some(relative) = parse_relative(text) {
            return Some(FieldUnit::Relative(relative));
        }
    }
    // Try as a number first; names only fit month and day-of-week.
    if let Ok(value) = text.parse::<i16>() {
        let value = if kind == FieldKind::DayOfWeek && value == 0 {
            7
        } else {
            value
        };
        let (min, max) = kind.domain();
        return (value >= min && value <= max).then_some(FieldUnit::Value(value));
    }
    match kind {
        FieldKind::Month => month_number(text).map(FieldUnit::Value),
        FieldKind::DayOfWeek => weekday_number(text).map(FieldUnit::Value),
        _ => None,
    }
}

/// Relative day-of-month forms: `last`, `-n`, `last <weekday>`, and
/// `<1st..5th> <weekday>`.
fn parse_relative(text: &str) -> Option<RelativeDay> {
    let lower = text.to_ascii_lowercase();
    if lower == "last" {
        return Some(RelativeDay::Last);
    }
    if let Some(offset) = lower.strip_prefix('-') {
        let n: i8 = offset.parse().ok()?;
        return (1..=7).contains(&n).then_some(RelativeDay::FromEnd(n));
    }
    let mut words = lower.split_whitespace();
    let (first, second) = (words.next()?, words.next()?);
    if words.next().is_some() {
        return None;
    }
    let weekday = parse_weekday_word(second)?;
    if first == "last" {
        return Some(RelativeDay::LastWeekday { weekday });
    }
    let nth = match first {
        "1st" => 1,
        "2nd" => 2,
        "3rd" => 3,
        "4th" => 4,
        "5th" => 5,
        _ => return None,
    };
    Some(RelativeDay::NthWeekday { nth, weekday })
}

/// The weekday half of a relative form: a 3-letter name or a 0..7
/// numeral, with 0 meaning 7.
fn parse_weekday_word(text: &str) -> Option<i8> {
    if let Ok(value) = text.parse::<i8>() {
        let value = if value == 0 { 7 } else { value };
        return (1..=7).contains(&value).then_some(value);
    }
    weekday_number(text).map(|n| n as i8)
}

/// Pick the most telling error for text that parsed as nothing.
fn classify(text: &str, kind: FieldKind) -> ParseError {
    if text.parse::<i64>().is_ok() {
        return ParseError::out_of_range(kind, text);
    }
    if text.chars().all(|c| c.is_ascii_alphabetic()) {
        return ParseError::unknown_name(kind, text);
    }
    ParseError::malformed(kind, text)
}
