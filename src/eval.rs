//! Schedule evaluation: resolving fields against a concrete month and
//! searching forward for the next fire time.
//!
//! The search walks levels from year down to second. At each level it
//! asks the field for the smallest matching value at or above the
//! current candidate; when a level has to move, every smaller level
//! resets to its minimum and the walk restarts from the top. Day
//! candidates combine the day-of-month and day-of-week fields: a
//! wildcard defers to the other field, and when both are constrained a
//! day matching either is eligible.

use std::collections::BTreeSet;

use jiff::civil::{Date, DateTime, Time};
use jiff::{Span, Zoned};

use crate::ast::{FieldKind, FieldUnit, FieldValue, ListEntry, RelativeDay, ScheduleExpression};

/// Upper bound on carry/restart iterations before the search gives up.
const MAX_SEARCH_STEPS: usize = 200_000;

/// Years scanned past the reference when the year field is a wildcard.
const YEAR_HORIZON: i16 = 100;

/// Retries when a zone fold maps a candidate before the reference;
/// covers an hour-long transition at one-second granularity.
const FOLD_RETRIES: usize = 4096;

/// The (year, month) pair that day-of-month resolution depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthContext {
    pub year: i16,
    pub month: i8,
}

impl MonthContext {
    /// Number of days in the month, or 0 for an unrepresentable pair.
    pub fn days(self) -> i8 {
        match Date::new(self.year, self.month, 1) {
            Ok(first) => first.days_in_month(),
            Err(_) => 0,
        }
    }
}

/// Where a field's value set sits relative to a probe value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ceiling {
    /// The smallest matching value at or above the probe.
    At(i16),
    /// Nothing at or above the probe; the set restarts at this minimum.
    Wrapped(i16),
    /// The field matches nothing in this context.
    Empty,
}

impl FieldValue {
    /// Every concrete value the field matches in `cx`, ascending.
    ///
    /// Relative forms resolve against the month; entries that cannot
    /// resolve there (a fifth weekday the month lacks, a day past its
    /// end) drop out, so the set may come back empty.
    pub fn values(&self, kind: FieldKind, cx: MonthContext) -> BTreeSet<i16> {
        let (min, max) = effective_domain(kind, cx);
        let mut out = BTreeSet::new();
        if min > max {
            return out;
        }
        match self {
            FieldValue::Wildcard => {
                out.extend(min..=max);
            }
            FieldValue::Single(unit) => {
                if let Some(v) = resolve_unit(*unit, cx) {
                    if v >= min && v <= max {
                        out.insert(v);
                    }
                }
            }
            FieldValue::Range(lo, hi) => add_range(&mut out, *lo, *hi, kind, cx),
            FieldValue::List(entries) => {
                for entry in entries {
                    match entry {
                        ListEntry::Unit(unit) => {
                            if let Some(v) = resolve_unit(*unit, cx) {
                                if v >= min && v <= max {
                                    out.insert(v);
                                }
                            }
                        }
                        ListEntry::Range(lo, hi) => add_range(&mut out, *lo, *hi, kind, cx),
                    }
                }
            }
            FieldValue::Increment { start, step } => {
                // A non-positive step never leaves the parser.
                if *step < 1 {
                    return out;
                }
                let (domain_min, _) = kind.domain();
                let mut v = start.unwrap_or(domain_min);
                while v <= max {
                    if v >= min {
                        out.insert(v);
                    }
                    v += *step;
                }
            }
        }
        out
    }

    /// The smallest matching value at or above `at` in `cx`, without
    /// materializing the set for wildcards.
    pub fn ceiling(&self, kind: FieldKind, cx: MonthContext, at: i16) -> Ceiling {
        if let FieldValue::Wildcard = self {
            let (min, max) = effective_domain(kind, cx);
            if min > max {
                return Ceiling::Empty;
            }
            return if at <= min {
                Ceiling::At(min)
            } else if at <= max {
                Ceiling::At(at)
            } else {
                Ceiling::Wrapped(min)
            };
        }
        let set = self.values(kind, cx);
        match set.range(at..).next() {
            Some(&v) => Ceiling::At(v),
            None => match set.first() {
                Some(&min) => Ceiling::Wrapped(min),
                None => Ceiling::Empty,
            },
        }
    }
}

/// The domain with day-of-month clipped to the month's actual length.
fn effective_domain(kind: FieldKind, cx: MonthContext) -> (i16, i16) {
    match kind {
        FieldKind::DayOfMonth => (1, cx.days() as i16),
        _ => kind.domain(),
    }
}

fn resolve_unit(unit: FieldUnit, cx: MonthContext) -> Option<i16> {
    match unit {
        FieldUnit::Value(v) => Some(v),
        FieldUnit::Relative(rel) => resolve_relative(rel, cx).map(i16::from),
    }
}

/// Resolve a relative day form to a concrete day of `cx`'s month.
fn resolve_relative(rel: RelativeDay, cx: MonthContext) -> Option<i8> {
    let first = Date::new(cx.year, cx.month, 1).ok()?;
    let last = first.days_in_month();
    match rel {
        RelativeDay::Last => Some(last),
        RelativeDay::FromEnd(n) => {
            let day = last - n;
            (day >= 1).then_some(day)
        }
        RelativeDay::NthWeekday { nth, weekday } => {
            let first_code = first.weekday().to_sunday_one_offset();
            let day = 1 + (weekday - first_code).rem_euclid(7) + (nth - 1) * 7;
            (day <= last).then_some(day)
        }
        RelativeDay::LastWeekday { weekday } => {
            let last_date = Date::new(cx.year, cx.month, last).ok()?;
            let last_code = last_date.weekday().to_sunday_one_offset();
            Some(last - (last_code - weekday).rem_euclid(7))
        }
    }
}

/// Expand a range over the field's static domain, wrapping when the low
/// end resolves above the high end, then clip to the context domain.
fn add_range(
    out: &mut BTreeSet<i16>,
    lo: FieldUnit,
    hi: FieldUnit,
    kind: FieldKind,
    cx: MonthContext,
) {
    let (Some(lo), Some(hi)) = (resolve_unit(lo, cx), resolve_unit(hi, cx)) else {
        return;
    };
    let (domain_min, domain_max) = kind.domain();
    let (min, max) = effective_domain(kind, cx);
    let mut push = |from: i16, to: i16| {
        for v in from.max(min)..=to.min(max) {
            out.insert(v);
        }
    };
    if lo <= hi {
        push(lo, hi);
    } else {
        push(lo, domain_max);
        push(domain_min, hi);
    }
}

/// Weekday code (1=Sunday..7=Saturday) of the first day of the month.
fn first_weekday(cx: MonthContext) -> Option<i16> {
    let first = Date::new(cx.year, cx.month, 1).ok()?;
    Some(i16::from(first.weekday().to_sunday_one_offset()))
}

/// Smallest eligible day at or after `at` under the combined day rule,
/// or None when the rest of the month has none.
fn day_ceiling(expr: &ScheduleExpression, cx: MonthContext, at: i16) -> Option<i16> {
    let last = i16::from(cx.days());
    if last == 0 {
        return None;
    }
    let dom_wild = matches!(expr.day_of_month, FieldValue::Wildcard);
    let dow_wild = matches!(expr.day_of_week, FieldValue::Wildcard);
    if dom_wild && dow_wild {
        let day = at.max(1);
        return (day <= last).then_some(day);
    }
    let dom_days = expr.day_of_month.values(FieldKind::DayOfMonth, cx);
    let dow_codes = expr.day_of_week.values(FieldKind::DayOfWeek, cx);
    let first_code = first_weekday(cx)?;
    for day in at.max(1)..=last {
        let code = (first_code - 1 + day - 1).rem_euclid(7) + 1;
        let on_dom = dom_days.contains(&day);
        let on_dow = dow_codes.contains(&code);
        let eligible = if dom_wild {
            on_dow
        } else if dow_wild {
            on_dom
        } else {
            on_dom || on_dow
        };
        if eligible {
            return Some(day);
        }
    }
    None
}

/// Next civil datetime at or after `reference` matching the seven
/// fields, ignoring the window and timezone attributes.
///
/// References with sub-second precision round up to the next whole
/// second before the search starts.
pub fn next_civil(expr: &ScheduleExpression, reference: DateTime) -> Option<DateTime> {
    let mut from = reference;
    if from.subsec_nanosecond() != 0 {
        let time = Time::new(from.hour(), from.minute(), from.second(), 0).ok()?;
        from = from
            .date()
            .to_datetime(time)
            .checked_add(Span::new().seconds(1))
            .ok()?;
    }

    let horizon = match &expr.year {
        FieldValue::Wildcard => from.year().max(1000).saturating_add(YEAR_HORIZON),
        _ => 9999,
    };

    let mut year = from.year();
    let mut month = i16::from(from.month());
    let mut day = i16::from(from.day());
    let mut hour = i16::from(from.hour());
    let mut minute = i16::from(from.minute());
    let mut second = i16::from(from.second());

    for _ in 0..MAX_SEARCH_STEPS {
        // Year and month resolution never depends on the day context.
        let cx = MonthContext { year, month: 1 };

        match expr.year.ceiling(FieldKind::Year, cx, year) {
            Ceiling::At(y) => {
                if y > horizon {
                    return None;
                }
                if y > year {
                    year = y;
                    month = 1;
                    day = 1;
                    hour = 0;
                    minute = 0;
                    second = 0;
                    continue;
                }
            }
            // No matching year remains.
            Ceiling::Wrapped(_) | Ceiling::Empty => return None,
        }

        match expr.month.ceiling(FieldKind::Month, cx, month) {
            Ceiling::At(m) => {
                if m > month {
                    month = m;
                    day = 1;
                    hour = 0;
                    minute = 0;
                    second = 0;
                    continue;
                }
            }
            Ceiling::Wrapped(_) | Ceiling::Empty => {
                year += 1;
                month = 1;
                day = 1;
                hour = 0;
                minute = 0;
                second = 0;
                continue;
            }
        }

        let cx = MonthContext {
            year,
            month: month as i8,
        };

        match day_ceiling(expr, cx, day) {
            Some(d) => {
                if d > day {
                    day = d;
                    hour = 0;
                    minute = 0;
                    second = 0;
                    continue;
                }
            }
            None => {
                month += 1;
                day = 1;
                hour = 0;
                minute = 0;
                second = 0;
                continue;
            }
        }

        match expr.hour.ceiling(FieldKind::Hour, cx, hour) {
            Ceiling::At(h) => {
                if h > hour {
                    hour = h;
                    minute = 0;
                    second = 0;
                    continue;
                }
            }
            Ceiling::Wrapped(_) | Ceiling::Empty => {
                day += 1;
                hour = 0;
                minute = 0;
                second = 0;
                continue;
            }
        }

        match expr.minute.ceiling(FieldKind::Minute, cx, minute) {
            Ceiling::At(m) => {
                if m > minute {
                    minute = m;
                    second = 0;
                    continue;
                }
            }
            Ceiling::Wrapped(_) | Ceiling::Empty => {
                hour += 1;
                minute = 0;
                second = 0;
                continue;
            }
        }

        match expr.second.ceiling(FieldKind::Second, cx, second) {
            Ceiling::At(s) => {
                let date = Date::new(year, month as i8, day as i8).ok()?;
                let time = Time::new(hour as i8, minute as i8, s as i8, 0).ok()?;
                return Some(date.to_datetime(time));
            }
            Ceiling::Wrapped(_) | Ceiling::Empty => {
                minute += 1;
                second = 0;
                continue;
            }
        }
    }
    None
}

/// Next fire time at or after `reference`, honoring the expression's
/// timezone and start/end window. `None` means the schedule never fires
/// again.
///
/// Civil fields are evaluated in the expression's timezone when one is
/// pinned, otherwise in the reference's. Candidates that land in a zone
/// gap move forward with the gap; candidates that a fold maps before
/// the reference are skipped.
pub fn next_from(expr: &ScheduleExpression, reference: &Zoned) -> Option<Zoned> {
    let tz = match &expr.timezone {
        Some(tz) => tz.clone(),
        None => reference.time_zone().clone(),
    };

    // An inverted window matches nothing.
    if let (Some(start), Some(end)) = (&expr.start, &expr.end) {
        if end < start {
            return None;
        }
    }

    let mut from = reference.clone();
    if let Some(start) = &expr.start {
        if from < *start {
            from = start.clone();
        }
    }

    let mut civil = from.with_time_zone(tz.clone()).datetime();
    for _ in 0..FOLD_RETRIES {
        let candidate = next_civil(expr, civil)?;
        let zoned = candidate.to_zoned(tz.clone()).ok()?;
        if zoned >= from {
            if let Some(end) = &expr.end {
                if zoned > *end {
                    return None;
                }
            }
            return Some(zoned);
        }
        civil = candidate.checked_add(Span::new().seconds(1)).ok()?;
    }
    None
}

/// Whether `at`, truncated to the second, is exactly a fire time.
pub fn matches(expr: &ScheduleExpression, at: &Zoned) -> bool {
    let subsec = at.datetime().subsec_nanosecond();
    let probe = if subsec == 0 {
        at.clone()
    } else {
        match at.checked_sub(Span::new().nanoseconds(i64::from(subsec))) {
            Ok(z) => z,
            Err(_) => return false,
        }
    };
    match next_from(expr, &probe) {
        Some(next) => next.timestamp() == probe.timestamp(),
        None => false,
    }
}

/// Lazy iterator over successive fire times at or after a start point.
pub struct FireTimes<'a> {
    expr: &'a ScheduleExpression,
    cursor: Option<Zoned>,
}

impl<'a> FireTimes<'a> {
    pub(crate) fn new(expr: &'a ScheduleExpression, from: Zoned) -> Self {
        Self {
            expr,
            cursor: Some(from),
        }
    }
}

impl Iterator for FireTimes<'_> {
    type Item = Zoned;

    fn next(&mut self) -> Option<Self::Item> {
        let cursor = self.cursor.take()?;
        let fire = next_from(self.expr, &cursor)?;
        self.cursor = fire.checked_add(Span::new().seconds(1)).ok();
        Some(fire)
    }
}

/// Fire times within an inclusive `[from, to]` window.
pub struct BoundedFireTimes<'a> {
    inner: FireTimes<'a>,
    to: Zoned,
}

impl<'a> BoundedFireTimes<'a> {
    pub(crate) fn new(expr: &'a ScheduleExpression, from: Zoned, to: Zoned) -> Self {
        Self {
            inner: FireTimes::new(expr, from),
            to,
        }
    }
}

impl Iterator for BoundedFireTimes<'_> {
    type Item = Zoned;

    fn next(&mut self) -> Option<Self::Item> {
        let fire = self.inner.next()?;
        (fire <= self.to).then_some(fire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_field;

    const JUL_2050: MonthContext = MonthContext {
        year: 2050,
        month: 7,
    };
    const FEB_2026: MonthContext = MonthContext {
        year: 2026,
        month: 2,
    };
    const MAR_2026: MonthContext = MonthContext {
        year: 2026,
        month: 3,
    };

    fn set(text: &str, kind: FieldKind, cx: MonthContext) -> Vec<i16> {
        parse_field(text, kind)
            .unwrap()
            .values(kind, cx)
            .into_iter()
            .collect()
    }

    fn civil(text: &str) -> DateTime {
        text.parse().expect("valid civil datetime")
    }

    #[test]
    fn test_increment_values() {
        assert_eq!(
            set("*/5", FieldKind::Second, JUL_2050),
            (0..60).step_by(5).collect::<Vec<i16>>()
        );
        assert_eq!(
            set("45/3", FieldKind::Second, JUL_2050),
            vec![45, 48, 51, 54, 57]
        );
        assert_eq!(set("0/6", FieldKind::Hour, JUL_2050), vec![0, 6, 12, 18]);
    }

    #[test]
    fn test_weekday_wraparound_ranges() {
        // Friday through Thursday covers the whole week.
        assert_eq!(
            set("fri-thu", FieldKind::DayOfWeek, JUL_2050),
            vec![1, 2, 3, 4, 5, 6, 7]
        );
        let named = set("sat-wed", FieldKind::DayOfWeek, JUL_2050);
        assert_eq!(named, vec![1, 2, 3, 4, 7]);
        assert_eq!(set("7-4", FieldKind::DayOfWeek, JUL_2050), named);
    }

    #[test]
    fn test_relative_day_values() {
        assert_eq!(set("last", FieldKind::DayOfMonth, FEB_2026), vec![28]);
        // July has 31 days; three days before the last is the 28th.
        assert_eq!(set("-3", FieldKind::DayOfMonth, JUL_2050), vec![28]);
        assert_eq!(set("-1", FieldKind::DayOfMonth, JUL_2050), vec![30]);
        assert_eq!(set("last fri", FieldKind::DayOfMonth, JUL_2050), vec![29]);
        assert_eq!(
            set("1st fri-1st mon", FieldKind::DayOfMonth, JUL_2050),
            vec![1, 2, 3, 4]
        );
        assert_eq!(
            set("-5--3", FieldKind::DayOfMonth, JUL_2050),
            vec![26, 27, 28]
        );
    }

    #[test]
    fn test_unresolvable_relative_days_are_empty() {
        // February 2026 has only four Mondays.
        assert_eq!(set("5th mon", FieldKind::DayOfMonth, FEB_2026), Vec::<i16>::new());
        assert_eq!(set("5th mon", FieldKind::DayOfMonth, MAR_2026), vec![30]);
        assert_eq!(set("31", FieldKind::DayOfMonth, FEB_2026), Vec::<i16>::new());
        assert_eq!(set("29", FieldKind::DayOfMonth, FEB_2026), Vec::<i16>::new());
    }

    #[test]
    fn test_day_range_clipped_to_month() {
        assert_eq!(
            set("27-last", FieldKind::DayOfMonth, FEB_2026),
            vec![27, 28]
        );
        // A wrapped day range expands over 1..=31 before clipping.
        assert_eq!(set("29-2", FieldKind::DayOfMonth, FEB_2026), vec![1, 2]);
    }

    #[test]
    fn test_ceiling() {
        let field = parse_field("15,30", FieldKind::Minute).unwrap();
        assert_eq!(field.ceiling(FieldKind::Minute, JUL_2050, 10), Ceiling::At(15));
        assert_eq!(field.ceiling(FieldKind::Minute, JUL_2050, 15), Ceiling::At(15));
        assert_eq!(field.ceiling(FieldKind::Minute, JUL_2050, 16), Ceiling::At(30));
        assert_eq!(
            field.ceiling(FieldKind::Minute, JUL_2050, 31),
            Ceiling::Wrapped(15)
        );

        let impossible = parse_field("31", FieldKind::DayOfMonth).unwrap();
        assert_eq!(
            impossible.ceiling(FieldKind::DayOfMonth, FEB_2026, 1),
            Ceiling::Empty
        );

        let wild = FieldValue::Wildcard;
        assert_eq!(wild.ceiling(FieldKind::Year, JUL_2050, 2026), Ceiling::At(2026));
        assert_eq!(wild.ceiling(FieldKind::Hour, JUL_2050, 24), Ceiling::Wrapped(0));
    }

    #[test]
    fn test_next_civil_cascades_through_boundaries() {
        let expr = ScheduleExpression::builder().build().unwrap();
        assert_eq!(
            next_civil(&expr, civil("2026-12-31T23:59:59")),
            Some(civil("2027-01-01T00:00:00"))
        );
        assert_eq!(
            next_civil(&expr, civil("2026-03-05T00:00:00")),
            Some(civil("2026-03-05T00:00:00"))
        );
    }

    #[test]
    fn test_next_civil_rounds_subseconds_up() {
        let expr = ScheduleExpression::builder()
            .minute("*")
            .hour("*")
            .build()
            .unwrap();
        assert_eq!(
            next_civil(&expr, civil("2026-03-05T09:00:00.5")),
            Some(civil("2026-03-05T09:01:00"))
        );
    }

    #[test]
    fn test_next_civil_impossible_expression_stops() {
        let expr = ScheduleExpression::builder()
            .day_of_month("31")
            .month("feb")
            .build()
            .unwrap();
        assert_eq!(next_civil(&expr, civil("2026-01-01T00:00:00")), None);
    }

    #[test]
    fn test_next_civil_exhausted_year_stops() {
        let expr = ScheduleExpression::builder().year("2026").build().unwrap();
        assert_eq!(next_civil(&expr, civil("2027-05-01T00:00:00")), None);
    }

    #[test]
    fn test_day_rule_or_union() {
        let expr = ScheduleExpression::builder()
            .day_of_month("15")
            .day_of_week("sun")
            .month("7")
            .year("2050")
            .build()
            .unwrap();
        let mut days = Vec::new();
        let mut at = civil("2050-07-01T00:00:00");
        while let Some(next) = next_civil(&expr, at) {
            days.push(i16::from(next.day()));
            at = next.checked_add(Span::new().seconds(1)).unwrap();
        }
        assert_eq!(days, vec![3, 10, 15, 17, 24, 31]);
    }
}
