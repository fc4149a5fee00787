use jiff::tz::TimeZone;
use jiff::Zoned;

use crate::error::ParseError;

/// The seven schedule fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Second,
    Minute,
    Hour,
    DayOfMonth,
    Month,
    DayOfWeek,
    Year,
}

impl FieldKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Second => "second",
            Self::Minute => "minute",
            Self::Hour => "hour",
            Self::DayOfMonth => "day-of-month",
            Self::Month => "month",
            Self::DayOfWeek => "day-of-week",
            Self::Year => "year",
        }
    }

    /// Inclusive numeric domain of the field.
    ///
    /// Day-of-week uses 1=Sunday..7=Saturday; an input numeral 0 is
    /// normalized to 7 while parsing.
    pub fn domain(self) -> (i16, i16) {
        match self {
            Self::Second | Self::Minute => (0, 59),
            Self::Hour => (0, 23),
            Self::DayOfMonth => (1, 31),
            Self::Month => (1, 12),
            Self::DayOfWeek => (1, 7),
            Self::Year => (1000, 9999),
        }
    }

    /// Number of values in the domain; increment steps may not exceed it.
    pub fn width(self) -> i16 {
        let (min, max) = self.domain();
        max - min + 1
    }
}

/// Day-of-month forms that only resolve against a concrete month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelativeDay {
    /// `last`: the final day of the month.
    Last,
    /// `-n`: n days before the final day of the month, n in 1..=7.
    FromEnd(i8),
    /// `1st`..`5th` plus a weekday, e.g. `2nd tue`.
    NthWeekday { nth: i8, weekday: i8 },
    /// `last` plus a weekday, e.g. `last fri`.
    LastWeekday { weekday: i8 },
}

/// A single resolvable unit: a plain value or a relative day form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldUnit {
    Value(i16),
    Relative(RelativeDay),
}

/// One comma-separated list entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListEntry {
    Unit(FieldUnit),
    Range(FieldUnit, FieldUnit),
}

/// The parsed form of one schedule field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    /// `*`: every value the field can take.
    Wildcard,
    Single(FieldUnit),
    /// `lo-hi`; wraps around the domain when lo resolves above hi.
    Range(FieldUnit, FieldUnit),
    /// Distinct units and ranges; duplicates collapse at parse time.
    List(Vec<ListEntry>),
    /// `start/step` or `*/step`.
    Increment { start: Option<i16>, step: i16 },
}

/// Month number (1..=12) for a 3-letter name, case-insensitive.
pub fn month_number(name: &str) -> Option<i16> {
    let number = match name.to_ascii_lowercase().as_str() {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(number)
}

/// Weekday code (1=Sunday..7=Saturday) for a 3-letter name,
/// case-insensitive.
pub fn weekday_number(name: &str) -> Option<i16> {
    let number = match name.to_ascii_lowercase().as_str() {
        "sun" => 1,
        "mon" => 2,
        "tue" => 3,
        "wed" => 4,
        "thu" => 5,
        "fri" => 6,
        "sat" => 7,
        _ => return None,
    };
    Some(number)
}

/// Canonical 3-letter name for a month number, or `"?"` outside 1..=12.
pub fn month_name(number: i16) -> &'static str {
    match number {
        1 => "jan",
        2 => "feb",
        3 => "mar",
        4 => "apr",
        5 => "may",
        6 => "jun",
        7 => "jul",
        8 => "aug",
        9 => "sep",
        10 => "oct",
        11 => "nov",
        12 => "dec",
        _ => "?",
    }
}

/// Canonical 3-letter name for a weekday code (1=Sunday..7=Saturday),
/// or `"?"` outside 1..=7.
pub fn weekday_name(code: i16) -> &'static str {
    match code {
        1 => "sun",
        2 => "mon",
        3 => "tue",
        4 => "wed",
        5 => "thu",
        6 => "fri",
        7 => "sat",
        _ => "?",
    }
}

/// A parsed, validated schedule expression.
///
/// Built through [`ScheduleExpression::builder`]. Unset fields default to
/// `second=0 minute=0 hour=0 dayOfMonth=* month=* dayOfWeek=* year=*`,
/// which fires at midnight every day.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleExpression {
    pub(crate) second: FieldValue,
    pub(crate) minute: FieldValue,
    pub(crate) hour: FieldValue,
    pub(crate) day_of_month: FieldValue,
    pub(crate) month: FieldValue,
    pub(crate) day_of_week: FieldValue,
    pub(crate) year: FieldValue,
    pub(crate) start: Option<Zoned>,
    pub(crate) end: Option<Zoned>,
    pub(crate) timezone: Option<TimeZone>,
}

impl ScheduleExpression {
    pub fn builder() -> ScheduleBuilder {
        ScheduleBuilder::default()
    }

    /// The parsed value of one field.
    pub fn field(&self, kind: FieldKind) -> &FieldValue {
        match kind {
            FieldKind::Second => &self.second,
            FieldKind::Minute => &self.minute,
            FieldKind::Hour => &self.hour,
            FieldKind::DayOfMonth => &self.day_of_month,
            FieldKind::Month => &self.month,
            FieldKind::DayOfWeek => &self.day_of_week,
            FieldKind::Year => &self.year,
        }
    }

    /// Start of the validity window, inclusive.
    pub fn start(&self) -> Option<&Zoned> {
        self.start.as_ref()
    }

    /// End of the validity window, inclusive.
    pub fn end(&self) -> Option<&Zoned> {
        self.end.as_ref()
    }

    /// Timezone the civil fields are evaluated in, when pinned.
    pub fn timezone(&self) -> Option<&TimeZone> {
        self.timezone.as_ref()
    }
}

/// Field-by-field builder for [`ScheduleExpression`].
#[derive(Debug, Clone, Default)]
pub struct ScheduleBuilder {
    second: Option<String>,
    minute: Option<String>,
    hour: Option<String>,
    day_of_month: Option<String>,
    month: Option<String>,
    day_of_week: Option<String>,
    year: Option<String>,
    start: Option<Zoned>,
    end: Option<Zoned>,
    timezone: Option<String>,
}

impl ScheduleBuilder {
    pub fn second(mut self, text: impl Into<String>) -> Self {
        self.second = Some(text.into());
        self
    }

    pub fn minute(mut self, text: impl Into<String>) -> Self {
        self.minute = Some(text.into());
        self
    }

    pub fn hour(mut self, text: impl Into<String>) -> Self {
        self.hour = Some(text.into());
        self
    }

    pub fn day_of_month(mut self, text: impl Into<String>) -> Self {
        self.day_of_month = Some(text.into());
        self
    }

    pub fn month(mut self, text: impl Into<String>) -> Self {
        self.month = Some(text.into());
        self
    }

    pub fn day_of_week(mut self, text: impl Into<String>) -> Self {
        self.day_of_week = Some(text.into());
        self
    }

    pub fn year(mut self, text: impl Into<String>) -> Self {
        self.year = Some(text.into());
        self
    }

    /// Inclusive lower bound on fire times.
    pub fn start(mut self, start: Zoned) -> Self {
        self.start = Some(start);
        self
    }

    /// Inclusive upper bound on fire times.
    pub fn end(mut self, end: Zoned) -> Self {
        self.end = Some(end);
        self
    }

    /// IANA timezone the civil fields are evaluated in. Without one, the
    /// reference time's zone applies.
    pub fn timezone(mut self, name: impl Into<String>) -> Self {
        self.timezone = Some(name.into());
        self
    }

    /// Parse and validate every field, applying defaults for unset ones.
    pub fn build(self) -> Result<ScheduleExpression, ParseError> {
        let field = |text: Option<String>, default: &str, kind: FieldKind| {
            crate::parser::parse_field(text.as_deref().unwrap_or(default), kind)
        };
        let timezone = match self.timezone {
            Some(name) => Some(TimeZone::get(&name).map_err(|_| ParseError::timezone(name))?),
            None => None,
        };
        Ok(ScheduleExpression {
            second: field(self.second, "0", FieldKind::Second)?,
            minute: field(self.minute, "0", FieldKind::Minute)?,
            hour: field(self.hour, "0", FieldKind::Hour)?,
            day_of_month: field(self.day_of_month, "*", FieldKind::DayOfMonth)?,
            month: field(self.month, "*", FieldKind::Month)?,
            day_of_week: field(self.day_of_week, "*", FieldKind::DayOfWeek)?,
            year: field(self.year, "*", FieldKind::Year)?,
            start: self.start,
            end: self.end,
            timezone,
        })
    }
}
