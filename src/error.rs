use std::fmt;

use crate::ast::FieldKind;

/// All errors produced when building a schedule expression.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ParseError {
    /// A field that was empty or all whitespace.
    Empty { kind: FieldKind },

    /// A numeral outside the field's domain, or an increment step
    /// outside `1..=width`.
    OutOfRange { kind: FieldKind, text: String },

    /// A word where a month or weekday name was expected, matching no
    /// known name.
    UnknownName { kind: FieldKind, text: String },

    /// Text that fits none of the field's forms.
    Malformed { kind: FieldKind, text: String },

    /// An unrecognized IANA timezone identifier.
    Timezone { name: String },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty { kind } => write!(f, "empty {kind} field"),
            Self::OutOfRange { kind, text } => {
                write!(f, "value out of range for {kind}: '{text}'")
            }
            Self::UnknownName { kind, text } => {
                write!(f, "unknown name in {kind} field: '{text}'")
            }
            Self::Malformed { kind, text } => write!(f, "malformed {kind} field: '{text}'"),
            Self::Timezone { name } => write!(f, "unknown timezone: '{name}'"),
        }
    }
}

impl std::error::Error for ParseError {}

impl ParseError {
    pub fn empty(kind: FieldKind) -> Self {
        Self::Empty { kind }
    }

    pub fn out_of_range(kind: FieldKind, text: impl Into<String>) -> Self {
        Self::OutOfRange {
            kind,
            text: text.into(),
        }
    }

    pub fn unknown_name(kind: FieldKind, text: impl Into<String>) -> Self {
        Self::UnknownName {
            kind,
            text: text.into(),
        }
    }

    pub fn malformed(kind: FieldKind, text: impl Into<String>) -> Self {
        Self::Malformed {
            kind,
            text: text.into(),
        }
    }

    pub fn timezone(name: impl Into<String>) -> Self {
        Self::Timezone { name: name.into() }
    }

    /// The field the error refers to, when it refers to one.
    pub fn field(&self) -> Option<FieldKind> {
        match self {
            Self::Empty { kind }
            | Self::OutOfRange { kind, .. }
            | Self::UnknownName { kind, .. }
            | Self::Malformed { kind, .. } => Some(*kind),
            Self::Timezone { .. } => None,
        }
    }
}
