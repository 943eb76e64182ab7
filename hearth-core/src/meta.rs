use std::collections::HashMap;
use std::fmt;

use chrono::NaiveDate;

/// Author-facing date format in front matter.
pub const DATE_INPUT_FORMAT: &str = "%d/%m/%Y";
/// Human-readable form used in rendered pages, e.g. `05 Mar 2024`.
pub const DATE_DISPLAY_FORMAT: &str = "%d %b %Y";

/// A document date carrying both the parsed value and its display form.
/// Sorting always uses the parsed value; the display string is for
/// rendering only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocDate {
    parsed: NaiveDate,
    display: String,
}

impl DocDate {
    pub fn parse(raw: &str) -> Result<Self, MetaError> {
        let parsed = NaiveDate::parse_from_str(raw, DATE_INPUT_FORMAT).map_err(|source| {
            MetaError::BadDate {
                value: raw.to_string(),
                source,
            }
        })?;
        let display = parsed.format(DATE_DISPLAY_FORMAT).to_string();
        Ok(Self { parsed, display })
    }

    pub fn ordinal(&self) -> NaiveDate {
        self.parsed
    }

    pub fn display(&self) -> &str {
        &self.display
    }
}

/// Typed view over a document's front-matter fields. Anything other than
/// `Title` and `Date` is ignored.
#[derive(Debug, Clone, Default)]
pub struct DocMeta {
    pub title: Option<String>,
    pub date: Option<DocDate>,
}

impl DocMeta {
    /// Validate the fields we care about at parse time, not at use time.
    /// A malformed `Date` is an authoring error scoped to this document.
    pub fn from_fields(fields: &HashMap<String, String>) -> Result<Self, MetaError> {
        let title = fields.get("Title").cloned();
        let date = match fields.get("Date") {
            Some(raw) => Some(DocDate::parse(raw)?),
            None => None,
        };
        Ok(Self { title, date })
    }
}

#[derive(Debug)]
pub enum MetaError {
    BadDate {
        value: String,
        source: chrono::ParseError,
    },
}

impl fmt::Display for MetaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetaError::BadDate { value, source } => {
                write!(f, "invalid date '{}' (expected DD/MM/YYYY): {}", value, source)
            }
        }
    }
}

impl std::error::Error for MetaError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MetaError::BadDate { source, .. } => Some(source),
        }
    }
}
