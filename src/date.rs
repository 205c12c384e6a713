//! Event dates are kept as `DD/MM/YYYY` text. All parsing, path rewriting
//! and ordering of that text lives here.

use std::cmp::Ordering;
use std::fmt;

use chrono::NaiveDate;

use crate::models::Event;

const DATE_FORMAT: &str = "%d/%m/%Y";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventDate(String);

impl EventDate {
    /// Path segments use `-` where stored dates use `/`. The rewrite is
    /// literal: `2024-05-01` becomes `2024/05/01`, nothing is reordered.
    pub fn from_path(value: &str) -> Self {
        Self(value.replace('-', "/"))
    }

    pub fn from_naive(date: NaiveDate) -> Self {
        Self(date.format(DATE_FORMAT).to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reads stored `DD/MM/YYYY` text. Day and month may omit the leading zero.
pub fn parse(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text, DATE_FORMAT).ok()
}

/// Newest first. Text that is not a `DD/MM/YYYY` date goes after every
/// parseable one.
pub fn newest_first(a: &str, b: &str) -> Ordering {
    match (parse(a), parse(b)) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

pub fn sort_newest_first(events: &mut [Event]) {
    events.sort_by(|a, b| newest_first(&a.data, &b.data));
}
