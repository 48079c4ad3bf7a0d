use std::fmt;

use chrono::NaiveDate;

/// A totally ordered identifier of one item of fetch progress.
///
/// Units also carry their own plain-text cursor encoding so the cursor file
/// never needs to know which feed it belongs to.
pub trait WorkUnit: Clone + Ord + fmt::Display + fmt::Debug + Send + Sync + 'static {
    fn to_cursor(&self) -> String;
    fn from_cursor(text: &str) -> Option<Self>;
}

/// Identifier of one CVE record, e.g. `CVE-2023-0042`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CveId {
    pub year: i32,
    pub sequence: u32,
}

impl CveId {
    pub fn new(year: i32, sequence: u32) -> Self {
        Self { year, sequence }
    }

    /// The identifier following `self`, bounded by the per-year `ceiling`
    /// and the last year to enumerate.
    pub fn next_in_range(&self, ceiling: u32, last_year: i32) -> Option<CveId> {
        if self.sequence < ceiling {
            return Some(CveId::new(self.year, self.sequence + 1));
        }
        if self.year < last_year {
            return Some(CveId::new(self.year + 1, 1));
        }
        None
    }
}

impl fmt::Display for CveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CVE-{}-{:04}", self.year, self.sequence)
    }
}

impl WorkUnit for CveId {
    fn to_cursor(&self) -> String {
        format!("{},{}", self.year, self.sequence)
    }

    fn from_cursor(text: &str) -> Option<Self> {
        let (year, sequence) = text.trim().split_once(',')?;
        let year = year.trim().parse::<i32>().ok()?;
        let sequence = sequence.trim().parse::<u32>().ok()?;
        if sequence == 0 {
            return None;
        }
        Some(CveId::new(year, sequence))
    }
}

impl WorkUnit for NaiveDate {
    fn to_cursor(&self) -> String {
        self.format("%Y-%m-%d").to_string()
    }

    fn from_cursor(text: &str) -> Option<Self> {
        NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d").ok()
    }
}
