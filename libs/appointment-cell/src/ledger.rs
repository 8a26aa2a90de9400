// libs/appointment-cell/src/ledger.rs
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};

const MAX_TIME_LABEL_LEN: usize = 16;

fn time_label_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^([0-9]{1,2}):([0-5][0-9])\s?([AaPp][Mm])?$")
            .expect("time label pattern compiles")
    })
}

/// A bookable time of day such as `10:00` or `10:30 AM`.
///
/// Labels are stored in canonical form: no leading zero on the hour and an
/// uppercase meridiem after a single space, so `09:30pm` and `9:30 PM` name
/// the same slot. 24-hour and 12-hour spellings stay distinct.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeLabel(String);

impl TimeLabel {
    pub fn parse(raw: &str) -> Result<Self, String> {
        let trimmed = raw.trim();

        if trimmed.is_empty() {
            return Err("Slot time is required".to_string());
        }
        let invalid = || format!("Invalid slot time '{}'", trimmed);
        if trimmed.len() > MAX_TIME_LABEL_LEN {
            return Err(invalid());
        }
        let captures = time_label_pattern().captures(trimmed).ok_or_else(invalid)?;

        let hour: u32 = captures[1].parse().map_err(|_| invalid())?;
        let minute = &captures[2];
        match captures.get(3) {
            Some(meridiem) if (1..=12).contains(&hour) => Ok(Self(format!(
                "{}:{} {}",
                hour,
                minute,
                meridiem.as_str().to_ascii_uppercase()
            ))),
            None if hour <= 23 => Ok(Self(format!("{}:{}", hour, minute))),
            _ => Err(invalid()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for TimeLabel {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        TimeLabel::parse(&value)
    }
}

impl From<TimeLabel> for String {
    fn from(label: TimeLabel) -> Self {
        label.0
    }
}

impl fmt::Display for TimeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Per-practitioner record of reserved labels, keyed by calendar date.
///
/// A date key is kept after its last label is released, so a fully released
/// day reads back as an empty set rather than disappearing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlotLedger(BTreeMap<NaiveDate, BTreeSet<TimeLabel>>);

impl SlotLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_booked(&self, date: NaiveDate, time: &TimeLabel) -> bool {
        self.0.get(&date).is_some_and(|slots| slots.contains(time))
    }

    /// Inserts the label. Returns `false` when it was already reserved.
    pub fn reserve(&mut self, date: NaiveDate, time: TimeLabel) -> bool {
        self.0.entry(date).or_default().insert(time)
    }

    /// Removes the label. Returns `false` when it was not present.
    pub fn release(&mut self, date: NaiveDate, time: &TimeLabel) -> bool {
        match self.0.get_mut(&date) {
            Some(slots) => slots.remove(time),
            None => false,
        }
    }

    pub fn slots_on(&self, date: NaiveDate) -> Vec<TimeLabel> {
        self.0
            .get(&date)
            .map(|slots| slots.iter().cloned().collect())
            .unwrap_or_default()
    }
}
