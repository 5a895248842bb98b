// Travel window derivation: duration and travel-date strings from departure and return dates

use crate::model::ItineraryData;
use chrono::{Days, NaiveDate};

const DATE_FORMAT: &str = "%d %b %Y";
const DAY_LABEL_FORMAT: &str = "%d %b";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TravelWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl TravelWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    // Parses ISO dates as produced by a date input (YYYY-MM-DD)
    pub fn parse(start: &str, end: &str) -> Result<Self, chrono::ParseError> {
        Ok(Self {
            start: NaiveDate::parse_from_str(start.trim(), "%Y-%m-%d")?,
            end: NaiveDate::parse_from_str(end.trim(), "%Y-%m-%d")?,
        })
    }

    // A return date before departure counts as zero nights
    pub fn nights(&self) -> i64 {
        (self.end - self.start).num_days().max(0)
    }

    /// `"4N / 5D"`
    pub fn duration(&self) -> String {
        let nights = self.nights();
        format!("{}N / {}D", nights, nights + 1)
    }

    /// `"24 Dec 2025 to 28 Dec 2025"`
    pub fn travel_dates(&self) -> String {
        format!(
            "{} to {}",
            self.start.format(DATE_FORMAT),
            self.end.format(DATE_FORMAT)
        )
    }

    pub fn apply_to(&self, itinerary: &mut ItineraryData) {
        itinerary.duration = self.duration();
        itinerary.travel_dates = self.travel_dates();
    }
}

pub fn clear_travel_window(itinerary: &mut ItineraryData) {
    itinerary.duration.clear();
    itinerary.travel_dates.clear();
}

pub fn date_for_day(start: NaiveDate, index: usize) -> Option<NaiveDate> {
    start.checked_add_days(Days::new(index as u64))
}

/// Label shown against a day in the plan.
///
/// A manually entered date wins, otherwise the date is counted from the departure;
/// without either the label is `"Day 01"` style.
pub fn day_label(index: usize, manual_date: Option<&str>, start: Option<NaiveDate>) -> String {
    let manual = manual_date
        .filter(|d| !d.trim().is_empty())
        .and_then(|d| NaiveDate::parse_from_str(d.trim(), "%Y-%m-%d").ok());

    match manual.or_else(|| start.and_then(|s| date_for_day(s, index))) {
        Some(date) => date.format(DAY_LABEL_FORMAT).to_string(),
        None => format!("Day {:02}", index + 1),
    }
}
