//! Cascading drill-down filters: state, then city, then station, then date.
//!
//! A level can only hold a value when every level before it does, and
//! changing a level clears everything after it. The selection is rebuilt from
//! request parameters on every render; nothing is persisted.

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::FilterError;
use crate::model::{LocationKey, SelectionQuery};

/// Date format used for selections and date options.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A drill-down level, in selection order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterLevel {
    State,
    City,
    Station,
    Date,
}

impl FilterLevel {
    pub const ALL: [FilterLevel; 4] = [
        FilterLevel::State,
        FilterLevel::City,
        FilterLevel::Station,
        FilterLevel::Date,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            FilterLevel::State => "state",
            FilterLevel::City => "city",
            FilterLevel::Station => "station",
            FilterLevel::Date => "date",
        }
    }
}

/// Current drill-down selection. `None` means unset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSelection {
    state: Option<String>,
    city: Option<String>,
    station: Option<String>,
    date: Option<NaiveDate>,
}

/// Turn a raw selector value into a selection.
///
/// Empty strings, whitespace and placeholders such as "Select City" or
/// "Select..." are unset. A single character is a real value, and so is a
/// name that merely starts with "select", like "Selectville".
pub fn normalize(raw: Option<&str>) -> Option<String> {
    let value = raw?.trim();
    if value.is_empty() || value == "--" || is_placeholder(value) {
        return None;
    }
    Some(value.to_string())
}

fn is_placeholder(value: &str) -> bool {
    let Some(prefix) = value.get(..6) else {
        return false;
    };
    prefix.eq_ignore_ascii_case("select")
        && !value[6..].chars().next().is_some_and(char::is_alphanumeric)
}

impl FilterSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a selection from request parameters.
    ///
    /// A value whose ancestor is unset is dropped rather than rejected, the
    /// same way a page re-render would leave that selector disabled.
    pub fn from_query(query: &SelectionQuery) -> Result<Self, FilterError> {
        let mut selection = Self::new();

        let Some(state) = normalize(query.state.as_deref()) else {
            return Ok(selection);
        };
        selection.set_state(state);

        let Some(city) = normalize(query.city.as_deref()) else {
            return Ok(selection);
        };
        selection.set_city(city)?;

        let Some(station) = normalize(query.station.as_deref()) else {
            return Ok(selection);
        };
        selection.set_station(station)?;

        if let Some(raw) = normalize(query.date.as_deref()) {
            let date = NaiveDate::parse_from_str(&raw, DATE_FORMAT)
                .map_err(|_| FilterError::InvalidDate(raw.clone()))?;
            selection.set_date(date)?;
        }

        Ok(selection)
    }

    pub fn state(&self) -> Option<&str> {
        self.state.as_deref()
    }

    pub fn city(&self) -> Option<&str> {
        self.city.as_deref()
    }

    pub fn station(&self) -> Option<&str> {
        self.station.as_deref()
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.date
    }

    /// Select a state. Always allowed; clears city, station and date.
    pub fn set_state(&mut self, state: impl Into<String>) {
        self.state = Some(state.into());
        self.truncate_to(FilterLevel::City);
    }

    /// Select a city within the selected state.
    pub fn set_city(&mut self, city: impl Into<String>) -> Result<(), FilterError> {
        self.require_ancestors(FilterLevel::City)?;
        self.city = Some(city.into());
        self.truncate_to(FilterLevel::Station);
        Ok(())
    }

    /// Select a station within the selected city.
    pub fn set_station(&mut self, station: impl Into<String>) -> Result<(), FilterError> {
        self.require_ancestors(FilterLevel::Station)?;
        self.station = Some(station.into());
        self.truncate_to(FilterLevel::Date);
        Ok(())
    }

    /// Select a date for the selected station.
    pub fn set_date(&mut self, date: NaiveDate) -> Result<(), FilterError> {
        self.require_ancestors(FilterLevel::Date)?;
        self.date = Some(date);
        Ok(())
    }

    /// Whether `level` holds a value.
    pub fn is_set(&self, level: FilterLevel) -> bool {
        match level {
            FilterLevel::State => self.state.is_some(),
            FilterLevel::City => self.city.is_some(),
            FilterLevel::Station => self.station.is_some(),
            FilterLevel::Date => self.date.is_some(),
        }
    }

    /// The selected value of `level`, rendered as the selector shows it.
    pub fn value(&self, level: FilterLevel) -> Option<String> {
        match level {
            FilterLevel::State => self.state.clone(),
            FilterLevel::City => self.city.clone(),
            FilterLevel::Station => self.station.clone(),
            FilterLevel::Date => self.date.map(|d| d.format(DATE_FORMAT).to_string()),
        }
    }

    /// The first unset level, or `None` once the whole chain is selected.
    pub fn next_level(&self) -> Option<FilterLevel> {
        FilterLevel::ALL
            .into_iter()
            .find(|level| !self.is_set(*level))
    }

    /// Clear `level` and every level after it.
    pub fn truncate_to(&mut self, level: FilterLevel) {
        if level <= FilterLevel::State {
            self.state = None;
        }
        if level <= FilterLevel::City {
            self.city = None;
        }
        if level <= FilterLevel::Station {
            self.station = None;
        }
        self.date = None;
    }

    /// The selected station, once state, city and station are all set.
    pub fn location(&self) -> Option<LocationKey> {
        Some(LocationKey {
            state: self.state.clone()?,
            city: self.city.clone()?,
            station: self.station.clone()?,
        })
    }

    /// Fails when any level before `level` is unset.
    pub fn require_ancestors(&self, level: FilterLevel) -> Result<(), FilterError> {
        let missing = FilterLevel::ALL
            .into_iter()
            .take_while(|l| *l < level)
            .find(|l| !self.is_set(*l));
        match missing {
            Some(missing) => Err(FilterError::AncestorUnset {
                level: level.name(),
                missing: missing.name(),
            }),
            None => Ok(()),
        }
    }
}
