//! AQI severity bands and their display colors.

use serde::Serialize;

/// Discrete AQI severity band.
///
/// Bands are ordered from best to worst air quality. `Unknown` covers
/// negative or missing AQI values and sorts last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AqiBand {
    /// 0-50.
    Good,
    /// 51-100.
    Satisfactory,
    /// 101-150.
    Moderate,
    /// 151-200.
    Poor,
    /// 201-250.
    VeryPoor,
    /// 251 and above.
    Severe,
    /// Negative or missing AQI.
    Unknown,
}

/// Every band, in legend order.
pub const ALL_BANDS: [AqiBand; 7] = [
    AqiBand::Good,
    AqiBand::Satisfactory,
    AqiBand::Moderate,
    AqiBand::Poor,
    AqiBand::VeryPoor,
    AqiBand::Severe,
    AqiBand::Unknown,
];

impl AqiBand {
    /// Classify an AQI value.
    ///
    /// Upper bounds are inclusive. Values above 400 stay `Severe`; negative
    /// values are `Unknown`.
    pub fn classify(aqi: i64) -> Self {
        match aqi {
            i64::MIN..=-1 => AqiBand::Unknown,
            0..=50 => AqiBand::Good,
            51..=100 => AqiBand::Satisfactory,
            101..=150 => AqiBand::Moderate,
            151..=200 => AqiBand::Poor,
            201..=250 => AqiBand::VeryPoor,
            _ => AqiBand::Severe,
        }
    }

    /// Classify a possibly missing AQI value.
    pub fn classify_reading(aqi: Option<i64>) -> Self {
        aqi.map_or(AqiBand::Unknown, Self::classify)
    }

    /// Hex display color.
    pub fn color(&self) -> &'static str {
        match self {
            AqiBand::Good => "#00B150",
            AqiBand::Satisfactory => "#96CD5D",
            AqiBand::Moderate => "#FFFF00",
            AqiBand::Poor => "#FFBF00",
            AqiBand::VeryPoor => "#FF0000",
            AqiBand::Severe => "#771A83",
            AqiBand::Unknown => "#9E9E9E",
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            AqiBand::Good => "Good",
            AqiBand::Satisfactory => "Satisfactory",
            AqiBand::Moderate => "Moderate",
            AqiBand::Poor => "Poor",
            AqiBand::VeryPoor => "Very Poor",
            AqiBand::Severe => "Severe",
            AqiBand::Unknown => "Unknown",
        }
    }

    /// Inclusive AQI range as `(min, max)`; `max` is `None` for open-ended bands.
    pub fn range(&self) -> Option<(i64, Option<i64>)> {
        match self {
            AqiBand::Good => Some((0, Some(50))),
            AqiBand::Satisfactory => Some((51, Some(100))),
            AqiBand::Moderate => Some((101, Some(150))),
            AqiBand::Poor => Some((151, Some(200))),
            AqiBand::VeryPoor => Some((201, Some(250))),
            AqiBand::Severe => Some((251, None)),
            AqiBand::Unknown => None,
        }
    }
}

/// A legend entry for the AQI color scale.
#[derive(Debug, Clone, Serialize)]
pub struct LegendEntry {
    pub band: AqiBand,
    pub label: &'static str,
    pub color: &'static str,
    pub min: Option<i64>,
    pub max: Option<i64>,
}

/// The full AQI legend shown next to the maps.
pub fn legend() -> Vec<LegendEntry> {
    ALL_BANDS
        .iter()
        .map(|band| {
            let (min, max) = match band.range() {
                Some((min, max)) => (Some(min), max),
                None => (None, None),
            };
            LegendEntry {
                band: *band,
                label: band.label(),
                color: band.color(),
                min,
                max,
            }
        })
        .collect()
}
