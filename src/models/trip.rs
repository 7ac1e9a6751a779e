use std::{convert::Infallible, fmt, str::FromStr};

use chrono::{DateTime, FixedOffset};
use rust_decimal::{prelude::ToPrimitive, Decimal};
use serde::{Deserialize, Serialize};
use serde_with::{DeserializeFromStr, SerializeDisplay};

/// Header row of the exported sheet, one entry per [`TripRecord::cells`] column.
pub const COLUMN_HEADERS: [&str; 11] = [
    "Rit ID",
    "Datum Tijd Registratie",
    "Type",
    "Bestuurder ID",
    "Kilometerstand Begin",
    "Kilometerstand Eind",
    "Prijs",
    "Latitude Begin",
    "Longitude Begin",
    "Latitude Eind",
    "Longitude Eind",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripRecord {
    pub id: String,
    pub recorded_at: DateTime<FixedOffset>,
    #[serde(rename = "type")]
    pub trip_type: TripType,
    pub driver_id: Option<String>,
    pub odometer_start: Option<u64>,
    pub odometer_end: Option<u64>,
    pub price: Option<Decimal>,
    pub start_location: Option<GeoPoint>,
    pub end_location: Option<GeoPoint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, SerializeDisplay, DeserializeFromStr)]
pub enum TripType {
    Business,
    Private,
    Commute,
    /// A kind this service has no name for; the document's text is kept as is.
    Other(String),
}

impl TripType {
    pub fn as_str(&self) -> &str {
        match self {
            TripType::Business => "Zakelijk",
            TripType::Private => "Prive",
            TripType::Commute => "WoonWerk",
            TripType::Other(raw) => raw,
        }
    }
}

impl FromStr for TripType {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let kind = match trimmed.to_lowercase().as_str() {
            "zakelijk" => TripType::Business,
            "prive" | "privé" => TripType::Private,
            "woonwerk" | "woon-werk" => TripType::Commute,
            _ => TripType::Other(trimmed.to_string()),
        };
        Ok(kind)
    }
}

impl fmt::Display for TripType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single spreadsheet cell as produced for export.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Empty,
}

impl TripRecord {
    pub fn recorded_at_text(&self) -> String {
        self.recorded_at.to_rfc3339()
    }

    /// Row cells in [`COLUMN_HEADERS`] order.
    pub fn cells(&self) -> [CellValue; 11] {
        let text = |value: Option<&str>| {
            value
                .map(|v| CellValue::Text(v.to_string()))
                .unwrap_or(CellValue::Empty)
        };
        let number = |value: Option<f64>| value.map(CellValue::Number).unwrap_or(CellValue::Empty);

        [
            CellValue::Text(self.id.clone()),
            CellValue::Text(self.recorded_at_text()),
            CellValue::Text(self.trip_type.to_string()),
            text(self.driver_id.as_deref()),
            number(self.odometer_start.map(|km| km as f64)),
            number(self.odometer_end.map(|km| km as f64)),
            number(self.price.and_then(|p| p.to_f64())),
            number(self.start_location.map(|p| p.lat)),
            number(self.start_location.map(|p| p.lon)),
            number(self.end_location.map(|p| p.lat)),
            number(self.end_location.map(|p| p.lon)),
        ]
    }

    /// String form of every displayed field that has a value.
    pub fn display_fields(&self) -> Vec<String> {
        let mut fields = vec![
            self.id.clone(),
            self.recorded_at_text(),
            self.trip_type.to_string(),
        ];
        fields.extend(self.driver_id.clone());
        fields.extend(self.odometer_start.map(|km| km.to_string()));
        fields.extend(self.odometer_end.map(|km| km.to_string()));
        fields.extend(self.price.map(|p| p.to_string()));
        for point in [self.start_location, self.end_location].into_iter().flatten() {
            fields.push(point.lat.to_string());
            fields.push(point.lon.to_string());
        }
        fields
    }
}
