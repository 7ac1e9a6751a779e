//! Turns an uploaded trip-log XML document into [`TripRecord`]s.
//!
//! Trips are `Rit` elements in the ritadministratie namespace, at any depth.
//! Each one carries its fields in a `Data` child; a `Rit` without `Data`
//! holds nothing we can show and is skipped.

use chrono::{DateTime, FixedOffset, NaiveDateTime};
use roxmltree::{Document, Node};
use rust_decimal::Decimal;
use tracing::debug;

use crate::{
    error::AppError,
    models::trip::{GeoPoint, TripRecord, TripType},
};

pub const TRIP_NAMESPACE: &str = "http://www.ritadministratie.org";
pub const TRIP_LOG_EXTENSION: &str = ".xml";

/// Upload precondition: the filename must declare an XML document.
pub fn ensure_trip_log_filename(filename: &str) -> Result<(), AppError> {
    if filename.to_lowercase().ends_with(TRIP_LOG_EXTENSION) {
        Ok(())
    } else {
        Err(AppError::Validation(
            "Alleen XML bestanden zijn toegestaan".into(),
        ))
    }
}

pub fn parse_trip_log(document: &[u8]) -> Result<Vec<TripRecord>, AppError> {
    let text = std::str::from_utf8(document)
        .map_err(|err| AppError::Parse(format!("Bestand is geen geldige UTF-8 tekst: {err}")))?;
    let doc = Document::parse(text)
        .map_err(|err| AppError::Parse(format!("XML parsing error: {err}")))?;

    let mut records = Vec::new();
    for (index, rit) in doc
        .descendants()
        .filter(|node| node.has_tag_name((TRIP_NAMESPACE, "Rit")))
        .enumerate()
    {
        let Some(data) = child(rit, "Data") else {
            debug!(position = index + 1, "skipping Rit without Data element");
            continue;
        };
        let record = parse_trip(data)
            .map_err(|reason| AppError::Parse(format!("Rit {}: {reason}", index + 1)))?;
        records.push(record);
    }

    debug!(count = records.len(), "parsed trip log");
    Ok(records)
}

fn parse_trip(data: Node<'_, '_>) -> Result<TripRecord, String> {
    let id = required_text(data, "RtVgNr")?.to_string();
    let recorded_at = parse_timestamp(required_text(data, "DatTdReg")?)?;
    let trip_type = required_text(data, "Type")?
        .parse::<TripType>()
        .unwrap_or_else(|never| match never {});
    let driver_id = child(data, "Bestuurder")
        .and_then(|driver| text_of(driver, "ChIdNr"))
        .map(str::to_string);

    let odometer_start = text_of(data, "KmStdBeg")
        .map(|raw| parse_odometer("KmStdBeg", raw))
        .transpose()?;
    let odometer_end = text_of(data, "KmStdEnd")
        .map(|raw| parse_odometer("KmStdEnd", raw))
        .transpose()?;
    if let (Some(start), Some(end)) = (odometer_start, odometer_end) {
        if end < start {
            return Err(format!(
                "kilometerstand eind ({end}) is lager dan begin ({start})"
            ));
        }
    }

    let price = text_of(data, "Prijs").map(parse_price).transpose()?;
    let start_location = parse_location(data, "LocBeg")?;
    let end_location = parse_location(data, "LocEnd")?;

    Ok(TripRecord {
        id,
        recorded_at,
        trip_type,
        driver_id,
        odometer_start,
        odometer_end,
        price,
        start_location,
        end_location,
    })
}

fn child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children()
        .find(|candidate| candidate.has_tag_name((TRIP_NAMESPACE, name)))
}

/// Trimmed text of a child element; empty text counts as absent.
fn text_of<'a>(node: Node<'a, '_>, name: &str) -> Option<&'a str> {
    child(node, name)
        .and_then(|element| element.text())
        .map(str::trim)
        .filter(|text| !text.is_empty())
}

fn required_text<'a>(node: Node<'a, '_>, name: &str) -> Result<&'a str, String> {
    text_of(node, name).ok_or_else(|| format!("verplicht veld {name} ontbreekt"))
}

fn parse_timestamp(raw: &str) -> Result<DateTime<FixedOffset>, String> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed);
    }
    if let Some(parsed) = ["%Y-%m-%dT%H:%M%:z", "%Y-%m-%d %H:%M%:z"]
        .iter()
        .find_map(|format| DateTime::parse_from_str(raw, format).ok())
    {
        return Ok(parsed);
    }
    // Offset-less registrations are read as UTC.
    [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ]
    .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| naive.and_utc().fixed_offset())
        .ok_or_else(|| format!("ongeldige datum/tijd in DatTdReg: {raw}"))
}

fn parse_odometer(name: &str, raw: &str) -> Result<u64, String> {
    raw.parse::<u64>()
        .map_err(|_| format!("ongeldige kilometerstand in {name}: {raw}"))
}

fn parse_price(raw: &str) -> Result<Decimal, String> {
    raw.replace(',', ".")
        .parse::<Decimal>()
        .map_err(|_| format!("ongeldige prijs: {raw}"))
}

fn parse_location(data: Node<'_, '_>, name: &str) -> Result<Option<GeoPoint>, String> {
    let Some(location) = child(data, name) else {
        return Ok(None);
    };
    match (text_of(location, "Lat"), text_of(location, "Lon")) {
        (None, None) => Ok(None),
        (Some(lat), Some(lon)) => {
            let lat = parse_coordinate(name, "Lat", lat, 90.0)?;
            let lon = parse_coordinate(name, "Lon", lon, 180.0)?;
            Ok(Some(GeoPoint { lat, lon }))
        }
        _ => Err(format!("{name} moet zowel Lat als Lon bevatten")),
    }
}

fn parse_coordinate(location: &str, axis: &str, raw: &str, limit: f64) -> Result<f64, String> {
    let value = raw
        .parse::<f64>()
        .map_err(|_| format!("ongeldige coördinaat {location}/{axis}: {raw}"))?;
    if !value.is_finite() || value.abs() > limit {
        return Err(format!("coördinaat {location}/{axis} buiten bereik: {raw}"));
    }
    Ok(value)
}
