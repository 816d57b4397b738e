use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{Array, AsArray};
use arrow::datatypes::{DataType, Float32Type, Float64Type, Int32Type, Int64Type};
use log::debug;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::{Map as JsonMap, Value as JsonValue};

use super::model::{Feature, FeatureSet, TagValue};
use crate::geodesy::GeoPoint;

/// Column / property names accepted for the coordinates.
const LAT_KEYS: [&str; 2] = ["lat", "latitude"];
const LON_KEYS: [&str; 3] = ["lon", "lng", "longitude"];

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load a feature library from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.parquet` – one row per point, `lat`/`lon` columns plus tag columns
/// * `.json`    – records `[{ "lat": .., "lon": .., ...tags }, ...]` or a
///   GeoJSON `FeatureCollection` of points
/// * `.csv`     – header row with `lat` and `lon`, other columns are tags
pub fn load_file(path: &Path) -> Result<FeatureSet> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let set = match ext.as_str() {
        "parquet" | "pq" => load_parquet(path),
        "json" | "geojson" => load_json(path),
        "csv" => load_csv(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
    .with_context(|| format!("loading {}", path.display()))?;

    debug!("{} features loaded from {}.", set.len(), path.display());
    Ok(set)
}

/// Load several libraries and concatenate them in the given order.
pub fn load_files(paths: &[PathBuf]) -> Result<FeatureSet> {
    let mut all = FeatureSet::default();
    for path in paths {
        all.extend(load_file(path)?);
    }
    Ok(all)
}

/// Reject coordinates that cannot be a place on Earth.
fn checked_location(lat: f64, lon: f64) -> Result<GeoPoint> {
    if !lat.is_finite() || lat.abs() > 90.0 {
        bail!("latitude {lat} is outside -90..=90");
    }
    if !lon.is_finite() || lon.abs() > 180.0 {
        bail!("longitude {lon} is outside -180..=180");
    }
    Ok(GeoPoint::new(lat, lon))
}

fn key_index(headers: &[String], candidates: &[&str]) -> Option<usize> {
    headers
        .iter()
        .position(|h| candidates.iter().any(|c| h.eq_ignore_ascii_case(c)))
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Two layouts are accepted. Records:
///
/// ```json
/// [
///   { "lat": 50.736, "lon": 15.740, "name": "Sněžka", "natural": "peak", "ele": 1603 },
///   ...
/// ]
/// ```
///
/// or a GeoJSON `FeatureCollection` whose point `properties` become tags.
fn load_json(path: &Path) -> Result<FeatureSet> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    match &root {
        JsonValue::Array(records) => load_json_records(records),
        JsonValue::Object(obj) if obj.get("type").and_then(|t| t.as_str()) == Some("FeatureCollection") => {
            load_geojson(obj)
        }
        _ => bail!("Expected a top-level JSON array or a GeoJSON FeatureCollection"),
    }
}

fn load_json_records(records: &[JsonValue]) -> Result<FeatureSet> {
    let mut features = Vec::with_capacity(records.len());

    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;

        let lat = json_coordinate(obj, &LAT_KEYS).with_context(|| format!("Row {i}: missing or invalid latitude"))?;
        let lon = json_coordinate(obj, &LON_KEYS).with_context(|| format!("Row {i}: missing or invalid longitude"))?;
        let location = checked_location(lat, lon).with_context(|| format!("Row {i}"))?;

        let tags: BTreeMap<String, TagValue> = obj
            .iter()
            .filter(|(key, _)| !LAT_KEYS.contains(&key.as_str()) && !LON_KEYS.contains(&key.as_str()))
            .map(|(key, val)| (key.clone(), json_to_tag(val)))
            .collect();

        features.push(Feature {
            location,
            tags,
        });
    }

    Ok(FeatureSet::from_features(features))
}

fn json_coordinate(obj: &JsonMap<String, JsonValue>, keys: &[&str]) -> Option<f64> {
    keys.iter().find_map(|k| obj.get(*k)).and_then(|v| v.as_f64())
}

fn load_geojson(collection: &JsonMap<String, JsonValue>) -> Result<FeatureSet> {
    let items = collection
        .get("features")
        .and_then(|f| f.as_array())
        .context("FeatureCollection without a 'features' array")?;

    let mut features = Vec::with_capacity(items.len());

    for (i, item) in items.iter().enumerate() {
        let geometry = item.get("geometry").filter(|g| !g.is_null());
        let kind = geometry.and_then(|g| g.get("type")).and_then(|t| t.as_str());
        if kind != Some("Point") {
            debug!("Skipping GeoJSON feature {i}: geometry {kind:?} is not a point.");
            continue;
        }
        let coords = geometry
            .and_then(|g| g.get("coordinates"))
            .and_then(|c| c.as_array())
            .with_context(|| format!("Feature {i}: missing coordinates"))?;
        let (lon, lat) = match (coords.first().and_then(|v| v.as_f64()), coords.get(1).and_then(|v| v.as_f64())) {
            (Some(lon), Some(lat)) => (lon, lat),
            _ => bail!("Feature {i}: coordinates are not [lon, lat] numbers"),
        };
        let location = checked_location(lat, lon).with_context(|| format!("Feature {i}"))?;

        let tags: BTreeMap<String, TagValue> = item
            .get("properties")
            .and_then(|p| p.as_object())
            .map(|props| {
                props
                    .iter()
                    .map(|(key, val)| (key.clone(), json_to_tag(val)))
                    .collect()
            })
            .unwrap_or_default();

        features.push(Feature {
            location,
            tags,
        });
    }

    Ok(FeatureSet::from_features(features))
}

fn json_to_tag(val: &JsonValue) -> TagValue {
    match val {
        JsonValue::String(s) => TagValue::String(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                TagValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                TagValue::Float(f)
            } else {
                TagValue::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => TagValue::Bool(*b),
        JsonValue::Null => TagValue::Null,
        other => TagValue::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout:  header row with column names, `lat` and `lon` in decimal
/// degrees.  All other columns are treated as tags.
fn load_csv(path: &Path) -> Result<FeatureSet> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let lat_idx = key_index(&headers, &LAT_KEYS).context("CSV missing 'lat' column")?;
    let lon_idx = key_index(&headers, &LON_KEYS).context("CSV missing 'lon' column")?;

    let mut features = Vec::new();

    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;

        let lat = parse_coordinate(record.get(lat_idx).unwrap_or(""), row_no, "lat")?;
        let lon = parse_coordinate(record.get(lon_idx).unwrap_or(""), row_no, "lon")?;
        let location = checked_location(lat, lon).with_context(|| format!("Row {row_no}"))?;

        let mut tags = BTreeMap::new();
        for (col_idx, value) in record.iter().enumerate() {
            if col_idx == lat_idx || col_idx == lon_idx {
                continue;
            }
            if let Some(col_name) = headers.get(col_idx) {
                tags.insert(col_name.clone(), guess_tag_type(value));
            }
        }

        features.push(Feature {
            location,
            tags,
        });
    }

    Ok(FeatureSet::from_features(features))
}

fn parse_coordinate(s: &str, row: usize, col: &str) -> Result<f64> {
    s.trim()
        .parse::<f64>()
        .with_context(|| format!("Row {row}, {col}: '{s}' is not a number"))
}

fn guess_tag_type(s: &str) -> TagValue {
    if s.is_empty() {
        return TagValue::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return TagValue::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        // "nan" / "inf" are more likely names than numbers
        if f.is_finite() {
            return TagValue::Float(f);
        }
    }
    if s == "true" || s == "false" {
        return TagValue::Bool(s == "true");
    }
    TagValue::String(s.to_string())
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet feature library.
///
/// Expected schema:
/// - `lat`, `lon`: Float64 or Float32 – decimal degrees
/// - Any other columns are tags (strings, ints, floats, bools)
fn load_parquet(path: &Path) -> Result<FeatureSet> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut features = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let schema = batch.schema();
        let names: Vec<String> = schema.fields().iter().map(|f| f.name().clone()).collect();

        let lat_idx = key_index(&names, &LAT_KEYS).context("Parquet file missing 'lat' column")?;
        let lon_idx = key_index(&names, &LON_KEYS).context("Parquet file missing 'lon' column")?;

        let lat_col = batch.column(lat_idx);
        let lon_col = batch.column(lon_idx);

        // Collect tag column indices (everything except the coordinates)
        let tag_cols: Vec<(usize, &String)> = names
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != lat_idx && *i != lon_idx)
            .collect();

        for row in 0..batch.num_rows() {
            let lat = extract_f64(lat_col, row).with_context(|| format!("Row {row}: failed to read 'lat'"))?;
            let lon = extract_f64(lon_col, row).with_context(|| format!("Row {row}: failed to read 'lon'"))?;
            let location = checked_location(lat, lon).with_context(|| format!("Row {row}"))?;

            let tags: BTreeMap<String, TagValue> = tag_cols
                .iter()
                .map(|(col_idx, col_name)| {
                    ((*col_name).clone(), extract_tag_value(batch.column(*col_idx), row))
                })
                .collect();

            features.push(Feature {
                location,
                tags,
            });
        }
    }

    Ok(FeatureSet::from_features(features))
}

// -- Parquet / Arrow helpers --

/// Read one coordinate from a Float64 or Float32 column.
fn extract_f64(col: &Arc<dyn Array>, row: usize) -> Result<f64> {
    if col.is_null(row) {
        bail!("null coordinate");
    }
    match col.data_type() {
        DataType::Float64 => Ok(col.as_primitive::<Float64Type>().value(row)),
        DataType::Float32 => Ok(col.as_primitive::<Float32Type>().value(row) as f64),
        other => bail!("Expected Float64 or Float32 column, got {other:?}"),
    }
}

/// Extract a single tag value from an Arrow column at a given row.
fn extract_tag_value(col: &Arc<dyn Array>, row: usize) -> TagValue {
    if col.is_null(row) {
        return TagValue::Null;
    }
    match col.data_type() {
        DataType::Utf8 => TagValue::String(col.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => TagValue::String(col.as_string::<i64>().value(row).to_string()),
        DataType::Int32 => TagValue::Integer(col.as_primitive::<Int32Type>().value(row) as i64),
        DataType::Int64 => TagValue::Integer(col.as_primitive::<Int64Type>().value(row)),
        DataType::Float32 => TagValue::Float(col.as_primitive::<Float32Type>().value(row) as f64),
        DataType::Float64 => TagValue::Float(col.as_primitive::<Float64Type>().value(row)),
        DataType::Boolean => TagValue::Bool(col.as_boolean().value(row)),
        other => TagValue::String(format!("{other:?}")),
    }
}
