use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

/// A mountain range: centre, spread in degrees, and the height of its core.
struct Range {
    name: &'static str,
    lat: f64,
    lon: f64,
    spread: f64,
    top: f64,
}

const RANGES: [Range; 4] = [
    Range { name: "Krkonoše", lat: 50.73, lon: 15.65, spread: 0.15, top: 1600.0 },
    Range { name: "Šumava", lat: 48.95, lon: 13.60, spread: 0.35, top: 1450.0 },
    Range { name: "Beskydy", lat: 49.50, lon: 18.40, spread: 0.25, top: 1320.0 },
    Range { name: "Tatry", lat: 49.18, lon: 20.10, spread: 0.20, top: 2650.0 },
];

/// (name, English name, place, population, lat, lon)
const CITIES: [(&str, &str, &str, i64, f64, f64); 6] = [
    ("Praha", "Prague", "city", 1_357_326, 50.0875, 14.4213),
    ("Brno", "", "city", 396_101, 49.1951, 16.6068),
    ("Ostrava", "", "city", 284_765, 49.8347, 18.2820),
    ("Wien", "Vienna", "city", 1_982_097, 48.2083, 16.3731),
    ("Warszawa", "Warsaw", "city", 1_861_975, 52.2297, 21.0122),
    ("Černošín", "", "village", 1_049, 49.8162, 12.8826),
];

struct PeakRow {
    lat: f64,
    lon: f64,
    natural: &'static str,
    ele: i64,
    name: Option<String>,
    name_cs: Option<String>,
}

fn generate_peaks(rng: &mut SimpleRng) -> Vec<PeakRow> {
    let mut peaks = Vec::new();
    for range in &RANGES {
        for i in 0..60 {
            let lat = rng.gauss(range.lat, range.spread);
            let lon = rng.gauss(range.lon, range.spread * 1.5);
            // Height falls off with distance from the range core.
            let r2 = ((lat - range.lat).powi(2) + ((lon - range.lon) / 1.5).powi(2)) / range.spread.powi(2);
            let ele = (range.top * (-0.5 * r2).exp() + rng.gauss(0.0, 60.0)).max(200.0) as i64;
            let natural = if ele < 600 { "hill" } else { "peak" };
            // Roughly one in five summits has no name at all.
            let named = rng.next_f64() > 0.2;
            let name = named.then(|| format!("{} {}", range.name, i + 1));
            let name_cs = (named && rng.next_f64() > 0.5).then(|| format!("Vrchol {} {}", range.name, i + 1));
            peaks.push(PeakRow { lat, lon, natural, ele, name, name_cs });
        }
    }
    // Obvious data errors, placed near the cities.
    for (_, _, _, _, lat, lon) in CITIES.iter().take(3) {
        peaks.push(PeakRow {
            lat: lat + 0.02,
            lon: lon + 0.02,
            natural: "peak",
            ele: 9999,
            name: Some("Chybný údaj".to_string()),
            name_cs: None,
        });
    }
    peaks
}

fn write_parquet(path: &str, schema: Arc<Schema>, columns: Vec<ArrayRef>) -> Result<()> {
    let batch = RecordBatch::try_new(schema.clone(), columns).context("building record batch")?;
    let file = std::fs::File::create(path).with_context(|| format!("creating {path}"))?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);

    // Cities
    let city_schema = Arc::new(Schema::new(vec![
        Field::new("lat", DataType::Float64, false),
        Field::new("lon", DataType::Float64, false),
        Field::new("name", DataType::Utf8, false),
        Field::new("name:en", DataType::Utf8, true),
        Field::new("place", DataType::Utf8, false),
        Field::new("population", DataType::Int64, false),
    ]));
    let city_columns: Vec<ArrayRef> = vec![
        Arc::new(Float64Array::from_iter_values(CITIES.iter().map(|c| c.4))),
        Arc::new(Float64Array::from_iter_values(CITIES.iter().map(|c| c.5))),
        Arc::new(StringArray::from_iter_values(CITIES.iter().map(|c| c.0))),
        Arc::new(StringArray::from_iter(
            CITIES.iter().map(|c| Some(c.1).filter(|en| !en.is_empty())),
        )),
        Arc::new(StringArray::from_iter_values(CITIES.iter().map(|c| c.2))),
        Arc::new(Int64Array::from_iter_values(CITIES.iter().map(|c| c.3))),
    ];
    write_parquet("sample_cities.parquet", city_schema, city_columns)?;

    // Peaks
    let peaks = generate_peaks(&mut rng);
    let peak_schema = Arc::new(Schema::new(vec![
        Field::new("lat", DataType::Float64, false),
        Field::new("lon", DataType::Float64, false),
        Field::new("natural", DataType::Utf8, false),
        Field::new("ele", DataType::Int64, false),
        Field::new("name", DataType::Utf8, true),
        Field::new("name:cs", DataType::Utf8, true),
    ]));
    let peak_columns: Vec<ArrayRef> = vec![
        Arc::new(Float64Array::from_iter_values(peaks.iter().map(|p| p.lat))),
        Arc::new(Float64Array::from_iter_values(peaks.iter().map(|p| p.lon))),
        Arc::new(StringArray::from_iter_values(peaks.iter().map(|p| p.natural))),
        Arc::new(Int64Array::from_iter_values(peaks.iter().map(|p| p.ele))),
        Arc::new(StringArray::from_iter(peaks.iter().map(|p| p.name.as_deref()))),
        Arc::new(StringArray::from_iter(peaks.iter().map(|p| p.name_cs.as_deref()))),
    ];
    write_parquet("sample_peaks.parquet", peak_schema, peak_columns)?;

    println!(
        "Wrote {} places to sample_cities.parquet and {} peaks to sample_peaks.parquet",
        CITIES.len(),
        peaks.len()
    );
    Ok(())
}
