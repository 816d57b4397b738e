/// Data layer: feature libraries, loading, and tag queries.
///
/// Architecture:
/// ```text
///  .parquet / .json / .geojson / .csv
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → FeatureSet
///   └──────────┘
///        │
///        ▼
///   ┌────────────┐
///   │ FeatureSet │  Vec<Feature>, tag key index
///   └────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  tag query → start points / candidate peaks
///   └──────────┘
/// ```

pub mod filter;
pub mod loader;
pub mod model;
