/// Data layer: core types, ingestion, and feature construction.
///
/// Architecture:
/// ```text
///  .csv / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → RawTable (`--` → missing)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ features  │  drop identifier, append `sum` → FeatureMatrix
///   └──────────┘
/// ```

pub mod features;
pub mod loader;
pub mod model;
