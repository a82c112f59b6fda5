/// Data layer: core types, loading, filtering and aggregation.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Dataset (header + string rows)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  <column><op><value> → rows kept in order
///   └──────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ aggregate  │  <column>=avg|min|max → one value
///   └───────────┘
/// ```

pub mod aggregate;
pub mod filter;
pub mod loader;
pub mod model;
