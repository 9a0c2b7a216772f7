//! Geographic transformation: state name resolution and per-attribute
//! choropleth dataset construction.

pub mod choropleth;
pub mod states;

pub use choropleth::{build_datasets, MapDataset, ValueRange};
pub use states::{abbreviation, full_name};
