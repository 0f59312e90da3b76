//! viewmerge - analytics view loading and cross-category merging.
//!
//! Loads analytics data from multiple named warehouse views via a query-based
//! engine, tags each result set with its source view, and merges app/web
//! category tables into one dataset with a consistent column layout.

pub mod config;
pub mod engine;
pub mod error;
pub mod loader;
pub mod logging;
pub mod table;

pub use config::WarehouseConfig;
pub use error::{Result, ViewmergeError};
pub use loader::{CategorySource, CombineOptions, Dialect, View, ViewLoader};
pub use table::{ColumnInfo, ResultTable, Row, Value};
