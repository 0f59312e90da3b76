//! Query engine abstraction for viewmerge.
//!
//! Provides a trait-based interface for dispatching warehouse queries,
//! allowing different engine backends (and test doubles) to be used
//! interchangeably.

mod http;
mod mock;

pub use http::HttpQueryEngine;
pub use mock::{DispatchedQuery, FailingQueryEngine, MockQueryEngine};

use crate::config::WarehouseConfig;
use crate::error::Result;
use crate::table::ResultTable;
use async_trait::async_trait;

/// A single query dispatch to the warehouse.
///
/// The engine receives everything it needs per call: the rendered query text,
/// the destination project, the opaque credential, and the dialect string.
/// Dialect values other than `legacy` / `standard` are the engine's to accept
/// or reject.
#[derive(Debug, Clone, Copy)]
pub struct QueryRequest<'a> {
    /// Fully rendered query text.
    pub sql: &'a str,

    /// Destination project identifier.
    pub project_id: &'a str,

    /// Opaque credential material, passed along unchanged.
    pub credential: &'a str,

    /// Query dialect flag.
    pub dialect: &'a str,
}

/// Creates a query engine for the given warehouse configuration.
///
/// This is the central factory function for engine construction; the
/// configured endpoint override is honored when present.
pub fn connect(config: &WarehouseConfig) -> Result<Box<dyn QueryEngine>> {
    let engine = match config.endpoint.as_deref() {
        Some(endpoint) => HttpQueryEngine::with_endpoint(endpoint)?,
        None => HttpQueryEngine::new()?,
    };
    Ok(Box::new(engine))
}

/// Trait defining the interface for warehouse query engines.
///
/// Execution is synchronous from the caller's point of view: one query at a
/// time, awaited to completion. Failures are returned as-is; no retry or
/// partial-result handling happens behind this trait.
#[async_trait]
pub trait QueryEngine: Send + Sync {
    /// Executes a query and returns the resulting table.
    async fn run_query(&self, request: QueryRequest<'_>) -> Result<ResultTable>;
}
