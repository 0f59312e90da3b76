//! Mock query engines for testing.
//!
//! Provides in-memory engine implementations that return canned tables and
//! record every dispatched query for assertions.

use super::{QueryEngine, QueryRequest};
use crate::error::{Result, ViewmergeError};
use crate::table::ResultTable;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

/// A query the mock engine has received, captured for assertions.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchedQuery {
    /// Rendered query text as received.
    pub sql: String,
    /// Destination project identifier.
    pub project_id: String,
    /// Dialect flag as received.
    pub dialect: String,
}

/// A mock query engine that returns queued results in order.
///
/// Each call to [`QueryEngine::run_query`] pops the next queued response;
/// running out of responses is an engine error.
#[derive(Default)]
pub struct MockQueryEngine {
    responses: Mutex<VecDeque<Result<ResultTable>>>,
    dispatched: Mutex<Vec<DispatchedQuery>>,
}

impl MockQueryEngine {
    /// Creates a new mock engine with no queued responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a mock engine preloaded with the given tables.
    pub fn with_tables(tables: Vec<ResultTable>) -> Self {
        let engine = Self::new();
        for table in tables {
            engine.push_table(table);
        }
        engine
    }

    /// Queues a table to be returned by the next unanswered query.
    pub fn push_table(&self, table: ResultTable) {
        self.responses
            .lock()
            .expect("mock response queue poisoned")
            .push_back(Ok(table));
    }

    /// Queues an error to be returned by the next unanswered query.
    pub fn push_error(&self, error: ViewmergeError) {
        self.responses
            .lock()
            .expect("mock response queue poisoned")
            .push_back(Err(error));
    }

    /// Returns every query dispatched so far, in order.
    pub fn dispatched(&self) -> Vec<DispatchedQuery> {
        self.dispatched
            .lock()
            .expect("mock dispatch log poisoned")
            .clone()
    }
}

#[async_trait]
impl QueryEngine for MockQueryEngine {
    async fn run_query(&self, request: QueryRequest<'_>) -> Result<ResultTable> {
        self.dispatched
            .lock()
            .expect("mock dispatch log poisoned")
            .push(DispatchedQuery {
                sql: request.sql.to_string(),
                project_id: request.project_id.to_string(),
                dialect: request.dialect.to_string(),
            });

        self.responses
            .lock()
            .expect("mock response queue poisoned")
            .pop_front()
            .unwrap_or_else(|| {
                Err(ViewmergeError::engine(format!(
                    "no queued response for query: {}",
                    request.sql
                )))
            })
    }
}

/// A query engine that fails every request with a fixed message.
pub struct FailingQueryEngine {
    message: String,
}

impl FailingQueryEngine {
    /// Creates a failing engine with the given error message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
impl QueryEngine for FailingQueryEngine {
    async fn run_query(&self, _request: QueryRequest<'_>) -> Result<ResultTable> {
        Err(ViewmergeError::engine(self.message.clone()))
    }
}
