//! View loading and cross-category merging.
//!
//! This is the core of the crate: `ViewLoader::read_views` queries a sequence
//! of named views and unions the tagged results into one table, and
//! `ViewLoader::read_app_and_web_views` combines an app category and a web
//! category into a single normalized dataset.

use crate::config::WarehouseConfig;
use crate::engine::{QueryEngine, QueryRequest};
use crate::error::{Result, ViewmergeError};
use crate::table::{ResultTable, Value};
use chrono::NaiveDate;
use regex::Regex;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Device-type column: the app branch's tag column, and the constant column
/// injected into web rows.
const DEVICE_TYPE_COLUMN: &str = "device_type";

/// Region column: the web branch's tag column, and the app column the region
/// rewrites apply to.
const REGION_COLUMN: &str = "region";

/// App-version column injected into every web row.
const APP_VERSION_COLUMN: &str = "appVersion";

/// Constant device type injected into every web row.
const WEB_DEVICE_TYPE: &str = "web";

/// Constant app version injected into every web row.
const WEB_APP_VERSION: &str = "NA";

/// Region value rewrites applied to app results.
const REGION_REWRITES: [(&str, &str); 2] = [("South Africa", "ZA"), ("Nigeria", "NG")];

/// Query dialect accepted by the warehouse.
///
/// `Legacy` and `Standard` select the two known syntax variants and their
/// date-encoding rules; any other value is carried through to the engine
/// verbatim, whose acceptance or rejection of it is the engine's own
/// responsibility.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Dialect {
    /// Legacy SQL; dates are substituted as ISO `YYYY-MM-DD` strings.
    #[default]
    Legacy,
    /// Standard SQL; dates are substituted as 8-digit `YYYYMMDD` strings.
    Standard,
    /// An unrecognized dialect string, passed through unchanged.
    Other(String),
}

impl Dialect {
    /// Returns the dialect as the string handed to the engine.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Legacy => "legacy",
            Self::Standard => "standard",
            Self::Other(s) => s,
        }
    }

    /// Parses a dialect from a string. Unknown values become `Other`.
    pub fn parse(s: &str) -> Self {
        match s {
            "legacy" => Self::Legacy,
            "standard" => Self::Standard,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A named, queryable data view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct View {
    /// Label written into the tag column for every row this view produces.
    pub label: String,
    /// Identifier substituted into the query template.
    pub id: String,
}

impl View {
    /// Creates a view from a label and an identifier.
    pub fn new(label: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            id: id.into(),
        }
    }
}

/// One category's views and query template.
#[derive(Debug, Clone, Default)]
pub struct CategorySource {
    /// Views to query, in concatenation order.
    pub views: Vec<View>,
    /// Query template with three positional placeholders:
    /// view identifier, start date, end date.
    pub query: String,
}

impl CategorySource {
    /// Creates a category source from views and a query template.
    pub fn new(views: Vec<View>, query: impl Into<String>) -> Self {
        Self {
            views,
            query: query.into(),
        }
    }

    /// A category counts as defined only when both its views and its query
    /// are non-empty.
    fn is_defined(&self) -> bool {
        !self.views.is_empty() && !self.query.is_empty()
    }
}

/// Options for [`ViewLoader::read_app_and_web_views`].
#[derive(Debug, Clone)]
pub struct CombineOptions {
    /// Start of the reporting date range (inclusive).
    pub start_date: NaiveDate,
    /// End of the reporting date range (inclusive).
    pub end_date: NaiveDate,
    /// Query dialect for both categories.
    pub dialect: Dialect,
    /// Desired output column order. Defaults to the app table's columns when
    /// both categories are present.
    pub col_order: Option<Vec<String>>,
    /// App category views and query.
    pub app: Option<CategorySource>,
    /// Web category views and query.
    pub web: Option<CategorySource>,
}

impl CombineOptions {
    /// Creates options for the given date range with the legacy dialect and
    /// no categories defined.
    pub fn new(start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            start_date,
            end_date,
            dialect: Dialect::default(),
            col_order: None,
            app: None,
            web: None,
        }
    }

    /// Sets the dialect.
    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    /// Sets the output column order.
    pub fn with_col_order(mut self, col_order: Vec<String>) -> Self {
        self.col_order = Some(col_order);
        self
    }

    /// Sets the app category.
    pub fn with_app(mut self, app: CategorySource) -> Self {
        self.app = Some(app);
        self
    }

    /// Sets the web category.
    pub fn with_web(mut self, web: CategorySource) -> Self {
        self.web = Some(web);
        self
    }
}

/// Loads analytics views through a query engine and merges the results.
///
/// Holds the engine handle and the immutable warehouse configuration; each
/// call is independent and no state is kept between calls. Views are queried
/// strictly one at a time, in sequence order, and a failure on one view
/// prevents the remaining views from ever being queried.
pub struct ViewLoader {
    engine: Arc<dyn QueryEngine>,
    config: WarehouseConfig,
}

impl ViewLoader {
    /// Creates a loader from an engine handle and a warehouse config.
    pub fn new(engine: Arc<dyn QueryEngine>, config: WarehouseConfig) -> Self {
        Self { engine, config }
    }

    /// Creates a loader backed by the HTTP engine for the given config.
    pub fn connect(config: WarehouseConfig) -> Result<Self> {
        config.validate()?;
        let engine = crate::engine::connect(&config)?;
        Ok(Self {
            engine: Arc::from(engine),
            config,
        })
    }

    /// Returns the warehouse configuration this loader dispatches with.
    pub fn config(&self) -> &WarehouseConfig {
        &self.config
    }

    /// Queries every view in order and unions the tagged results.
    ///
    /// The template's three positional placeholders are filled with the view
    /// identifier, the start date, and the end date. Dates are rendered once
    /// per call: `YYYYMMDD` under the standard dialect, ISO `YYYY-MM-DD`
    /// otherwise. Every row of a view's result gets the view's label written
    /// into `tag_column`, and result tables are appended beneath each other
    /// in view order.
    ///
    /// Returns `Ok(None)` when `views` is empty: an explicit no-data signal
    /// rather than an empty table. Engine failures propagate immediately and
    /// abort the remaining views.
    pub async fn read_views(
        &self,
        query_template: &str,
        views: &[View],
        start_date: NaiveDate,
        end_date: NaiveDate,
        tag_column: &str,
        dialect: &Dialect,
    ) -> Result<Option<ResultTable>> {
        let start = format_date(start_date, dialect);
        let end = format_date(end_date, dialect);

        let mut data: Option<ResultTable> = None;
        for view in views {
            let sql = render_query(query_template, &view.id, &start, &end)?;
            debug!(view = %view.label, dialect = %dialect, "Querying view");

            let mut table = self
                .engine
                .run_query(QueryRequest {
                    sql: &sql,
                    project_id: &self.config.project_id,
                    credential: &self.config.private_key,
                    dialect: dialect.as_str(),
                })
                .await?;
            debug!(view = %view.label, rows = table.row_count(), "View query returned");

            table.set_column(tag_column, Value::from(view.label.as_str()));
            data = Some(match data {
                Some(accumulated) => accumulated.concat(table)?,
                None => table,
            });
        }
        Ok(data)
    }

    /// Combines an app category and a web category into one table.
    ///
    /// At least one category must be defined (non-empty views and query);
    /// otherwise an invalid-argument error is raised before any query is
    /// dispatched. The app branch tags rows by `device_type` and rewrites
    /// the `region` column (`South Africa` → `ZA`, `Nigeria` → `NG`); the
    /// app query's result must contain a `region` column. The web branch
    /// tags rows by `region` and injects constant `device_type = "web"` and
    /// `appVersion = "NA"` columns, overwriting them if already present.
    ///
    /// With both categories defined, app rows come first and columns follow
    /// `col_order`, defaulting to the app table's column sequence. Note that
    /// with a single category defined, that category's normalized table is
    /// returned as-is and `col_order` is ignored.
    pub async fn read_app_and_web_views(&self, options: &CombineOptions) -> Result<ResultTable> {
        let app = options.app.as_ref().filter(|c| c.is_defined());
        let web = options.web.as_ref().filter(|c| c.is_defined());

        if app.is_none() && web.is_none() {
            return Err(ViewmergeError::invalid_argument(
                "either app or web views and query must be defined",
            ));
        }

        let mut app_table = None;
        if let Some(source) = app {
            let mut table = self
                .read_views(
                    &source.query,
                    &source.views,
                    options.start_date,
                    options.end_date,
                    DEVICE_TYPE_COLUMN,
                    &options.dialect,
                )
                .await?
                .ok_or_else(|| ViewmergeError::internal("app views produced no result"))?;

            for (from, to) in REGION_REWRITES {
                table.replace_in_column(REGION_COLUMN, from, to)?;
            }
            debug!(rows = table.row_count(), "Loaded app category");
            app_table = Some(table);
        }

        let mut web_table = None;
        if let Some(source) = web {
            let mut table = self
                .read_views(
                    &source.query,
                    &source.views,
                    options.start_date,
                    options.end_date,
                    REGION_COLUMN,
                    &options.dialect,
                )
                .await?
                .ok_or_else(|| ViewmergeError::internal("web views produced no result"))?;

            table.set_column(DEVICE_TYPE_COLUMN, Value::from(WEB_DEVICE_TYPE));
            table.set_column(APP_VERSION_COLUMN, Value::from(WEB_APP_VERSION));
            debug!(rows = table.row_count(), "Loaded web category");
            web_table = Some(table);
        }

        match (app_table, web_table) {
            (Some(app), Some(web)) => {
                let default_order = app.column_names();
                let combined = app.concat(web)?;
                let order = options.col_order.clone().unwrap_or(default_order);
                combined.select_columns(&order)
            }
            (Some(app), None) => Ok(app),
            (None, Some(web)) => Ok(web),
            // At least one category was defined above, and a defined
            // category always yields a table.
            (None, None) => Err(ViewmergeError::internal("no category produced a table")),
        }
    }
}

/// Renders a date for substitution into a query template.
fn format_date(date: NaiveDate, dialect: &Dialect) -> String {
    match dialect {
        Dialect::Standard => date.format("%Y%m%d").to_string(),
        _ => date.format("%Y-%m-%d").to_string(),
    }
}

/// Substitutes the view identifier, start date, and end date into a query
/// template.
///
/// Placeholders are `{}` (filled sequentially) or `{0}` / `{1}` / `{2}`
/// (explicit argument index); `{{` and `}}` produce literal braces. A
/// placeholder indexing past the three arguments is an invalid-argument
/// error.
fn render_query(template: &str, view_id: &str, start: &str, end: &str) -> Result<String> {
    let args = [view_id, start, end];
    let pattern = Regex::new(r"\{\{|\}\}|\{(\d*)\}")
        .map_err(|e| ViewmergeError::internal(format!("placeholder pattern: {e}")))?;

    let mut out = String::with_capacity(template.len() + 32);
    let mut last = 0;
    let mut next_auto = 0usize;

    for found in pattern.find_iter(template) {
        out.push_str(&template[last..found.start()]);
        last = found.end();

        match found.as_str() {
            "{{" => out.push('{'),
            "}}" => out.push('}'),
            token => {
                let inner = &token[1..token.len() - 1];
                let index = if inner.is_empty() {
                    let current = next_auto;
                    next_auto += 1;
                    current
                } else {
                    inner.parse::<usize>().map_err(|_| {
                        ViewmergeError::invalid_argument(format!(
                            "query template placeholder {token} is not a valid index"
                        ))
                    })?
                };
                let value = args.get(index).ok_or_else(|| {
                    ViewmergeError::invalid_argument(format!(
                        "query template placeholder {token} is out of range \
                         (3 arguments available)"
                    ))
                })?;
                out.push_str(value);
            }
        }
    }
    out.push_str(&template[last..]);
    Ok(out)
}
