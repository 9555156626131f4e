//! The transient fixture table.
//!
//! [`FixtureTable::provision`] drops any leftover table, creates it and fills
//! it with [`FIXTURE_ROWS`] deterministic rows. The table is dropped exactly
//! once: by [`FixtureTable::teardown`], or by `Drop` when the scope is left
//! early (error return or panic).

use tracing::{debug, info, warn};
use udfparity_error::Result;
use udfparity_runtime::{SqlDialect, UdfRuntime};

/// Number of rows inserted by [`FixtureTable::provision`].
pub const FIXTURE_ROWS: i64 = 5;

/// One fixture row, generated from its 1-based index.
#[derive(Debug, Clone, PartialEq)]
pub struct FixtureRow {
    pub a: bool,
    pub b: bool,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub i: i64,
    pub j: i64,
    pub t: Vec<i64>,
    pub td: Vec<f64>,
    pub te: Vec<i64>,
}

impl FixtureRow {
    #[must_use]
    pub fn generate(index: i64) -> Self {
        let j = index * 10;
        Self {
            a: index % 3 == 0,
            b: index % 2 == 0,
            x: 0.7 + index as f64 / 10.0,
            y: index as f64 / 6.0,
            z: index as f64 + 1.23,
            i: index,
            j,
            t: (-index..=index).map(|k| j + k).collect(),
            td: (-index..=index).map(|k| (j + k) as f64).collect(),
            te: Vec::new(),
        }
    }
}

/// All fixture rows in insertion order.
#[must_use]
pub fn fixture_rows() -> Vec<FixtureRow> {
    (1..=FIXTURE_ROWS).map(FixtureRow::generate).collect()
}

#[must_use]
pub fn create_table_sql(table: &str, dialect: SqlDialect) -> String {
    let ints = dialect.int_array_type();
    let doubles = dialect.double_array_type();
    format!(
        "CREATE TABLE IF NOT EXISTS {table} (a BOOLEAN, b BOOLEAN, x DOUBLE, y DOUBLE, \
         z DOUBLE, i INT, j INT, t {ints}, td {doubles}, te {ints})"
    )
}

#[must_use]
pub fn drop_table_sql(table: &str) -> String {
    format!("DROP TABLE IF EXISTS {table}")
}

pub fn insert_row_sql(table: &str, dialect: SqlDialect, row: &FixtureRow) -> Result<String> {
    Ok(format!(
        "INSERT INTO {table} VALUES ({}, {}, {}, {}, {}, {}, {}, {}, {}, {})",
        dialect.bool_literal(row.a),
        dialect.bool_literal(row.b),
        dialect.double_literal(row.x),
        dialect.double_literal(row.y),
        dialect.double_literal(row.z),
        row.i,
        row.j,
        dialect.int_array_literal(&row.t)?,
        dialect.double_array_literal(&row.td)?,
        dialect.int_array_literal(&row.te)?,
    ))
}

/// Scoped ownership of the fixture table on a runtime session.
pub struct FixtureTable<'a, R: UdfRuntime + ?Sized> {
    runtime: &'a mut R,
    table: String,
    torn_down: bool,
}

impl<'a, R: UdfRuntime + ?Sized> FixtureTable<'a, R> {
    /// Create and populate `table`. A failed insert still drops the table.
    pub fn provision(runtime: &'a mut R, table: &str) -> Result<Self> {
        let dialect = runtime.dialect();
        runtime.sql_execute(&drop_table_sql(table))?;
        runtime.sql_execute(&create_table_sql(table, dialect))?;
        let mut fixture = Self {
            runtime,
            table: table.to_owned(),
            torn_down: false,
        };
        for row in fixture_rows() {
            let sql = insert_row_sql(table, dialect, &row)?;
            fixture.runtime.sql_execute(&sql)?;
        }
        info!(table, rows = FIXTURE_ROWS, dialect = dialect.as_str(), "fixture provisioned");
        Ok(fixture)
    }

    #[must_use]
    pub fn table_name(&self) -> &str {
        &self.table
    }

    /// The session the table lives on.
    pub fn runtime(&mut self) -> &mut R {
        self.runtime
    }

    /// Drop the table and report the outcome.
    pub fn teardown(mut self) -> Result<()> {
        self.drop_table()
    }

    fn drop_table(&mut self) -> Result<()> {
        if self.torn_down {
            return Ok(());
        }
        self.torn_down = true;
        self.runtime.sql_execute(&drop_table_sql(&self.table))?;
        debug!(table = %self.table, "fixture dropped");
        Ok(())
    }
}

impl<R: UdfRuntime + ?Sized> Drop for FixtureTable<'_, R> {
    fn drop(&mut self) {
        if let Err(err) = self.drop_table() {
            warn!(table = %self.table, error = %err, "fixture teardown failed");
        }
    }
}

impl<R: UdfRuntime + ?Sized> std::fmt::Debug for FixtureTable<'_, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FixtureTable")
            .field("table", &self.table)
            .field("torn_down", &self.torn_down)
            .finish_non_exhaustive()
    }
}
