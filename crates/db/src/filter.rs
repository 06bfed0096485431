// crates/db/src/filter.rs
//! The one place filter tuples become SQL predicates.
//!
//! Every query function filters through the `subject_level_metrics` row of
//! the subject (aliased `m`), so all five dimensions apply uniformly even to
//! tables that lack a region or study column of their own.

use sqlx::query::QueryAs;
use sqlx::sqlite::SqliteArguments;
use sqlx::Sqlite;
use trial_view_types::MetricFilters;

/// Alias every query uses for `subject_level_metrics`.
pub const METRICS_ALIAS: &str = "m";

/// A conjunctive `WHERE` clause plus its positional bind values.
///
/// Starts from ` WHERE 1=1` so fixed predicates can always be appended with
/// ` AND ...`. An unconstrained dimension contributes no predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WhereClause {
    sql: String,
    binds: Vec<String>,
}

impl WhereClause {
    /// Build the clause for `filters`, qualifying columns with `alias`.
    pub fn build(filters: &MetricFilters, alias: &str) -> Self {
        let mut clause = Self {
            sql: String::from(" WHERE 1=1"),
            binds: Vec::new(),
        };
        for (dim, value) in filters.constrained() {
            clause = clause.and_eq(&format!("{}.{}", alias, dim.column()), value);
        }
        clause
    }

    /// Shorthand for the `subject_level_metrics m` alias.
    pub fn for_metrics(filters: &MetricFilters) -> Self {
        Self::build(filters, METRICS_ALIAS)
    }

    /// Append `AND {column} = ?` with its bind value.
    pub fn and_eq(mut self, column: &str, value: &str) -> Self {
        self.sql.push_str(&format!(" AND {} = ?", column));
        self.binds.push(value.to_string());
        self
    }

    /// Append a fixed predicate that takes no parameters.
    pub fn and(mut self, predicate: &str) -> Self {
        self.sql.push_str(" AND ");
        self.sql.push_str(predicate);
        self
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn binds(&self) -> &[String] {
        &self.binds
    }

    /// Bind every value, in order, onto a prepared query.
    ///
    /// Must run before any bind for placeholders that appear after the clause
    /// (`LIMIT ?`, `OFFSET ?`).
    pub fn bind<'q, O>(
        &self,
        mut query: QueryAs<'q, Sqlite, O, SqliteArguments<'q>>,
    ) -> QueryAs<'q, Sqlite, O, SqliteArguments<'q>> {
        for value in &self.binds {
            query = query.bind(value.clone());
        }
        query
    }
}

/// Join a child table (aliased `child`) to its subject's metrics row.
pub fn join_metrics(child: &str) -> String {
    format!(
        " JOIN subject_level_metrics m ON m.project_name = {c}.project_name \
         AND m.site_id = {c}.site_id AND m.subject_id = {c}.subject_id",
        c = child
    )
}

/// Semi-join for tables whose site column is unreliable (SAE records).
///
/// Matches on study and subject only, as `WHERE EXISTS` so a child row
/// counts once even when its subject id has metrics rows at several sites.
/// Binds come from `clause`.
pub fn exists_metrics_by_subject(child: &str, clause: &WhereClause) -> String {
    format!(
        " WHERE EXISTS (SELECT 1 FROM subject_level_metrics m{where_sql} \
         AND m.project_name = {c}.project_name AND m.subject_id = {c}.subject_id)",
        where_sql = clause.sql(),
        c = child
    )
}
