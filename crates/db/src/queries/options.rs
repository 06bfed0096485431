// crates/db/src/queries/options.rs
// Distinct values for the filter dropdowns.

use crate::filter::WhereClause;
use crate::{Database, DbResult};
use trial_view_types::{FilterDimension, FilterOptions, MetricFilters};

impl Database {
    /// Distinct non-empty values of one dimension, ascending.
    ///
    /// Only the dimensions above `dim` constrain the list, so a selected site
    /// still shows its sibling sites.
    async fn unique_values(
        &self,
        dim: FilterDimension,
        filters: &MetricFilters,
    ) -> DbResult<Vec<String>> {
        let column = format!("m.{}", dim.column());
        let clause = WhereClause::for_metrics(&filters.scoped_above(dim))
            .and(&format!("{col} IS NOT NULL AND TRIM({col}) != ''", col = column));
        let sql = format!(
            "SELECT DISTINCT {col} FROM subject_level_metrics m{} ORDER BY {col} ASC",
            clause.sql(),
            col = column
        );

        let rows: Vec<(String,)> = clause
            .bind(sqlx::query_as(&sql))
            .fetch_all(self.pool())
            .await?;
        Ok(rows.into_iter().map(|(v,)| v).collect())
    }

    pub async fn unique_studies(&self, filters: &MetricFilters) -> DbResult<Vec<String>> {
        self.unique_values(FilterDimension::Study, filters).await
    }

    pub async fn unique_regions(&self, filters: &MetricFilters) -> DbResult<Vec<String>> {
        self.unique_values(FilterDimension::Region, filters).await
    }

    pub async fn unique_countries(&self, filters: &MetricFilters) -> DbResult<Vec<String>> {
        self.unique_values(FilterDimension::Country, filters).await
    }

    pub async fn unique_sites(&self, filters: &MetricFilters) -> DbResult<Vec<String>> {
        self.unique_values(FilterDimension::Site, filters).await
    }

    pub async fn unique_subjects(&self, filters: &MetricFilters) -> DbResult<Vec<String>> {
        self.unique_values(FilterDimension::Subject, filters).await
    }

    /// All five dropdown lists for the current tuple.
    pub async fn filter_options(&self, filters: &MetricFilters) -> DbResult<FilterOptions> {
        let (studies, regions, countries, sites, subjects) = tokio::try_join!(
            self.unique_studies(filters),
            self.unique_regions(filters),
            self.unique_countries(filters),
            self.unique_sites(filters),
            self.unique_subjects(filters),
        )?;
        Ok(FilterOptions {
            studies,
            regions,
            countries,
            sites,
            subjects,
        })
    }
}
