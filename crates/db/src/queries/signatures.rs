// crates/db/src/queries/signatures.rs

use super::{non_negative, percent};
use crate::filter::WhereClause;
use crate::{Database, DbResult};
use trial_view_types::{MetricFilters, SignatureCompliance};

impl Database {
    /// PI signature compliance across the filtered subjects.
    ///
    /// The rate is signed CRFs over signed + overdue + never signed. Broken
    /// signatures are reported but do not enter the rate.
    pub async fn signature_compliance(
        &self,
        filters: &MetricFilters,
    ) -> DbResult<SignatureCompliance> {
        let clause = WhereClause::for_metrics(filters);
        let sql = format!(
            r#"
            SELECT
                COALESCE(SUM(m.crfs_signed), 0),
                COALESCE(SUM(m.crfs_overdue_within_45_days), 0),
                COALESCE(SUM(m.crfs_overdue_45_to_90_days), 0),
                COALESCE(SUM(m.crfs_overdue_beyond_90_days), 0),
                COALESCE(SUM(m.broken_signatures), 0),
                COALESCE(SUM(m.crfs_never_signed), 0)
            FROM subject_level_metrics m{}
            "#,
            clause.sql()
        );

        let row: (i64, i64, i64, i64, i64, i64) = clause
            .bind(sqlx::query_as(&sql))
            .fetch_one(self.pool())
            .await?;

        let signed = non_negative(row.0);
        let within_45 = non_negative(row.1);
        let within_90 = non_negative(row.2);
        let beyond_90 = non_negative(row.3);
        let never = non_negative(row.5);
        let expected = signed + within_45 + within_90 + beyond_90 + never;

        Ok(SignatureCompliance {
            crfs_signed: signed,
            overdue_within_45_days: within_45,
            overdue_45_to_90_days: within_90,
            overdue_beyond_90_days: beyond_90,
            broken_signatures: non_negative(row.4),
            never_signed: never,
            compliance_rate: percent(signed, expected),
        })
    }
}
