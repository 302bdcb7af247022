use log::error;
use tokio_postgres::types::ToSql;

use crate::db::models::{ChainCirculation, StablecoinSnapshot};
use crate::db::postgres::PostgresClient;

/// Rows per multi-row INSERT
const BATCH_SIZE: usize = 500;

/// Sanitize a string for PostgreSQL by removing null bytes (0x00)
/// which are invalid in UTF-8 text columns
fn sanitize_string(s: &str) -> String {
    s.replace('\0', "")
}

fn sanitize_opt(s: &Option<String>) -> Option<String> {
    s.as_deref().map(sanitize_string)
}

/// Build `($1,...,$n), ($n+1,...)` for `rows` rows of `cols` columns.
fn values_placeholders(rows: usize, cols: usize) -> String {
    (0..rows)
        .map(|i| {
            let start = i * cols + 1;
            let placeholders: Vec<String> =
                (start..start + cols).map(|n| format!("${}", n)).collect();
            format!("({})", placeholders.join(", "))
        })
        .collect::<Vec<_>>()
        .join(", ")
}

impl PostgresClient {
    // ==================== STABLECOINS ====================

    /// Batch insert stablecoin snapshots. Re-inserting a fetch is a no-op.
    pub async fn insert_stablecoin_snapshots(
        &self,
        snapshots: &[StablecoinSnapshot],
    ) -> anyhow::Result<u64> {
        if snapshots.is_empty() {
            return Ok(0);
        }

        const COLS_PER_ROW: usize = 20;

        let client = self.pool.get().await?;
        let mut inserted = 0;

        for chunk in snapshots.chunks(BATCH_SIZE) {
            let query = format!(
                r#"
                INSERT INTO stables.stablecoins (
                    fetched_at, asset_id, name, symbol, gecko_id,
                    peg_type, peg_mechanism, price_source, price,
                    circulating, circulating_prev_day, circulating_prev_week, circulating_prev_month,
                    chains,
                    change_day, change_day_pct, change_week, change_week_pct,
                    change_month, change_month_pct
                ) VALUES {}
                ON CONFLICT (fetched_at, asset_id) DO NOTHING
                "#,
                values_placeholders(chunk.len(), COLS_PER_ROW)
            );

            let sanitized: Vec<(Option<String>, Option<String>)> = chunk
                .iter()
                .map(|s| (sanitize_opt(&s.name), sanitize_opt(&s.symbol)))
                .collect();

            let mut params: Vec<&(dyn ToSql + Sync)> =
                Vec::with_capacity(chunk.len() * COLS_PER_ROW);

            for (i, s) in chunk.iter().enumerate() {
                params.push(&s.fetched_at);
                params.push(&s.asset_id);
                params.push(&sanitized[i].0);
                params.push(&sanitized[i].1);
                params.push(&s.gecko_id);
                params.push(&s.peg_type);
                params.push(&s.peg_mechanism);
                params.push(&s.price_source);
                params.push(&s.price);
                params.push(&s.circulating);
                params.push(&s.circulating_prev_day);
                params.push(&s.circulating_prev_week);
                params.push(&s.circulating_prev_month);
                params.push(&s.chains);
                params.push(&s.change_day);
                params.push(&s.change_day_pct);
                params.push(&s.change_week);
                params.push(&s.change_week_pct);
                params.push(&s.change_month);
                params.push(&s.change_month_pct);
            }

            inserted += client.execute(&query, &params).await.map_err(|e| {
                error!(
                    "Failed to batch insert {} stablecoin snapshots: {:?}",
                    chunk.len(),
                    e
                );
                e
            })?;
        }

        Ok(inserted)
    }

    // ==================== CHAIN CIRCULATION ====================

    /// Batch insert per-chain circulation rows. Re-inserting a fetch is a no-op.
    pub async fn insert_chain_circulation(&self, rows: &[ChainCirculation]) -> anyhow::Result<u64> {
        if rows.is_empty() {
            return Ok(0);
        }

        const COLS_PER_ROW: usize = 15;

        let client = self.pool.get().await?;
        let mut inserted = 0;

        for chunk in rows.chunks(BATCH_SIZE) {
            let query = format!(
                r#"
                INSERT INTO stables.chain_circulation (
                    fetched_at, asset_id, chain, name, symbol,
                    circulating, circulating_prev_day, circulating_prev_week, circulating_prev_month,
                    change_day, change_day_pct, change_week, change_week_pct,
                    change_month, change_month_pct
                ) VALUES {}
                ON CONFLICT (fetched_at, asset_id, chain) DO NOTHING
                "#,
                values_placeholders(chunk.len(), COLS_PER_ROW)
            );

            let sanitized: Vec<(String, Option<String>, Option<String>)> = chunk
                .iter()
                .map(|r| {
                    (
                        sanitize_string(&r.chain),
                        sanitize_opt(&r.name),
                        sanitize_opt(&r.symbol),
                    )
                })
                .collect();

            let mut params: Vec<&(dyn ToSql + Sync)> =
                Vec::with_capacity(chunk.len() * COLS_PER_ROW);

            for (i, r) in chunk.iter().enumerate() {
                params.push(&r.fetched_at);
                params.push(&r.asset_id);
                params.push(&sanitized[i].0);
                params.push(&sanitized[i].1);
                params.push(&sanitized[i].2);
                params.push(&r.circulating);
                params.push(&r.circulating_prev_day);
                params.push(&r.circulating_prev_week);
                params.push(&r.circulating_prev_month);
                params.push(&r.change_day);
                params.push(&r.change_day_pct);
                params.push(&r.change_week);
                params.push(&r.change_week_pct);
                params.push(&r.change_month);
                params.push(&r.change_month_pct);
            }

            inserted += client.execute(&query, &params).await.map_err(|e| {
                error!(
                    "Failed to batch insert {} chain circulation rows: {:?}",
                    chunk.len(),
                    e
                );
                e
            })?;
        }

        Ok(inserted)
    }

    // ==================== CRON CHECKPOINTS ====================

    /// Get last run timestamp for a cron job
    pub async fn get_cron_checkpoint(
        &self,
        job_name: &str,
    ) -> anyhow::Result<Option<time::OffsetDateTime>> {
        let client = self.pool.get().await?;
        let query = "SELECT last_run_at FROM stables.cron_checkpoints WHERE job_name = $1";

        let row = client.query_opt(query, &[&job_name]).await?;

        if let Some(row) = row {
            // Convert from chrono::DateTime<Utc> (postgres) to time::OffsetDateTime (application)
            let last_run_at: Option<chrono::DateTime<chrono::Utc>> = row.get("last_run_at");

            if let Some(last_run) = last_run_at {
                return Ok(Some(crate::utils::chrono_to_offset(last_run)?));
            }
        }

        Ok(None)
    }

    /// Set last run timestamp for a cron job
    pub async fn set_cron_checkpoint(
        &self,
        job_name: &str,
        last_run_at: time::OffsetDateTime,
    ) -> anyhow::Result<()> {
        let client = self.pool.get().await?;
        let query = r#"
            INSERT INTO stables.cron_checkpoints (job_name, last_run_at, updated_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (job_name) DO UPDATE SET
                last_run_at = EXCLUDED.last_run_at,
                updated_at = NOW()
        "#;

        let last_run_chrono = crate::utils::offset_to_chrono(last_run_at);

        client
            .execute(query, &[&job_name, &last_run_chrono])
            .await
            .map_err(|e| {
                error!(
                    "Failed to update checkpoint for cron job {}: {:?}",
                    job_name, e
                );
                e
            })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_values_placeholders() {
        assert_eq!(values_placeholders(1, 3), "($1, $2, $3)");
        assert_eq!(values_placeholders(2, 2), "($1, $2), ($3, $4)");
        assert_eq!(values_placeholders(0, 4), "");
    }

    #[test]
    fn test_sanitize_string() {
        assert_eq!(sanitize_string("US\0DT"), "USDT");
        assert_eq!(sanitize_opt(&Some("a\0b".to_string())), Some("ab".to_string()));
        assert_eq!(sanitize_opt(&None), None);
    }
}
