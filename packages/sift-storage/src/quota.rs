//! Keyed quota record store: get-by-key, insert, and conditional updates.
//!
//! Callers compose these inside a single transaction; `fetch_for_update`
//! row-locks the record so concurrent admissions for the same caller
//! serialize at the store.

use sqlx::{Postgres, Transaction};
use time::OffsetDateTime;

use crate::{Result, models::QuotaRecord};

pub async fn fetch_for_update(
	tx: &mut Transaction<'_, Postgres>,
	caller_id: &str,
) -> Result<Option<QuotaRecord>> {
	let record = sqlx::query_as::<_, QuotaRecord>(
		"\
SELECT caller_id, request_count, window_start
FROM quota_records
WHERE caller_id = $1
FOR UPDATE",
	)
	.bind(caller_id)
	.fetch_optional(&mut **tx)
	.await?;

	Ok(record)
}

pub async fn insert_record(
	tx: &mut Transaction<'_, Postgres>,
	caller_id: &str,
	now: OffsetDateTime,
) -> Result<()> {
	sqlx::query(
		"INSERT INTO quota_records (caller_id, request_count, window_start) VALUES ($1, 1, $2)",
	)
	.bind(caller_id)
	.bind(now)
	.execute(&mut **tx)
	.await?;

	Ok(())
}

pub async fn reset_window(
	tx: &mut Transaction<'_, Postgres>,
	caller_id: &str,
	now: OffsetDateTime,
) -> Result<()> {
	sqlx::query("UPDATE quota_records SET request_count = 1, window_start = $1 WHERE caller_id = $2")
		.bind(now)
		.bind(caller_id)
		.execute(&mut **tx)
		.await?;

	Ok(())
}

pub async fn increment_count(tx: &mut Transaction<'_, Postgres>, caller_id: &str) -> Result<()> {
	sqlx::query("UPDATE quota_records SET request_count = request_count + 1 WHERE caller_id = $1")
		.bind(caller_id)
		.execute(&mut **tx)
		.await?;

	Ok(())
}
