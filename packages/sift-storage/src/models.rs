use time::OffsetDateTime;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DocumentRow {
	pub id: i64,
	pub url: String,
	pub content: String,
}

/// One row per caller, created on the first admission check and mutated only
/// by subsequent admissions. Denied requests never touch it.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct QuotaRecord {
	pub caller_id: String,
	pub request_count: i64,
	pub window_start: OffsetDateTime,
}
