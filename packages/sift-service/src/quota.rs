//! Per-caller admission control over a sliding window.
//!
//! The read-modify-write against the quota record runs inside one
//! transaction with the row locked (`FOR UPDATE`), so two concurrent
//! admissions for the same caller cannot both observe the last free slot.
//! A denial commits without touching the record.

use sqlx::PgPool;
use time::{Duration, OffsetDateTime};

use sift_storage::{models::QuotaRecord, quota};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
	Allowed,
	Denied,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Decision {
	Create,
	Reset,
	Increment,
	Deny,
}

pub struct QuotaGuard {
	pool: PgPool,
	window_seconds: i64,
	max_requests: i64,
}
impl QuotaGuard {
	pub fn new(pool: PgPool, cfg: &sift_config::Quota) -> Self {
		Self { pool, window_seconds: cfg.window_seconds, max_requests: cfg.max_requests }
	}

	/// Admission fails closed: when the quota store is unreachable the
	/// request is treated as denied rather than waving it through.
	pub async fn admit(&self, caller_id: &str) -> Admission {
		match self.try_admit(caller_id).await {
			Ok(admission) => admission,
			Err(err) => {
				tracing::warn!(
					error = %err,
					caller_id,
					"Quota store unreachable. Admission fails closed."
				);

				Admission::Denied
			},
		}
	}

	async fn try_admit(&self, caller_id: &str) -> Result<Admission, sift_storage::Error> {
		let now = OffsetDateTime::now_utc();
		let mut tx = self.pool.begin().await.map_err(sift_storage::Error::from)?;
		let record = quota::fetch_for_update(&mut tx, caller_id).await?;
		let decision =
			decide(record.as_ref(), now, self.window_seconds, self.max_requests);

		match decision {
			Decision::Create => quota::insert_record(&mut tx, caller_id, now).await?,
			Decision::Reset => quota::reset_window(&mut tx, caller_id, now).await?,
			Decision::Increment => quota::increment_count(&mut tx, caller_id).await?,
			Decision::Deny => {},
		}

		tx.commit().await.map_err(sift_storage::Error::from)?;

		Ok(match decision {
			Decision::Deny => Admission::Denied,
			_ => Admission::Allowed,
		})
	}
}

fn decide(
	record: Option<&QuotaRecord>,
	now: OffsetDateTime,
	window_seconds: i64,
	max_requests: i64,
) -> Decision {
	let Some(record) = record else {
		return Decision::Create;
	};

	if now - record.window_start >= Duration::seconds(window_seconds) {
		return Decision::Reset;
	}
	if record.request_count >= max_requests {
		return Decision::Deny;
	}

	Decision::Increment
}
