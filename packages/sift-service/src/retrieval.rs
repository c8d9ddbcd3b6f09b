use std::time::Duration;

use sift_storage::{db::Db, documents, models::DocumentRow};

use crate::{ServiceError, ServiceResult};

/// Fetches the unranked candidate set for a query from the document store.
/// No matches is a normal outcome, not an error; the call is bounded by
/// `timeout_ms` so a stalled store cannot hold the request open.
pub async fn retrieve(db: &Db, query: &str, timeout_ms: u64) -> ServiceResult<Vec<DocumentRow>> {
	let search = documents::search_documents(db, query);

	match tokio::time::timeout(Duration::from_millis(timeout_ms), search).await {
		Ok(result) => Ok(result?),
		Err(_) => Err(ServiceError::Storage {
			message: format!("Document retrieval timed out after {timeout_ms} ms."),
		}),
	}
}
