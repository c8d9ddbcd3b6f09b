use crate::{Result, db::Db, models::DocumentRow};

/// Full-text search over document contents, best match first. A query that
/// matches nothing returns an empty vec.
pub async fn search_documents(db: &Db, query: &str) -> Result<Vec<DocumentRow>> {
	let rows = sqlx::query_as::<_, DocumentRow>(
		"\
SELECT id, url, content
FROM documents
WHERE to_tsvector('english', content) @@ plainto_tsquery('english', $1)
ORDER BY ts_rank(to_tsvector('english', content), plainto_tsquery('english', $1)) DESC, id ASC",
	)
	.bind(query)
	.fetch_all(&db.pool)
	.await?;

	Ok(rows)
}

/// Inserts a crawled document. Returns false when the URL is already stored;
/// duplicates are skipped silently, not treated as errors.
pub async fn insert_document(db: &Db, url: &str, content: &str) -> Result<bool> {
	let result = sqlx::query(
		"INSERT INTO documents (url, content) VALUES ($1, $2) ON CONFLICT (url) DO NOTHING",
	)
	.bind(url)
	.bind(content)
	.execute(&db.pool)
	.await?;

	Ok(result.rows_affected() > 0)
}
