use time::OffsetDateTime;

use sift_config::Postgres;
use sift_storage::{db::Db, documents, quota};
use sift_testkit::TestDatabase;

async fn bootstrap(test_db: &TestDatabase) -> Db {
	let cfg = Postgres { dsn: test_db.dsn().to_string(), pool_max_conns: 1 };
	let db = Db::connect(&cfg).await.expect("Failed to connect to Postgres.");

	db.ensure_schema().await.expect("Failed to ensure schema.");

	db
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set SIFT_PG_DSN to run."]
async fn db_connects_and_bootstraps() {
	let Some(base_dsn) = sift_testkit::env_dsn() else {
		eprintln!("Skipping db_connects_and_bootstraps; set SIFT_PG_DSN to run this test.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let db = bootstrap(&test_db).await;

	for table in ["documents", "quota_records"] {
		let count: i64 = sqlx::query_scalar(
			"SELECT count(*) FROM information_schema.tables WHERE table_name = $1",
		)
		.bind(table)
		.fetch_one(&db.pool)
		.await
		.expect("Failed to query schema tables.");

		assert_eq!(count, 1, "Expected table {table} to exist.");
	}

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set SIFT_PG_DSN to run."]
async fn duplicate_document_urls_are_skipped() {
	let Some(base_dsn) = sift_testkit::env_dsn() else {
		eprintln!("Skipping duplicate_document_urls_are_skipped; set SIFT_PG_DSN to run this test.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let db = bootstrap(&test_db).await;

	let inserted = documents::insert_document(&db, "https://news.example.com/a", "ai policy news")
		.await
		.expect("Failed to insert document.");

	assert!(inserted);

	let inserted = documents::insert_document(&db, "https://news.example.com/a", "other text")
		.await
		.expect("Failed to insert duplicate document.");

	assert!(!inserted);

	let count: i64 = sqlx::query_scalar("SELECT count(*) FROM documents")
		.fetch_one(&db.pool)
		.await
		.expect("Failed to count documents.");

	assert_eq!(count, 1);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set SIFT_PG_DSN to run."]
async fn full_text_search_returns_matches_and_tolerates_none() {
	let Some(base_dsn) = sift_testkit::env_dsn() else {
		eprintln!("Skipping full_text_search test; set SIFT_PG_DSN to run this test.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let db = bootstrap(&test_db).await;

	documents::insert_document(&db, "https://news.example.com/ai", "new ai policy announced")
		.await
		.expect("Failed to insert document.");
	documents::insert_document(&db, "https://news.example.com/sport", "football results today")
		.await
		.expect("Failed to insert document.");

	let matches = documents::search_documents(&db, "ai policy")
		.await
		.expect("Failed to search documents.");

	assert_eq!(matches.len(), 1);
	assert_eq!(matches[0].url, "https://news.example.com/ai");

	let empty = documents::search_documents(&db, "quantum chromodynamics")
		.await
		.expect("Failed to search documents.");

	assert!(empty.is_empty());

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set SIFT_PG_DSN to run."]
async fn quota_record_round_trips_through_conditional_updates() {
	let Some(base_dsn) = sift_testkit::env_dsn() else {
		eprintln!("Skipping quota_record test; set SIFT_PG_DSN to run this test.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let db = bootstrap(&test_db).await;
	let now = OffsetDateTime::now_utc();

	let mut tx = db.pool.begin().await.expect("Failed to begin transaction.");

	assert!(
		quota::fetch_for_update(&mut tx, "caller-1")
			.await
			.expect("Failed to fetch quota record.")
			.is_none()
	);

	quota::insert_record(&mut tx, "caller-1", now).await.expect("Failed to insert quota record.");
	quota::increment_count(&mut tx, "caller-1").await.expect("Failed to increment quota record.");

	let record = quota::fetch_for_update(&mut tx, "caller-1")
		.await
		.expect("Failed to fetch quota record.")
		.expect("Expected a quota record.");

	assert_eq!(record.request_count, 2);

	quota::reset_window(&mut tx, "caller-1", now).await.expect("Failed to reset quota window.");

	let record = quota::fetch_for_update(&mut tx, "caller-1")
		.await
		.expect("Failed to fetch quota record.")
		.expect("Expected a quota record.");

	assert_eq!(record.request_count, 1);

	tx.commit().await.expect("Failed to commit transaction.");

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}
