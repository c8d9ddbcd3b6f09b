use std::sync::{
	Arc,
	atomic::{AtomicUsize, Ordering},
};

use serde_json::Map;

use sift_config::{
	Cache, Config, EmbeddingProviderConfig, Ingest, Postgres, Provider, Quota, Search, Service,
	Storage,
};
use sift_service::{
	BoxFuture, EmbeddingProvider, Providers, ResultCache, SearchRequest, SearchService,
	ServiceError,
};
use sift_storage::{db::Db, documents};
use sift_testkit::{ScratchFile, TestDatabase};

/// Deterministic stand-in for the embedding endpoint: a byte histogram of
/// the input text, so identical texts agree and unrelated texts diverge.
struct SpyEmbedding {
	calls: Arc<AtomicUsize>,
}
impl SpyEmbedding {
	fn new() -> Self {
		Self { calls: Arc::new(AtomicUsize::new(0)) }
	}

	fn count(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}
}
impl EmbeddingProvider for SpyEmbedding {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, sift_providers::Result<Vec<Vec<f32>>>> {
		self.calls.fetch_add(1, Ordering::SeqCst);

		let dim = (cfg.dimensions as usize).max(1);
		let vectors: Vec<Vec<f32>> = texts
			.iter()
			.map(|text| {
				let mut vec = vec![0.0_f32; dim];

				for byte in text.bytes() {
					vec[byte as usize % dim] += 1.0;
				}

				vec
			})
			.collect();

		Box::pin(async move { Ok(vectors) })
	}
}

fn test_config(dsn: String, cache_path: &ScratchFile, max_requests: i64) -> Config {
	Config {
		service: Service { http_bind: "127.0.0.1:0".to_string(), log_level: "info".to_string() },
		storage: Storage { postgres: Postgres { dsn, pool_max_conns: 2 } },
		provider: Provider {
			embedding: EmbeddingProviderConfig {
				provider_id: "test".to_string(),
				api_base: "http://127.0.0.1:1".to_string(),
				api_key: "test-key".to_string(),
				path: "/".to_string(),
				model: "test".to_string(),
				dimensions: 8,
				timeout_ms: 1_000,
				default_headers: Map::new(),
			},
		},
		quota: Quota { window_seconds: 60, max_requests },
		search: Search {
			default_top_k: 10,
			default_threshold: 0.5,
			semantic: true,
			retrieval_timeout_ms: 1_000,
		},
		cache: Cache {
			enabled: true,
			path: cache_path.path().to_path_buf(),
			ttl_seconds: 3_600,
		},
		ingest: Ingest {
			sources: Vec::new(),
			poll_interval_seconds: 3_600,
			request_timeout_ms: 1_000,
		},
	}
}

async fn test_service(
	test_db: &TestDatabase,
	cache_path: &ScratchFile,
	max_requests: i64,
) -> (SearchService, Arc<SpyEmbedding>) {
	let cfg = test_config(test_db.dsn().to_string(), cache_path, max_requests);
	let db = Db::connect(&cfg.storage.postgres).await.expect("Failed to connect to Postgres.");

	db.ensure_schema().await.expect("Failed to ensure schema.");

	let cache = ResultCache::load(&cfg.cache);
	let spy = Arc::new(SpyEmbedding::new());
	let providers = Providers::new(spy.clone());
	let service = SearchService::with_providers(cfg, db, cache, providers);

	(service, spy)
}

fn request(caller_id: &str, query: &str, top_k: Option<u32>) -> SearchRequest {
	SearchRequest {
		caller_id: caller_id.to_string(),
		query: query.to_string(),
		top_k,
		threshold: None,
	}
}

async fn seed_documents(service: &SearchService, count: usize) {
	for index in 0..count {
		let url = format!("https://news.example.com/ai-{index}");
		let content = format!("ai policy article number {index} covering regulation topics");

		documents::insert_document(&service.db, &url, &content)
			.await
			.expect("Failed to seed document.");
	}
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set SIFT_PG_DSN to run."]
async fn quota_admits_five_then_denies_without_mutation() {
	let Some(base_dsn) = sift_testkit::env_dsn() else {
		eprintln!("Skipping quota test; set SIFT_PG_DSN to run this test.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let scratch = ScratchFile::new("sift_service_cache");
	let (service, _spy) = test_service(&test_db, &scratch, 5).await;

	seed_documents(&service, 2).await;

	for attempt in 0..5 {
		let result = service.search(request("caller-a", "ai policy", None)).await;

		assert!(result.is_ok(), "Expected admission {attempt} to succeed: {result:?}");
	}

	let denied = service.search(request("caller-a", "ai policy", None)).await;

	assert!(matches!(denied, Err(ServiceError::QuotaDenied)), "Expected denial: {denied:?}");

	let (count, _): (i64, time::OffsetDateTime) =
		sqlx::query_as("SELECT request_count, window_start FROM quota_records WHERE caller_id = $1")
			.bind("caller-a")
			.fetch_one(&service.db.pool)
			.await
			.expect("Failed to read quota record.");

	assert_eq!(count, 5, "A denied admission must not change request_count.");

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set SIFT_PG_DSN to run."]
async fn identical_requests_within_ttl_compute_once() {
	let Some(base_dsn) = sift_testkit::env_dsn() else {
		eprintln!("Skipping cache idempotence test; set SIFT_PG_DSN to run this test.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let scratch = ScratchFile::new("sift_service_cache");
	let (service, spy) = test_service(&test_db, &scratch, 100).await;

	seed_documents(&service, 3).await;

	let first = service
		.search(request("caller-b", "ai policy", Some(5)))
		.await
		.expect("Expected first search to succeed.");
	let second = service
		.search(request("caller-b", "ai policy", Some(5)))
		.await
		.expect("Expected second search to succeed.");

	assert_eq!(first, second);
	assert_eq!(spy.count(), 1, "Only the first request may trigger scoring.");

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set SIFT_PG_DSN to run."]
async fn query_matching_nothing_returns_empty_results() {
	let Some(base_dsn) = sift_testkit::env_dsn() else {
		eprintln!("Skipping empty candidate test; set SIFT_PG_DSN to run this test.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let scratch = ScratchFile::new("sift_service_cache");
	let (service, _spy) = test_service(&test_db, &scratch, 100).await;

	seed_documents(&service, 2).await;

	let results = service
		.search(request("caller-c", "quantum chromodynamics", None))
		.await
		.expect("Expected search with no matches to succeed.");

	assert!(results.is_empty());

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set SIFT_PG_DSN to run."]
async fn results_are_truncated_to_top_k() {
	let Some(base_dsn) = sift_testkit::env_dsn() else {
		eprintln!("Skipping truncation test; set SIFT_PG_DSN to run this test.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let scratch = ScratchFile::new("sift_service_cache");
	let (service, _spy) = test_service(&test_db, &scratch, 100).await;

	seed_documents(&service, 10).await;

	let results = service
		.search(request("caller-d", "ai policy", Some(3)))
		.await
		.expect("Expected search to succeed.");

	assert_eq!(results.len(), 3);

	for pair in results.windows(2) {
		assert!(pair[0].score >= pair[1].score, "Results must be ordered by score.");
	}

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set SIFT_PG_DSN to run."]
async fn validation_failures_consume_no_quota_and_no_cache() {
	let Some(base_dsn) = sift_testkit::env_dsn() else {
		eprintln!("Skipping validation test; set SIFT_PG_DSN to run this test.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let scratch = ScratchFile::new("sift_service_cache");
	let (service, spy) = test_service(&test_db, &scratch, 100).await;

	let missing_caller = service.search(request("", "ai policy", None)).await;

	assert!(matches!(missing_caller, Err(ServiceError::InvalidRequest { .. })));

	let missing_query = service.search(request("caller-e", "   ", None)).await;

	assert!(matches!(missing_query, Err(ServiceError::InvalidRequest { .. })));

	let quota_rows: i64 = sqlx::query_scalar("SELECT count(*) FROM quota_records")
		.fetch_one(&service.db.pool)
		.await
		.expect("Failed to count quota records.");

	assert_eq!(quota_rows, 0, "Validation failures must not touch the quota store.");
	assert_eq!(spy.count(), 0);
	assert!(!scratch.path().exists(), "Validation failures must not write the cache.");

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}
