//! Document ingestion loop.
//!
//! Sweeps the configured sources, extracts article text, and inserts each
//! article keyed by URL; the store's uniqueness constraint silently skips
//! anything already ingested. The worker runs as its own supervised
//! process, independent of the serving loop.

use std::time::Duration;

use regex::Regex;
use reqwest::Client;

use sift_storage::{db::Db, documents};

use crate::Result;

pub struct WorkerState {
	pub db: Db,
	pub ingest: sift_config::Ingest,
}

#[derive(Debug, PartialEq)]
struct Article {
	url: String,
	content: String,
}

struct Extractor {
	article: Regex,
	href: Regex,
	paragraph: Regex,
	tag: Regex,
}
impl Extractor {
	fn new() -> Result<Self> {
		Ok(Self {
			article: Regex::new(r"(?is)<article[^>]*>(.*?)</article>")?,
			href: Regex::new(r#"(?i)<a[^>]+href\s*=\s*["']([^"']+)["']"#)?,
			paragraph: Regex::new(r"(?is)<p[^>]*>(.*?)</p>")?,
			tag: Regex::new(r"<[^>]+>")?,
		})
	}

	fn extract(&self, source_url: &str, html: &str) -> Vec<Article> {
		let mut out = Vec::new();

		for block in self.article.captures_iter(html) {
			let body = &block[1];
			let Some(href) = self.href.captures(body).map(|captures| captures[1].to_string())
			else {
				continue;
			};
			let url = resolve_url(source_url, &href);
			let content = self.text_content(body);

			if content.is_empty() {
				continue;
			}

			out.push(Article { url, content });
		}

		out
	}

	fn text_content(&self, body: &str) -> String {
		let mut paragraphs = Vec::new();

		for captures in self.paragraph.captures_iter(body) {
			let stripped = self.tag.replace_all(&captures[1], " ");
			let collapsed = stripped.split_whitespace().collect::<Vec<_>>().join(" ");

			if !collapsed.is_empty() {
				paragraphs.push(collapsed);
			}
		}

		paragraphs.join("\n")
	}
}

fn resolve_url(source_url: &str, href: &str) -> String {
	if href.starts_with("http://") || href.starts_with("https://") {
		return href.to_string();
	}

	let base = source_url.trim_end_matches('/');

	if let Some(path) = href.strip_prefix('/') {
		// Absolute path: join against the origin, not the source page path.
		let origin_end = base
			.find("://")
			.map(|scheme_end| {
				base[scheme_end + 3..]
					.find('/')
					.map(|slash| scheme_end + 3 + slash)
					.unwrap_or(base.len())
			})
			.unwrap_or(base.len());

		return format!("{}/{path}", &base[..origin_end]);
	}

	format!("{base}/{href}")
}

pub async fn run_worker(state: WorkerState) -> Result<()> {
	let client = Client::builder()
		.timeout(Duration::from_millis(state.ingest.request_timeout_ms))
		.build()?;
	let extractor = Extractor::new()?;

	loop {
		for source in &state.ingest.sources {
			if let Err(err) = sweep_source(&state.db, &client, &extractor, source).await {
				tracing::error!(error = %err, source, "Source sweep failed.");
			}
		}

		tokio::time::sleep(Duration::from_secs(state.ingest.poll_interval_seconds)).await;
	}
}

async fn sweep_source(
	db: &Db,
	client: &Client,
	extractor: &Extractor,
	source: &str,
) -> Result<()> {
	let html = client.get(source).send().await?.error_for_status()?.text().await?;
	let articles = extractor.extract(source, &html);
	let mut inserted = 0_usize;

	for article in &articles {
		if documents::insert_document(db, &article.url, &article.content).await? {
			inserted += 1;
		}
	}

	tracing::info!(source, found = articles.len(), inserted, "Source sweep completed.");

	Ok(())
}
