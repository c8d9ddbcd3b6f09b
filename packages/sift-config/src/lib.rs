mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Cache, Config, EmbeddingProviderConfig, Ingest, Postgres, Provider, Quota, Search, Service,
	Storage,
};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.http_bind must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.dsn.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.postgres.dsn must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.pool_max_conns == 0 {
		return Err(Error::Validation {
			message: "storage.postgres.pool_max_conns must be greater than zero.".to_string(),
		});
	}
	if cfg.quota.window_seconds <= 0 {
		return Err(Error::Validation {
			message: "quota.window_seconds must be greater than zero.".to_string(),
		});
	}
	if cfg.quota.max_requests <= 0 {
		return Err(Error::Validation {
			message: "quota.max_requests must be greater than zero.".to_string(),
		});
	}
	if cfg.search.default_top_k == 0 {
		return Err(Error::Validation {
			message: "search.default_top_k must be greater than zero.".to_string(),
		});
	}
	if !cfg.search.default_threshold.is_finite() {
		return Err(Error::Validation {
			message: "search.default_threshold must be a finite number.".to_string(),
		});
	}
	if cfg.search.retrieval_timeout_ms == 0 {
		return Err(Error::Validation {
			message: "search.retrieval_timeout_ms must be greater than zero.".to_string(),
		});
	}
	if cfg.search.semantic {
		if cfg.provider.embedding.dimensions == 0 {
			return Err(Error::Validation {
				message: "provider.embedding.dimensions must be greater than zero.".to_string(),
			});
		}
		if cfg.provider.embedding.api_key.trim().is_empty() {
			return Err(Error::Validation {
				message: "provider.embedding.api_key must be non-empty.".to_string(),
			});
		}
		if cfg.provider.embedding.timeout_ms == 0 {
			return Err(Error::Validation {
				message: "provider.embedding.timeout_ms must be greater than zero.".to_string(),
			});
		}
	}
	if cfg.cache.enabled {
		if cfg.cache.ttl_seconds <= 0 {
			return Err(Error::Validation {
				message: "cache.ttl_seconds must be greater than zero.".to_string(),
			});
		}
		if cfg.cache.path.as_os_str().is_empty() {
			return Err(Error::Validation {
				message: "cache.path must be non-empty.".to_string(),
			});
		}
	}
	if cfg.ingest.poll_interval_seconds == 0 {
		return Err(Error::Validation {
			message: "ingest.poll_interval_seconds must be greater than zero.".to_string(),
		});
	}
	if cfg.ingest.request_timeout_ms == 0 {
		return Err(Error::Validation {
			message: "ingest.request_timeout_ms must be greater than zero.".to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	cfg.ingest.sources.retain(|source| !source.trim().is_empty());

	for source in &mut cfg.ingest.sources {
		let trimmed = source.trim();

		if trimmed.len() != source.len() {
			*source = trimmed.to_string();
		}
	}
}
