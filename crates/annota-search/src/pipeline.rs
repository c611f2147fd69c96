//! Search orchestration: FTS first, ILIKE substring scan on failure.
//!
//! The ranking engine is tried exactly once. Any failure — and an empty FTS
//! result set, so partial-word queries still match — degrades to a
//! case-insensitive substring scan over title and description. If both
//! strategies fail, a single search-unavailable error is propagated; no
//! partial or stale results are returned.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};
use uuid::Uuid;

use annota_core::defaults::{SEARCH_PAGE_LIMIT, SEARCH_PAGE_LIMIT_MAX, SLOW_SEARCH_MS};
use annota_core::{
    Error, FtsQuery, Result, ScanQuery, SearchBackend, SearchHit, SearchMethod, SearchResponse,
};

use crate::query::{build_ts_query, detect_language, Language};

/// Search pipeline configuration.
///
/// `min_rank` is a required constructor argument: call sites historically
/// disagreed on a canonical threshold, so the value must be chosen
/// explicitly rather than defaulted.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Minimum FTS rank for a row to be included.
    pub min_rank: f32,
    /// Page size when the caller does not specify one.
    pub default_limit: i64,
    /// Hard cap on a single page.
    pub max_limit: i64,
    /// Wall-clock threshold above which a search is logged as slow.
    pub slow_query_ms: u64,
}

impl SearchConfig {
    pub fn new(min_rank: f32) -> Self {
        Self {
            min_rank,
            default_limit: SEARCH_PAGE_LIMIT,
            max_limit: SEARCH_PAGE_LIMIT_MAX,
            slow_query_ms: SLOW_SEARCH_MS,
        }
    }

    /// Create config from environment variables.
    ///
    /// | Variable | Required | Description |
    /// |----------|----------|-------------|
    /// | `SEARCH_MIN_RANK` | yes | Minimum FTS rank threshold |
    /// | `SEARCH_PAGE_LIMIT` | no | Default page size |
    /// | `SEARCH_SLOW_MS` | no | Slow-search log threshold |
    pub fn from_env() -> Result<Self> {
        let min_rank = std::env::var("SEARCH_MIN_RANK")
            .ok()
            .and_then(|v| v.parse::<f32>().ok())
            .ok_or_else(|| {
                Error::Config("SEARCH_MIN_RANK must be set (no canonical default)".to_string())
            })?;

        let mut config = Self::new(min_rank);
        if let Some(limit) = std::env::var("SEARCH_PAGE_LIMIT")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
        {
            config.default_limit = limit.clamp(1, config.max_limit);
        }
        if let Some(ms) = std::env::var("SEARCH_SLOW_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
        {
            config.slow_query_ms = ms;
        }
        Ok(config)
    }

    pub fn with_default_limit(mut self, limit: i64) -> Self {
        self.default_limit = limit;
        self
    }

    pub fn with_slow_query_ms(mut self, ms: u64) -> Self {
        self.slow_query_ms = ms;
        self
    }
}

/// Per-request search options.
#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    /// Query language; detected from the query script when absent.
    pub language: Option<Language>,
    /// Per-request override of the configured `min_rank`.
    pub min_rank: Option<f32>,
    /// Page size, capped at the configured maximum.
    pub limit: Option<i64>,
    pub offset: i64,
    /// Restrict results to notes carrying this tag.
    pub tag: Option<String>,
}

/// FTS-then-fallback search over an injected backend.
pub struct SearchPipeline {
    backend: Arc<dyn SearchBackend>,
    config: SearchConfig,
}

impl SearchPipeline {
    pub fn new(backend: Arc<dyn SearchBackend>, config: SearchConfig) -> Self {
        Self { backend, config }
    }

    /// Find notes matching `raw_query` for the given user.
    ///
    /// # Errors
    ///
    /// [`Error::Unauthorized`] when no user is in context (checked before
    /// any query is issued), [`Error::Validation`] for malformed queries,
    /// and [`Error::Search`] when both the ranking engine and the fallback
    /// scan fail.
    pub async fn search(
        &self,
        user_id: Option<Uuid>,
        raw_query: &str,
        opts: SearchOptions,
    ) -> Result<SearchResponse> {
        let Some(user_id) = user_id else {
            return Err(Error::Unauthorized(
                "search requires an authenticated user".to_string(),
            ));
        };

        let started = Instant::now();
        let ts_query = build_ts_query(raw_query)?;
        let language = opts.language.unwrap_or_else(|| detect_language(raw_query));
        let limit = opts
            .limit
            .unwrap_or(self.config.default_limit)
            .clamp(1, self.config.max_limit);
        let min_rank = opts.min_rank.unwrap_or(self.config.min_rank);

        let fts_query = FtsQuery {
            query: ts_query,
            language: language.fts_config().to_string(),
            min_rank,
            limit,
            offset: opts.offset,
            user_id,
        };

        // One FTS attempt, never two.
        match self.backend.fts(&fts_query).await {
            Ok(page) => {
                let total_reported = page.total;
                let hits = match &opts.tag {
                    Some(tag) => page
                        .hits
                        .into_iter()
                        .filter(|hit| hit.tags.iter().any(|t| t == tag))
                        .collect(),
                    None => page.hits,
                };

                if !hits.is_empty() {
                    let total = total_reported.unwrap_or(hits.len() as i64 + opts.offset);
                    return Ok(self.finish(started, hits, Some(total), SearchMethod::Fts, raw_query));
                }
                // Zero FTS rows: fall through to the substring scan so
                // partial-word queries still match.
                debug!(
                    subsystem = "search",
                    component = "pipeline",
                    op = "search",
                    "FTS returned no rows, trying substring scan"
                );
            }
            Err(e) => {
                warn!(
                    subsystem = "search",
                    component = "pipeline",
                    op = "search",
                    error = %e,
                    "FTS failed, falling back to substring scan"
                );
            }
        }

        let scan_query = ScanQuery {
            needle: sanitize_scan_needle(raw_query),
            tag: opts.tag.clone(),
            user_id,
            limit,
            offset: opts.offset,
        };

        match self.backend.scan(&scan_query).await {
            Ok(rows) => {
                let hits: Vec<SearchHit> =
                    rows.into_iter().map(SearchHit::from_fallback_note).collect();
                // The scan reports no count; a full page means more may
                // exist, so the total stays unknown.
                Ok(self.finish(started, hits, None, SearchMethod::Ilike, raw_query))
            }
            Err(e) => Err(Error::Search(format!("search unavailable: {e}"))),
        }
    }

    fn finish(
        &self,
        started: Instant,
        results: Vec<SearchHit>,
        total: Option<i64>,
        method: SearchMethod,
        raw_query: &str,
    ) -> SearchResponse {
        let execution_ms = started.elapsed().as_millis() as u64;

        if execution_ms > self.config.slow_query_ms {
            warn!(
                subsystem = "search",
                component = "pipeline",
                op = "search",
                query = raw_query,
                duration_ms = execution_ms,
                slow = true,
                "Slow search"
            );
        }
        info!(
            subsystem = "search",
            component = "pipeline",
            op = "search",
            method = ?method,
            result_count = results.len(),
            duration_ms = execution_ms,
            "Search completed"
        );

        SearchResponse {
            results,
            total,
            method,
            execution_ms,
        }
    }
}

/// Sanitize the raw query for interpolation into the substring filter.
///
/// Commas are the field separator in the OR-filter syntax and double quotes
/// delimit values; both are stripped so a crafted query cannot escape into
/// unrelated fields. LIKE wildcard escaping is the backend's job.
pub fn sanitize_scan_needle(raw_query: &str) -> String {
    raw_query
        .to_lowercase()
        .replace([',', '"'], "")
        .trim()
        .to_string()
}
