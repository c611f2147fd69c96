//! Pipeline degradation behavior against a scripted backend: FTS results
//! pass through, FTS failure degrades to the substring scan, and a double
//! failure surfaces a single search-unavailable error.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use annota_core::{
    Error, FtsPage, FtsQuery, Note, Result, ScanQuery, SearchBackend, SearchHit, SearchMethod,
};
use annota_search::{SearchConfig, SearchOptions, SearchPipeline};

fn note(title: &str, tags: &[&str]) -> Note {
    let now = Utc::now();
    Note {
        id: Uuid::new_v4(),
        title: title.to_string(),
        description: format!("<p>{title} body</p>"),
        tags: tags.iter().map(|t| t.to_string()).collect(),
        created_at: now,
        updated_at: now,
        user_id: Uuid::new_v4(),
    }
}

fn hit(title: &str, rank: f32, tags: &[&str]) -> SearchHit {
    let n = note(title, tags);
    SearchHit {
        id: n.id,
        title: n.title,
        description: n.description.clone(),
        tags: n.tags,
        created_at: n.created_at,
        updated_at: n.updated_at,
        user_id: n.user_id,
        rank,
        headline: n.description,
    }
}

/// Backend scripted per test: each strategy either fails, returns rows, or
/// returns nothing. Counts calls so the one-FTS-attempt contract is
/// checkable.
struct ScriptedBackend {
    fts_result: Result<FtsPage>,
    scan_result: Result<Vec<Note>>,
    fts_calls: AtomicUsize,
    scan_calls: AtomicUsize,
}

impl ScriptedBackend {
    fn new(fts_result: Result<FtsPage>, scan_result: Result<Vec<Note>>) -> Arc<Self> {
        Arc::new(Self {
            fts_result,
            scan_result,
            fts_calls: AtomicUsize::new(0),
            scan_calls: AtomicUsize::new(0),
        })
    }
}

fn clone_result<T: Clone>(r: &Result<T>) -> Result<T> {
    match r {
        Ok(v) => Ok(v.clone()),
        Err(e) => Err(Error::Internal(e.to_string())),
    }
}

#[async_trait]
impl SearchBackend for ScriptedBackend {
    async fn fts(&self, _query: &FtsQuery) -> Result<FtsPage> {
        self.fts_calls.fetch_add(1, Ordering::SeqCst);
        clone_result(&self.fts_result)
    }

    async fn scan(&self, _query: &ScanQuery) -> Result<Vec<Note>> {
        self.scan_calls.fetch_add(1, Ordering::SeqCst);
        clone_result(&self.scan_result)
    }
}

fn pipeline(backend: Arc<ScriptedBackend>) -> SearchPipeline {
    SearchPipeline::new(backend, SearchConfig::new(0.01))
}

#[tokio::test]
async fn fts_success_is_tagged_fts() {
    let backend = ScriptedBackend::new(
        Ok(FtsPage {
            hits: vec![hit("meeting notes", 0.7, &[])],
            total: Some(1),
        }),
        Ok(vec![]),
    );
    let response = pipeline(backend.clone())
        .search(Some(Uuid::new_v4()), "meeting", SearchOptions::default())
        .await
        .unwrap();

    assert_eq!(response.method, SearchMethod::Fts);
    assert_eq!(response.total, Some(1));
    assert_eq!(response.results.len(), 1);
    assert_eq!(backend.scan_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn fts_failure_degrades_to_ilike_without_raising() {
    let backend = ScriptedBackend::new(
        Err(Error::Internal("rpc exploded".to_string())),
        Ok(vec![note("grocery list", &[])]),
    );
    let response = pipeline(backend.clone())
        .search(Some(Uuid::new_v4()), "grocery", SearchOptions::default())
        .await
        .unwrap();

    assert_eq!(response.method, SearchMethod::Ilike);
    assert_eq!(response.results.len(), 1);
    assert_eq!(response.results[0].rank, 0.0);
    // No reliable count on the fallback path.
    assert_eq!(response.total, None);
    // One FTS attempt, never two.
    assert_eq!(backend.fts_calls.load(Ordering::SeqCst), 1);
    assert_eq!(backend.scan_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn empty_fts_falls_through_to_substring_scan() {
    let backend = ScriptedBackend::new(
        Ok(FtsPage {
            hits: vec![],
            total: Some(0),
        }),
        Ok(vec![note("partial match", &[])]),
    );
    let response = pipeline(backend)
        .search(Some(Uuid::new_v4()), "part", SearchOptions::default())
        .await
        .unwrap();

    assert_eq!(response.method, SearchMethod::Ilike);
    assert_eq!(response.results.len(), 1);
}

#[tokio::test]
async fn both_strategies_failing_raises_once() {
    let backend = ScriptedBackend::new(
        Err(Error::Internal("rpc down".to_string())),
        Err(Error::Internal("table down".to_string())),
    );
    let err = pipeline(backend)
        .search(Some(Uuid::new_v4()), "anything", SearchOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Search(_)));
}

#[tokio::test]
async fn missing_user_is_rejected_before_any_query() {
    let backend = ScriptedBackend::new(
        Ok(FtsPage {
            hits: vec![],
            total: None,
        }),
        Ok(vec![]),
    );
    let err = pipeline(backend.clone())
        .search(None, "anything", SearchOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Unauthorized(_)));
    assert_eq!(backend.fts_calls.load(Ordering::SeqCst), 0);
    assert_eq!(backend.scan_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn invalid_query_is_rejected_before_any_query() {
    let backend = ScriptedBackend::new(
        Ok(FtsPage {
            hits: vec![],
            total: None,
        }),
        Ok(vec![]),
    );
    let err = pipeline(backend.clone())
        .search(Some(Uuid::new_v4()), "ab", SearchOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Validation(_)));
    assert_eq!(backend.fts_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn tag_filter_applies_to_fts_results() {
    let backend = ScriptedBackend::new(
        Ok(FtsPage {
            hits: vec![
                hit("tagged", 0.9, &["work"]),
                hit("untagged", 0.8, &["personal"]),
            ],
            total: Some(2),
        }),
        Ok(vec![]),
    );
    let response = pipeline(backend)
        .search(
            Some(Uuid::new_v4()),
            "notes",
            SearchOptions {
                tag: Some("work".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(response.results.len(), 1);
    assert_eq!(response.results[0].title, "tagged");
}

#[tokio::test]
async fn fallback_headline_is_description_prefix() {
    let mut long = note("long note", &[]);
    long.description = "д".repeat(400);
    let backend = ScriptedBackend::new(
        Err(Error::Internal("rpc down".to_string())),
        Ok(vec![long]),
    );
    let response = pipeline(backend)
        .search(Some(Uuid::new_v4()), "note", SearchOptions::default())
        .await
        .unwrap();

    assert_eq!(response.results[0].headline.chars().count(), 200);
}
