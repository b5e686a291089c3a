//! Runs many independent queries through a [`GrantSpider`] with bounded
//! concurrency and summarises the outcome.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use grantspider_agents::{Citation, GrantCategory, Language};
use grantspider_core::Value;

use crate::settings::BatchSettings;
use crate::{GrantSpider, TurnResult};

#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error("batch {0} has no queries")]
    NoQueries(String),
    #[error("max_workers must be at least 1")]
    NoWorkers,
    #[error("batch worker pool closed")]
    PoolClosed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchStatus {
    Running,
    Completed,
    Failed,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BatchQuery {
    pub id: String,
    pub query: String,
    /// 1 is the highest priority, 3 the lowest.
    pub priority: u8,
    pub metadata: BTreeMap<String, Value>,
}

impl BatchQuery {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            query: query.into(),
            priority: 1,
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = priority.clamp(1, 3);
        self
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct BatchRequest {
    pub id: String,
    pub name: String,
    pub description: String,
    pub queries: Vec<BatchQuery>,
    pub max_workers: usize,
    #[serde(serialize_with = "seconds")]
    pub timeout_per_query: Duration,
    pub generate_report: bool,
    pub created_at: DateTime<Utc>,
}

impl BatchRequest {
    pub fn from_queries<I, Q>(name: impl Into<String>, queries: I) -> Self
    where
        I: IntoIterator<Item = Q>,
        Q: Into<String>,
    {
        let defaults = BatchSettings::default();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            description: String::new(),
            queries: queries.into_iter().map(BatchQuery::new).collect(),
            max_workers: defaults.max_workers,
            timeout_per_query: Duration::from_secs(defaults.timeout_per_query_secs),
            generate_report: true,
            created_at: Utc::now(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_settings(mut self, settings: &BatchSettings) -> Self {
        self.max_workers = settings.max_workers;
        self.timeout_per_query = Duration::from_secs(settings.timeout_per_query_secs);
        self
    }

    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_per_query = timeout;
        self
    }

    pub fn with_report(mut self, generate_report: bool) -> Self {
        self.generate_report = generate_report;
        self
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct QueryResult {
    pub query_id: String,
    pub query: String,
    pub status: BatchStatus,
    pub response: String,
    pub sources: Vec<Citation>,
    pub processing_time_ms: u64,
    pub error_message: Option<String>,
    pub detected_language: Option<Language>,
    pub document_count: usize,
    pub grant_categories: Vec<GrantCategory>,
}

impl QueryResult {
    fn completed(query: BatchQuery, turn: TurnResult, processing_time_ms: u64) -> Self {
        let grant_categories = turn
            .cross_document_analysis
            .as_ref()
            .map(|analysis| analysis.grant_groups.keys().copied().collect())
            .unwrap_or_default();
        Self {
            query_id: query.id,
            query: query.query,
            status: BatchStatus::Completed,
            response: turn.cited_response,
            sources: turn.sources,
            processing_time_ms,
            error_message: None,
            detected_language: Some(turn.detected_language),
            document_count: turn.retrieved_documents.len(),
            grant_categories,
        }
    }

    fn failed(query: BatchQuery, message: String, processing_time_ms: u64) -> Self {
        Self {
            query_id: query.id,
            query: query.query,
            status: BatchStatus::Failed,
            response: String::new(),
            sources: Vec::new(),
            processing_time_ms,
            error_message: Some(message),
            detected_language: None,
            document_count: 0,
            grant_categories: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ComplexityDistribution {
    pub simple: usize,
    pub medium: usize,
    pub complex: usize,
}

impl ComplexityDistribution {
    fn record(&mut self, query: &str) {
        match query.split_whitespace().count() {
            0..=4 => self.simple += 1,
            5..=14 => self.medium += 1,
            _ => self.complex += 1,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SummaryStats {
    /// Percentage of queries that completed, 0 to 100.
    pub success_rate: f64,
    pub average_processing_time_ms: f64,
    pub total_sources: usize,
    pub average_sources_per_query: f64,
    pub language_distribution: BTreeMap<String, usize>,
    pub grant_categories: BTreeSet<GrantCategory>,
    pub complexity: ComplexityDistribution,
    pub total_documents: usize,
}

impl SummaryStats {
    pub fn from_results(results: &[QueryResult], total_queries: usize) -> Self {
        if results.is_empty() {
            return Self::default();
        }

        let successful = results
            .iter()
            .filter(|result| result.status == BatchStatus::Completed)
            .count();
        let timed: Vec<u64> = results
            .iter()
            .map(|result| result.processing_time_ms)
            .filter(|ms| *ms > 0)
            .collect();
        let total_sources: usize = results.iter().map(|result| result.sources.len()).sum();

        let mut language_distribution = BTreeMap::new();
        let mut complexity = ComplexityDistribution::default();
        for result in results {
            let language = result
                .detected_language
                .map_or("unknown", |language| language.as_str());
            *language_distribution
                .entry(language.to_string())
                .or_insert(0) += 1;
            complexity.record(&result.query);
        }

        Self {
            success_rate: successful as f64 / total_queries.max(1) as f64 * 100.0,
            average_processing_time_ms: if timed.is_empty() {
                0.0
            } else {
                timed.iter().sum::<u64>() as f64 / timed.len() as f64
            },
            total_sources,
            average_sources_per_query: total_sources as f64 / results.len() as f64,
            language_distribution,
            grant_categories: results
                .iter()
                .flat_map(|result| result.grant_categories.iter().copied())
                .collect(),
            complexity,
            total_documents: results.iter().map(|result| result.document_count).sum(),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct BatchResult {
    pub request_id: String,
    pub status: BatchStatus,
    pub total_queries: usize,
    pub successful_queries: usize,
    pub failed_queries: usize,
    pub results: Vec<QueryResult>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub summary: SummaryStats,
    pub report_path: Option<PathBuf>,
}

#[derive(Serialize)]
struct BatchReport<'a> {
    batch_request: &'a BatchRequest,
    batch_result: &'a BatchResult,
    generated_at: DateTime<Utc>,
}

#[derive(Default)]
struct JobRegistry {
    active: HashMap<String, BatchStatus>,
    history: Vec<BatchResult>,
}

/// Batch jobs over a shared [`GrantSpider`]. Every query gets its own
/// session, so queries never see each other's history.
#[derive(Clone)]
pub struct BatchProcessor {
    spider: GrantSpider,
    output_dir: Option<PathBuf>,
    jobs: Arc<RwLock<JobRegistry>>,
}

impl BatchProcessor {
    pub fn new(spider: GrantSpider) -> Self {
        Self {
            spider,
            output_dir: None,
            jobs: Arc::default(),
        }
    }

    /// Reports are only written when an output directory is set.
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    pub fn job_status(&self, request_id: &str) -> Option<BatchStatus> {
        let jobs = self.jobs.read().unwrap_or_else(PoisonError::into_inner);
        jobs.active.get(request_id).copied().or_else(|| {
            jobs.history
                .iter()
                .rev()
                .find(|result| result.request_id == request_id)
                .map(|result| result.status)
        })
    }

    pub fn job_history(&self) -> Vec<BatchResult> {
        self.jobs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .history
            .clone()
    }

    pub async fn process(&self, request: &BatchRequest) -> Result<BatchResult, BatchError> {
        if request.queries.is_empty() {
            return Err(BatchError::NoQueries(request.id.clone()));
        }
        if request.max_workers == 0 {
            return Err(BatchError::NoWorkers);
        }

        let started_at = Utc::now();
        self.set_active(&request.id, Some(BatchStatus::Running));
        tracing::info!(
            batch = %request.id,
            name = %request.name,
            queries = request.queries.len(),
            workers = request.max_workers,
            "batch started"
        );

        let mut queries = request.queries.clone();
        queries.sort_by_key(|query| query.priority);

        let workers = Arc::new(Semaphore::new(request.max_workers));
        let mut tasks = JoinSet::new();
        for (index, query) in queries.into_iter().enumerate() {
            let permit = match workers.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    self.set_active(&request.id, None);
                    return Err(BatchError::PoolClosed);
                }
            };
            let spider = self.spider.clone();
            let session_id = format!("batch-{}-{}", request.id, query.id);
            let limit = request.timeout_per_query;
            tasks.spawn(async move {
                let result = run_query(&spider, query, &session_id, limit).await;
                drop(permit);
                (index, result)
            });
        }

        let mut results = Vec::with_capacity(request.queries.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(entry) => results.push(entry),
                Err(error) => tracing::error!(batch = %request.id, %error, "batch worker panicked"),
            }
        }
        results.sort_by_key(|(index, _)| *index);
        let results: Vec<QueryResult> = results.into_iter().map(|(_, result)| result).collect();

        let total_queries = request.queries.len();
        let successful_queries = results
            .iter()
            .filter(|result| result.status == BatchStatus::Completed)
            .count();
        let summary = SummaryStats::from_results(&results, total_queries);
        let mut result = BatchResult {
            request_id: request.id.clone(),
            status: BatchStatus::Completed,
            total_queries,
            successful_queries,
            failed_queries: total_queries - successful_queries,
            results,
            started_at,
            completed_at: Some(Utc::now()),
            summary,
            report_path: None,
        };

        if request.generate_report {
            if let Some(dir) = &self.output_dir {
                match write_report(dir, request, &result).await {
                    Ok(path) => result.report_path = Some(path),
                    Err(error) => {
                        tracing::warn!(batch = %request.id, %error, "failed to write batch report")
                    }
                }
            }
        }

        tracing::info!(
            batch = %request.id,
            successful = result.successful_queries,
            failed = result.failed_queries,
            "batch completed"
        );
        {
            let mut jobs = self.jobs.write().unwrap_or_else(PoisonError::into_inner);
            jobs.active.remove(&request.id);
            jobs.history.push(result.clone());
        }
        Ok(result)
    }

    fn set_active(&self, request_id: &str, status: Option<BatchStatus>) {
        let mut jobs = self.jobs.write().unwrap_or_else(PoisonError::into_inner);
        match status {
            Some(status) => jobs.active.insert(request_id.to_string(), status),
            None => jobs.active.remove(request_id),
        };
    }
}

async fn run_query(
    spider: &GrantSpider,
    query: BatchQuery,
    session_id: &str,
    limit: Duration,
) -> QueryResult {
    let started = Instant::now();
    let outcome = tokio::time::timeout(limit, spider.run(&query.query, session_id)).await;
    let elapsed = started.elapsed().as_millis() as u64;
    match outcome {
        Ok(Ok(turn)) => QueryResult::completed(query, turn, elapsed),
        Ok(Err(error)) => {
            tracing::warn!(query = %query.id, %error, "batch query failed");
            QueryResult::failed(query, error.to_string(), elapsed)
        }
        Err(_) => {
            tracing::warn!(query = %query.id, "batch query timed out");
            let message = format!("query timed out after {:.1}s", limit.as_secs_f64());
            QueryResult::failed(query, message, elapsed)
        }
    }
}

/// `batch_report_<first 8 chars of id>_<YYYYmmdd_HHMMSS>.json`
pub fn report_file_name(request_id: &str, at: DateTime<Utc>) -> String {
    let short: String = request_id.chars().take(8).collect();
    format!("batch_report_{short}_{}.json", at.format("%Y%m%d_%H%M%S"))
}

async fn write_report(
    dir: &Path,
    request: &BatchRequest,
    result: &BatchResult,
) -> std::io::Result<PathBuf> {
    let generated_at = Utc::now();
    let report = BatchReport {
        batch_request: request,
        batch_result: result,
        generated_at,
    };
    let body = serde_json::to_vec_pretty(&report)?;
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(report_file_name(&request.id, generated_at));
    tokio::fs::write(&path, body).await?;
    tracing::info!(report = %path.display(), "batch report written");
    Ok(path)
}

fn seconds<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(duration.as_secs_f64())
}
