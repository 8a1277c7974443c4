use std::time::Instant;

use chrono::Utc;
use tracing::info;

/// Wraps a provider call with request/response timing events on the
/// `llm.timing` target, which the logging setup routes to its own file.
pub async fn log_llm_timing<T, F, Fut>(
    provider: &str,
    model: &str,
    operation: &str,
    call: F,
) -> Result<T, crate::error::WorkflowError>
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future<Output = Result<T, crate::error::WorkflowError>>,
{
    let started_at = Utc::now();
    let started_perf = Instant::now();
    info!(
        target: "llm.timing",
        "event=llm_request provider={} model={} operation={} started_at={}",
        provider,
        model,
        operation,
        started_at.to_rfc3339()
    );

    let result = call().await;
    let status = if result.is_ok() { "success" } else { "error" };

    let completed_at = Utc::now();
    let duration = started_perf.elapsed().as_secs_f64();
    info!(
        target: "llm.timing",
        "event=llm_response provider={} model={} operation={} completed_at={} duration_s={:.3} status={}",
        provider,
        model,
        operation,
        completed_at.to_rfc3339(),
        duration,
        status
    );

    result
}
