//! Build trigger/waiter: fires a downstream workflow and polls until the run
//! reports completion.
//!
//! By default the wait is unbounded, matching the historical behaviour of
//! the publish flow; `max_workflow_wait_secs` opts into a deadline, and the
//! caller-supplied cancellation token aborts the loop without reporting a
//! result.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::contract::{HostError, RepoHost};
use crate::settings::PublisherSettings;

#[derive(Debug)]
pub enum WorkflowError {
    Host(HostError),
    /// The configured maximum wait elapsed before the run completed.
    TimedOut,
    /// The caller cancelled the wait; no result is reported.
    Cancelled,
}

impl From<HostError> for WorkflowError {
    fn from(e: HostError) -> Self {
        match e {
            HostError::Cancelled => WorkflowError::Cancelled,
            other => WorkflowError::Host(other),
        }
    }
}

/// Dispatch the configured workflow on "main" and block until a run with the
/// workflow's name reports "completed". No-op when no workflow is configured.
pub async fn trigger_and_wait<H>(
    host: &H,
    settings: &PublisherSettings,
    cancel: &CancellationToken,
) -> Result<(), WorkflowError>
where
    H: RepoHost + ?Sized,
{
    let workflow = settings.workflow_name.trim();
    if workflow.is_empty() {
        debug!("no workflow configured, skipping CI trigger");
        return Ok(());
    }
    let attribution = &settings.attribution;
    host.dispatch_workflow(attribution, workflow, "main").await?;

    let run_name = workflow.trim_end_matches(".yaml").trim_end_matches(".yml");
    let interval = Duration::from_secs(settings.poll_interval_secs.max(1));
    let deadline = settings
        .max_workflow_wait_secs
        .map(|secs| tokio::time::Instant::now() + Duration::from_secs(secs));
    info!(workflow, repo = %attribution, "workflow dispatched, waiting for completion");

    loop {
        tokio::select! {
            _ = cancel.cancelled() => return Err(WorkflowError::Cancelled),
            _ = tokio::time::sleep(interval) => {}
        }
        if let Some(deadline) = deadline {
            if tokio::time::Instant::now() >= deadline {
                return Err(WorkflowError::TimedOut);
            }
        }
        let runs = host.list_workflow_runs(attribution).await?;
        let completed = runs
            .iter()
            .any(|run| run.name == run_name && run.status == "completed");
        if completed {
            info!(workflow, "workflow run completed");
            return Ok(());
        }
        debug!(workflow, "workflow run not finished yet, polling again");
    }
}
