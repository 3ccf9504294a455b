// Batch coordinator: fan calls out to the dispatcher and gather results by index

use crate::dispatcher::Dispatcher;
use crate::error::{BatchError, ErrorKind};
use crate::types::{CallDescriptor, CallError, CallResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::Instrument;

/// Execution policy for bulk calls
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Maximum number of calls of one batch running at the same time.
    /// 1 means strictly sequential, in request order.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,

    /// Whole-batch deadline. Unset means no timeout.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_max_concurrency() -> usize {
    1
}

fn default_max_batch_size() -> usize {
    1000
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_concurrency: default_max_concurrency(),
            max_batch_size: default_max_batch_size(),
            timeout_secs: None,
        }
    }
}

impl BatchConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// Reject values the runtime cannot honor
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.max_concurrency > Semaphore::MAX_PERMITS {
            anyhow::bail!(
                "max_concurrency {} exceeds the limit of {}",
                self.max_concurrency,
                Semaphore::MAX_PERMITS
            );
        }
        if let Some(timeout) = self.timeout() {
            if Instant::now().checked_add(timeout).is_none() {
                anyhow::bail!("timeout_secs {} is out of range", timeout.as_secs());
            }
        }
        Ok(())
    }

    fn permits(&self) -> usize {
        self.max_concurrency.clamp(1, Semaphore::MAX_PERMITS)
    }
}

/// Runs batches of calls through a shared dispatcher
#[derive(Clone)]
pub struct BatchCoordinator {
    dispatcher: Dispatcher,
    config: BatchConfig,
    timeout: Option<Duration>,
}

impl BatchCoordinator {
    pub fn new(dispatcher: Dispatcher, config: BatchConfig) -> Self {
        let timeout = config.timeout();
        Self {
            dispatcher,
            config,
            timeout,
        }
    }

    /// Override the batch deadline with sub-second precision
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Apply one tool to many argument sets
    pub async fn call_tool_bulk(
        &self,
        tool_name: &str,
        arguments: Vec<serde_json::Value>,
    ) -> Result<Vec<CallResult>, BatchError> {
        let calls = arguments
            .into_iter()
            .map(|args| CallDescriptor::new(tool_name, args))
            .collect();
        self.run(calls).await
    }

    /// Run a heterogeneous list of calls
    pub async fn call_tools_bulk(
        &self,
        calls: Vec<CallDescriptor>,
    ) -> Result<Vec<CallResult>, BatchError> {
        self.run(calls).await
    }

    async fn run(&self, calls: Vec<CallDescriptor>) -> Result<Vec<CallResult>, BatchError> {
        if calls.len() > self.config.max_batch_size {
            return Err(BatchError::TooLarge {
                len: calls.len(),
                max: self.config.max_batch_size,
            });
        }

        let batch_id = uuid::Uuid::new_v4();
        let span = tracing::info_span!("batch", %batch_id, size = calls.len());
        self.execute(calls).instrument(span).await
    }

    async fn execute(&self, calls: Vec<CallDescriptor>) -> Result<Vec<CallResult>, BatchError> {
        if calls.is_empty() {
            return Ok(Vec::new());
        }

        let total = calls.len();
        // A deadline past the end of the clock is no deadline
        let deadline = self.timeout.and_then(|t| Instant::now().checked_add(t));
        let permits = self.config.permits();
        let semaphore = Arc::new(Semaphore::new(permits));

        tracing::info!(
            "Executing batch of {} call(s), concurrency {}",
            total,
            permits
        );

        let tool_names: Vec<String> = calls.iter().map(|c| c.tool_name.clone()).collect();
        let mut handles: Vec<JoinHandle<CallResult>> = Vec::with_capacity(total);

        // Permits are taken in request order, so calls start in index order.
        for (index, call) in calls.into_iter().enumerate() {
            let Some(permit) = acquire(&semaphore, deadline).await else {
                tracing::warn!("Batch deadline reached before call {} started", index);
                break;
            };

            let dispatcher = self.dispatcher.clone();
            let span = tracing::Span::current();
            handles.push(tokio::spawn(
                async move {
                    let _permit = permit;
                    dispatcher.dispatch(index, call).await
                }
                .instrument(span),
            ));
        }

        let started = handles.len();
        let mut results = Vec::with_capacity(total);

        for (index, handle) in handles.into_iter().enumerate() {
            let result = collect(index, &tool_names[index], handle, deadline).await;
            results.push(result);
        }

        for (index, tool_name) in tool_names.iter().enumerate().skip(started) {
            results.push(timed_out(index, tool_name));
        }

        let failed = results.iter().filter(|r| !r.is_ok()).count();
        tracing::info!(
            "Batch finished: {} succeeded, {} failed",
            total - failed,
            failed
        );

        Ok(results)
    }
}

async fn acquire(
    semaphore: &Arc<Semaphore>,
    deadline: Option<Instant>,
) -> Option<OwnedSemaphorePermit> {
    let permit = semaphore.clone().acquire_owned();
    match deadline {
        Some(deadline) => tokio::time::timeout_at(deadline, permit).await.ok()?.ok(),
        None => permit.await.ok(),
    }
}

async fn collect(
    index: usize,
    tool_name: &str,
    mut handle: JoinHandle<CallResult>,
    deadline: Option<Instant>,
) -> CallResult {
    let joined = match deadline {
        Some(deadline) => match tokio::time::timeout_at(deadline, &mut handle).await {
            Ok(joined) => joined,
            Err(_) => {
                handle.abort();
                return timed_out(index, tool_name);
            }
        },
        None => handle.await,
    };

    match joined {
        Ok(result) => result,
        Err(e) => {
            tracing::error!("Call {} ({}) task failed: {}", index, tool_name, e);
            CallResult::error(
                index,
                tool_name,
                CallError::new(ErrorKind::InternalError, format!("Call task failed: {}", e)),
            )
        }
    }
}

fn timed_out(index: usize, tool_name: &str) -> CallResult {
    CallResult::error(
        index,
        tool_name,
        CallError::new(
            ErrorKind::Timeout,
            "Call did not complete within the batch timeout",
        ),
    )
}
