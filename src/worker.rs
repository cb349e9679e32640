// THEORY:
// The `worker` module keeps heavy matrix work off the caller's thread. A
// `PcaWorker` is an isolated tokio task that owns nothing but its inbox:
// each request carries a `oneshot` reply slot, and every request produces
// exactly one success or one error message — no partial results, no
// streaming, no cancellation. A caller that abandons interest simply drops
// the receiver; the computation still runs to completion and its result is
// discarded. Callers that need concurrent analyses use a `WorkerPool`,
// which round-robins requests over several workers through a dispatcher
// task.
//
// The protocol itself is a pair of plain serde types plus a pure function
// from request to response. The worker loop is only a transport around
// `handle_request`; any other transport that can carry the serialized shape
// (see `handle_message` for JSON) gets identical semantics, and no part of
// the engine depends on a particular messaging API.

use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info};

use crate::pipeline::{CompressionPipeline, ImageAnalysis, PipelineConfig};

/// A single compression request: an image plus its parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PcaRequest {
    /// Packed RGBA byte buffer, `width * height * 4` long.
    pub image_data: Vec<u8>,
    /// Principal components to keep per channel.
    pub num_components: usize,
    pub width: u32,
    pub height: u32,
}

/// The one message a request produces: the result, or a reason it failed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PcaResponse {
    #[serde(rename_all = "camelCase")]
    Success {
        /// Reconstructed packed RGBA buffer.
        result: Vec<u8>,
        /// Per-channel diagnostics excerpts.
        analysis: ImageAnalysis,
        width: u32,
        height: u32,
        /// Wall time spent on the PCA work, in seconds.
        elapsed_secs: f64,
    },
    Error {
        /// Human-readable failure reason.
        error: String,
    },
}

impl PcaResponse {
    pub fn is_success(&self) -> bool {
        matches!(self, PcaResponse::Success { .. })
    }
}

/// Pure request handler: every internal failure becomes an error response,
/// never a panic of the hosting context.
pub fn handle_request(request: PcaRequest) -> PcaResponse {
    let pipeline = CompressionPipeline::new(PipelineConfig {
        image_width: request.width,
        image_height: request.height,
        num_components: request.num_components,
    });

    match pipeline.compress(&request.image_data) {
        Ok(report) => {
            debug!(
                width = request.width,
                height = request.height,
                num_components = request.num_components,
                elapsed_secs = report.elapsed_secs,
                "pca request completed"
            );
            PcaResponse::Success {
                result: report.pixels,
                analysis: report.analysis,
                width: request.width,
                height: request.height,
                elapsed_secs: report.elapsed_secs,
            }
        }
        Err(err) => {
            error!(%err, "pca request failed");
            PcaResponse::Error {
                error: err.to_string(),
            }
        }
    }
}

/// JSON transport adapter. A payload that does not deserialize into a
/// `PcaRequest` (missing `width`, mistyped `height`, truncated body) yields
/// an error-typed response instead of an unhandled failure.
pub fn handle_message(payload: &str) -> PcaResponse {
    match serde_json::from_str::<PcaRequest>(payload) {
        Ok(request) => handle_request(request),
        Err(err) => PcaResponse::Error {
            error: format!("malformed request: {err}"),
        },
    }
}

struct PcaTask {
    request: PcaRequest,
    result_sender: oneshot::Sender<PcaResponse>,
}

/// An isolated worker: one tokio task, one request in flight at a time.
///
/// Dropping the worker closes its inbox; the task drains and exits.
pub struct PcaWorker {
    task_sender: mpsc::UnboundedSender<PcaTask>,
}

impl PcaWorker {
    pub fn new() -> Self {
        let (task_sender, mut task_receiver) = mpsc::unbounded_channel::<PcaTask>();

        tokio::spawn(async move {
            while let Some(task) = task_receiver.recv().await {
                // The matrix work is CPU-bound; run it on the blocking pool
                // so the async runtime's reactor threads stay responsive.
                let result = tokio::task::spawn_blocking(move || handle_request(task.request))
                    .await
                    .unwrap_or_else(|join_err| PcaResponse::Error {
                        error: format!("worker task failed: {join_err}"),
                    });
                // Receiver may have been dropped; the result is discarded.
                let _ = task.result_sender.send(result);
            }
        });

        Self { task_sender }
    }

    /// Submits a request and awaits its single response.
    pub async fn process(&self, request: PcaRequest) -> Result<PcaResponse, &'static str> {
        let (result_sender, result_receiver) = oneshot::channel();

        self.task_sender
            .send(PcaTask {
                request,
                result_sender,
            })
            .map_err(|_| "Failed to send task to worker")?;

        result_receiver
            .await
            .map_err(|_| "Failed to receive result from worker")
    }
}

impl Default for PcaWorker {
    fn default() -> Self {
        Self::new()
    }
}

/// A pool of workers behind a round-robin dispatcher, for callers that need
/// several analyses in flight at once.
pub struct WorkerPool {
    task_sender: mpsc::UnboundedSender<PcaTask>,
}

impl WorkerPool {
    /// Creates a pool sized from the CPU count (at most 4 workers).
    pub fn new() -> Self {
        Self::with_size(num_cpus::get().clamp(1, 4))
    }

    pub fn with_size(pool_size: usize) -> Self {
        let (task_sender, mut task_receiver) = mpsc::unbounded_channel::<PcaTask>();

        let (worker_senders, worker_receivers): (Vec<_>, Vec<_>) = (0..pool_size)
            .map(|_| mpsc::unbounded_channel::<PcaTask>())
            .unzip();

        // Dispatcher distributes tasks to workers round-robin.
        tokio::spawn(async move {
            let mut worker_idx = 0;
            while let Some(task) = task_receiver.recv().await {
                let _ = worker_senders[worker_idx].send(task);
                worker_idx = (worker_idx + 1) % pool_size;
            }
        });

        for mut worker_receiver in worker_receivers {
            tokio::spawn(async move {
                while let Some(task) = worker_receiver.recv().await {
                    let result =
                        tokio::task::spawn_blocking(move || handle_request(task.request))
                            .await
                            .unwrap_or_else(|join_err| PcaResponse::Error {
                                error: format!("worker task failed: {join_err}"),
                            });
                    let _ = task.result_sender.send(result);
                }
            });
        }

        info!(pool_size, "pca worker pool started");
        Self { task_sender }
    }

    /// Submits a request to the pool and awaits its single response.
    pub async fn process(&self, request: PcaRequest) -> Result<PcaResponse, &'static str> {
        let (result_sender, result_receiver) = oneshot::channel();

        self.task_sender
            .send(PcaTask {
                request,
                result_sender,
            })
            .map_err(|_| "Failed to send task to worker pool")?;

        result_receiver
            .await
            .map_err(|_| "Failed to receive result from worker")
    }
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self::new()
    }
}
