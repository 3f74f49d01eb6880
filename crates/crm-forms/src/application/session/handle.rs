//! Cancellable in-flight submission

use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::application::dto::{SubmissionReceipt, SubmissionRequest};
use crate::ports::outbound::{SinkError, SubmissionSink};

/// Handle to a submission running on the tokio runtime.
///
/// The request keeps running if the handle is merely dropped; call
/// [`SubmissionHandle::cancel`] to abort it.
pub struct SubmissionHandle {
    task: JoinHandle<Result<SubmissionReceipt, SinkError>>,
}

impl SubmissionHandle {
    /// Spawn the sink request on `runtime`
    pub fn spawn(runtime: &Handle, sink: Arc<dyn SubmissionSink>, request: SubmissionRequest) -> Self {
        let task = runtime.spawn(async move { sink.submit(request).await });
        Self { task }
    }

    pub fn cancel(&self) {
        debug!("aborting in-flight submission");
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the sink's answer. Must not be polled again once it has
    /// returned.
    pub async fn outcome(&mut self) -> Result<SubmissionReceipt, SinkError> {
        match (&mut self.task).await {
            Ok(result) => result,
            Err(e) if e.is_cancelled() => Err(SinkError::Cancelled),
            Err(e) => Err(SinkError::Transport(e.to_string())),
        }
    }
}

impl std::fmt::Debug for SubmissionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubmissionHandle")
            .field("finished", &self.task.is_finished())
            .finish()
    }
}
