//! Course calculation worker.
//!
//! Runs the [`CourseEngine`] on its own subsystem so delta ingestion never
//! waits on a calculation. Requests arrive in order over a bounded `mpsc`
//! channel; every request reaches [`CourseEngine::process`], so the
//! staleness debounce counts each position update.

use course_core::{CourseEngine, DualCourseResult, NavigationSnapshot};
use log::{debug, info, warn};
use std::future::Future;
use tokio::sync::mpsc;
use tokio_graceful_shutdown::SubsystemHandle;

use crate::ProviderError;

/// Snapshot to calculate, tagged with a sequence number
#[derive(Debug, Clone, PartialEq)]
pub struct CalcRequest {
    pub seq: u64,
    pub snapshot: NavigationSnapshot,
    /// Arrival circle in meters at the time of the snapshot
    pub arrival_circle: Option<f64>,
}

/// Result for the request with the same sequence number
#[derive(Debug, Clone, PartialEq)]
pub struct CalcResponse {
    pub seq: u64,
    pub result: DualCourseResult,
    /// Arrival circle of the request, for the arrival watcher
    pub arrival_circle: Option<f64>,
}

pub struct CourseWorker {
    engine: CourseEngine,
    requests: mpsc::Receiver<CalcRequest>,
    responses: mpsc::Sender<CalcResponse>,
}

impl CourseWorker {
    pub fn new(
        stale_threshold: u32,
        requests: mpsc::Receiver<CalcRequest>,
        responses: mpsc::Sender<CalcResponse>,
    ) -> Self {
        CourseWorker {
            engine: CourseEngine::new(stale_threshold),
            requests,
            responses,
        }
    }

    pub async fn run(self, subsys: SubsystemHandle) -> Result<(), ProviderError> {
        self.serve(subsys.on_shutdown_requested()).await
    }

    /// Process requests until `shutdown` completes or the request sender is
    /// dropped. Requests already queued are still processed after the drop.
    pub async fn serve(mut self, shutdown: impl Future<Output = ()>) -> Result<(), ProviderError> {
        info!(
            "CourseWorker: starting, stale threshold {}",
            self.engine.stale_threshold()
        );
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("CourseWorker: shutdown");
                    break;
                }
                request = self.requests.recv() => {
                    let Some(request) = request else {
                        info!("CourseWorker: request channel closed");
                        break;
                    };

                    let Some(result) = self.engine.process(&request.snapshot) else {
                        debug!(
                            "CourseWorker: request {} not published (stale count {})",
                            request.seq,
                            self.engine.stale_count()
                        );
                        continue;
                    };

                    let response = CalcResponse {
                        seq: request.seq,
                        result,
                        arrival_circle: request.arrival_circle,
                    };
                    if self.responses.send(response).await.is_err() {
                        warn!("CourseWorker: response channel closed");
                        break;
                    }
                }
            }
        }
        Ok(())
    }
}
