//! Course provider.
//!
//! Reads SignalK deltas line by line, queues a snapshot for the
//! [`CourseWorker`](crate::CourseWorker) on every position update and turns
//! its results into calcValues and notification deltas.

use log::{debug, info, trace, warn};
use serde_json::Value;
use std::future::Future;
use std::path::PathBuf;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio_graceful_shutdown::SubsystemHandle;

use crate::alarms::{AlarmUpdate, CourseAlarms};
use crate::config::CourseConfig;
use crate::navdata::NavigationData;
use crate::publish;
use crate::worker::{CalcRequest, CalcResponse};

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Cannot open input {path}: {source}")]
    Input {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Cannot serialize delta: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("Course worker stopped")]
    WorkerStopped,
}

pub struct CourseProvider {
    config: CourseConfig,
    navdata: NavigationData,
    alarms: CourseAlarms,
    /// Sequence number of the newest request sent to the worker
    latest_requested: u64,
    /// Sequence number of the newest response published
    last_applied: u64,
}

impl CourseProvider {
    pub fn new(config: CourseConfig) -> Self {
        let alarms = CourseAlarms::new(config.notifications.clone());
        CourseProvider {
            config,
            navdata: NavigationData::new(),
            alarms,
            latest_requested: 0,
            last_applied: 0,
        }
    }

    pub fn config(&self) -> &CourseConfig {
        &self.config
    }

    pub fn navdata(&self) -> &NavigationData {
        &self.navdata
    }

    /// Handle one input line. Blank and malformed lines are skipped.
    pub fn handle_line(&mut self, line: &str) -> Option<CalcRequest> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        match serde_json::from_str::<Value>(line) {
            Ok(delta) => self.handle_delta(&delta),
            Err(e) => {
                warn!("Skipping malformed input line: {}", e);
                None
            }
        }
    }

    /// Apply a delta; returns a calculation request if the position changed
    pub fn handle_delta(&mut self, delta: &Value) -> Option<CalcRequest> {
        match self.navdata.apply_delta(delta) {
            Ok(outcome) if outcome.position_updated => {
                self.latest_requested += 1;
                Some(CalcRequest {
                    seq: self.latest_requested,
                    snapshot: self.navdata.take_snapshot(),
                    arrival_circle: self.navdata.arrival_circle(),
                })
            }
            Ok(outcome) => {
                debug!("Applied {} values, no position update", outcome.applied);
                None
            }
            Err(e) => {
                warn!("Skipping delta: {}", e);
                None
            }
        }
    }

    /// Turn a worker response into output deltas.
    ///
    /// Responses older than the last one published are dropped.
    pub fn handle_response(&mut self, response: CalcResponse) -> Vec<Value> {
        if response.seq <= self.last_applied {
            trace!(
                "Dropping stale response {} (applied {})",
                response.seq,
                self.last_applied
            );
            return Vec::new();
        }
        self.last_applied = response.seq;

        let branch = response.result.branch(self.config.calc_method);
        let mut deltas = vec![publish::delta(publish::path_values(branch))];

        let alarms = self.alarms.update(&response.result, response.arrival_circle);
        deltas.extend(alarms.iter().map(AlarmUpdate::to_delta));
        deltas
    }

    /// Subsystem entry point: reads from `input` or stdin, writes to stdout.
    ///
    /// Requests a global shutdown once the input is exhausted.
    pub async fn run(
        self,
        input: Option<PathBuf>,
        requests: mpsc::Sender<CalcRequest>,
        responses: mpsc::Receiver<CalcResponse>,
        subsys: SubsystemHandle,
    ) -> Result<(), ProviderError> {
        let output = tokio::io::stdout();
        let shutdown = subsys.on_shutdown_requested();

        let result = match input {
            Some(path) => {
                info!("Reading deltas from {}", path.display());
                let file = tokio::fs::File::open(&path)
                    .await
                    .map_err(|source| ProviderError::Input { path, source })?;
                self.serve(BufReader::new(file), output, requests, responses, shutdown)
                    .await
            }
            None => {
                info!("Reading deltas from stdin");
                self.serve(
                    BufReader::new(tokio::io::stdin()),
                    output,
                    requests,
                    responses,
                    shutdown,
                )
                .await
            }
        };

        subsys.request_shutdown();
        result
    }

    /// Main loop over arbitrary input and output streams.
    ///
    /// Input is read only while no request is waiting for queue space, and
    /// responses are drained throughout, so a full queue in either direction
    /// cannot stall the pair. At end of input the request channel is closed
    /// and the remaining responses are drained before returning.
    pub async fn serve<R, W>(
        mut self,
        input: R,
        mut output: W,
        requests: mpsc::Sender<CalcRequest>,
        mut responses: mpsc::Receiver<CalcResponse>,
        shutdown: impl Future<Output = ()>,
    ) -> Result<(), ProviderError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = input.lines();
        let mut requests = Some(requests);
        let mut pending: Option<CalcRequest> = None;
        let mut input_open = true;
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("CourseProvider: shutdown");
                    break;
                }
                line = lines.next_line(), if input_open && pending.is_none() => {
                    match line? {
                        Some(line) => pending = self.handle_line(&line),
                        None => {
                            info!("CourseProvider: end of input");
                            input_open = false;
                        }
                    }
                }
                permit = reserve(requests.as_ref()), if pending.is_some() => {
                    let (Some(permit), Some(request)) = (permit, pending.take()) else {
                        return Err(ProviderError::WorkerStopped);
                    };
                    permit.send(request);
                }
                response = responses.recv() => {
                    match response {
                        Some(response) => {
                            for delta in self.handle_response(response) {
                                write_delta(&mut output, &delta).await?;
                            }
                        }
                        None if requests.is_some() => return Err(ProviderError::WorkerStopped),
                        None => break,
                    }
                }
            }

            if !input_open && pending.is_none() && requests.take().is_some() {
                debug!("CourseProvider: all requests queued, closing request channel");
            }
        }

        output.flush().await?;
        Ok(())
    }
}

/// Wait for queue space; `None` once the worker has gone
async fn reserve<T>(requests: Option<&mpsc::Sender<T>>) -> Option<mpsc::Permit<'_, T>> {
    requests?.reserve().await.ok()
}

async fn write_delta<W: AsyncWrite + Unpin>(
    output: &mut W,
    delta: &Value,
) -> Result<(), ProviderError> {
    let mut line = serde_json::to_vec(delta)?;
    line.push(b'\n');
    output.write_all(&line).await?;
    output.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worker::CourseWorker;
    use course_core::{CalcMethod, DualCourseResult};
    use serde_json::json;

    fn position_delta(latitude: f64, longitude: f64) -> Value {
        json!({ "updates": [{ "values": [
            { "path": "navigation.position", "value": { "latitude": latitude, "longitude": longitude } }
        ]}]})
    }

    fn course_delta() -> Value {
        json!({ "context": "vessels.self", "updates": [{ "values": [
            { "path": "navigation.course.nextPoint.position", "value": { "latitude": 0.0, "longitude": 10.0 } },
            { "path": "navigation.course.previousPoint.position", "value": { "latitude": 0.0, "longitude": 0.0 } },
            { "path": "navigation.course.arrivalCircle", "value": 500.0 }
        ]}]})
    }

    fn response(seq: u64, distance: Option<f64>) -> CalcResponse {
        let mut result = DualCourseResult::empty();
        result.gc.distance = distance;
        result.rl.distance = distance;
        CalcResponse {
            seq,
            result,
            arrival_circle: Some(500.0),
        }
    }

    fn output_deltas(output: Vec<u8>) -> Vec<Value> {
        String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    async fn run_pipeline(input: String, stale_threshold: u32) -> Vec<Value> {
        let mut output = Vec::new();

        // Small queues so both directions fill up
        let (request_tx, request_rx) = mpsc::channel(1);
        let (response_tx, response_rx) = mpsc::channel(1);
        let worker = tokio::spawn(
            CourseWorker::new(stale_threshold, request_rx, response_tx)
                .serve(std::future::pending()),
        );

        CourseProvider::new(CourseConfig::default())
            .serve(
                input.as_bytes(),
                &mut output,
                request_tx,
                response_rx,
                std::future::pending(),
            )
            .await
            .unwrap();
        worker.await.unwrap().unwrap();

        output_deltas(output)
    }

    fn published<'a>(delta: &'a Value, path: &str) -> Option<&'a Value> {
        delta["updates"][0]["values"]
            .as_array()?
            .iter()
            .find(|v| v["path"] == path)
            .map(|v| &v["value"])
    }

    #[test]
    fn test_only_position_triggers_request() {
        let mut provider = CourseProvider::new(CourseConfig::default());
        assert!(provider.handle_delta(&course_delta()).is_none());

        let request = provider.handle_delta(&position_delta(0.0, 5.0)).unwrap();
        assert_eq!(request.seq, 1);
        assert!(request.snapshot.has_course());
        assert_eq!(request.arrival_circle, Some(500.0));

        let request = provider
            .handle_line(&position_delta(0.0, 6.0).to_string())
            .unwrap();
        assert_eq!(request.seq, 2);
    }

    #[test]
    fn test_malformed_lines_skipped() {
        let mut provider = CourseProvider::new(CourseConfig::default());
        assert!(provider.handle_line("").is_none());
        assert!(provider.handle_line("{not json").is_none());
        assert!(provider.handle_line("[1,2,3]").is_none());
    }

    #[test]
    fn test_stale_responses_dropped() {
        let mut provider = CourseProvider::new(CourseConfig::default());

        assert!(!provider.handle_response(response(2, Some(1000.0))).is_empty());
        assert!(provider.handle_response(response(1, Some(2000.0))).is_empty());
        assert!(provider.handle_response(response(2, Some(1000.0))).is_empty());
        assert!(!provider.handle_response(response(3, None)).is_empty());
    }

    #[test]
    fn test_publishes_configured_method() {
        let config = CourseConfig {
            calc_method: CalcMethod::Rhumbline,
            ..Default::default()
        };
        let mut provider = CourseProvider::new(config);

        let deltas = provider.handle_response(response(1, Some(1000.0)));
        assert_eq!(deltas.len(), 1);
        assert_eq!(
            published(&deltas[0], "navigation.course.calcValues.calcMethod"),
            Some(&json!("Rhumbline"))
        );
        assert_eq!(
            published(&deltas[0], "navigation.course.calcValues.distance"),
            Some(&json!(1000.0))
        );
    }

    #[test]
    fn test_request_timestamp_not_reused() {
        let mut provider = CourseProvider::new(CourseConfig::default());
        provider.handle_delta(&json!({ "updates": [{ "values": [
            { "path": "navigation.datetime", "value": "2024-06-01T08:00:00Z" },
            { "path": "navigation.position", "value": { "latitude": 0.0, "longitude": 5.0 } }
        ]}]}));

        let request = provider.handle_delta(&position_delta(0.0, 5.1)).unwrap();
        assert!(request.snapshot.timestamp.is_none());
    }

    #[test]
    fn test_arrival_uses_circle_of_request() {
        let mut provider = CourseProvider::new(CourseConfig::default());
        provider.handle_delta(&course_delta());
        // Circle shrinks after the request went out
        provider.handle_delta(&json!({ "updates": [{ "values": [
            { "path": "navigation.course.arrivalCircle", "value": 10.0 }
        ]}]}));

        let deltas = provider.handle_response(response(1, Some(100.0)));
        assert_eq!(deltas.len(), 2);
        assert!(published(&deltas[1], "notifications.navigation.arrivalCircleEntered").is_some());
    }

    #[test]
    fn test_arrival_notification() {
        let mut provider = CourseProvider::new(CourseConfig::default());

        let deltas = provider.handle_response(response(1, Some(100.0)));
        assert_eq!(deltas.len(), 2);
        let notification =
            published(&deltas[1], "notifications.navigation.arrivalCircleEntered").unwrap();
        assert_eq!(notification["state"], json!("alert"));

        let deltas = provider.handle_response(response(2, Some(90.0)));
        assert_eq!(deltas.len(), 1);

        // Course cleared: values nulled and the alarm returns to normal
        let deltas = provider.handle_response(response(3, None));
        assert_eq!(deltas.len(), 2);
        assert_eq!(
            published(&deltas[0], "navigation.course.calcValues.distance"),
            Some(&Value::Null)
        );
        let notification =
            published(&deltas[1], "notifications.navigation.arrivalCircleEntered").unwrap();
        assert_eq!(notification["state"], json!("normal"));
    }

    #[tokio::test]
    async fn test_pipeline_end_to_end() {
        let input = format!(
            "{}\nnot a delta\n{}\n",
            course_delta(),
            position_delta(0.0, 5.0)
        );
        let deltas = run_pipeline(input, 3).await;
        assert_eq!(deltas.len(), 1);

        let distance = published(&deltas[0], "navigation.course.calcValues.distance")
            .and_then(Value::as_f64)
            .unwrap();
        assert!((distance - 555_975.0).abs() < 100.0);
        let xte = published(&deltas[0], "navigation.course.calcValues.crossTrackError")
            .and_then(Value::as_f64)
            .unwrap();
        assert!(xte.abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_pipeline_every_update_then_cleared() {
        let cleared = json!({ "updates": [{ "values": [
            { "path": "navigation.course.nextPoint", "value": null }
        ]}]});
        let lines = [
            course_delta(),
            position_delta(0.0, 5.0),
            position_delta(0.0, 5.1),
            cleared,
            position_delta(0.0, 5.2),
            position_delta(0.0, 5.3),
            position_delta(0.0, 5.4),
        ];
        let input: String = lines.iter().map(|l| format!("{}\n", l)).collect();

        let deltas = run_pipeline(input, 3).await;
        let distances: Vec<Option<f64>> = deltas
            .iter()
            .map(|d| {
                published(d, "navigation.course.calcValues.distance").and_then(Value::as_f64)
            })
            .collect();

        // Two active results, then exactly one clear on the third stale update
        assert_eq!(distances.len(), 3);
        let (first, second) = (distances[0].unwrap(), distances[1].unwrap());
        assert!(second < first);
        assert!(distances[2].is_none());
    }
}
