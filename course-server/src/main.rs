use clap::Parser;
use log::info;
use miette::{IntoDiagnostic, Result};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_graceful_shutdown::{SubsystemBuilder, Toplevel};

use course_server::{Cli, CourseProvider, CourseWorker, VERSION};

const REQUEST_QUEUE: usize = 64;
const RESPONSE_QUEUE: usize = 16;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    env_logger::Builder::new()
        .filter_level(args.verbose.log_level_filter())
        .format_timestamp_millis()
        .init();

    info!("course-server {} starting", VERSION);

    let config = args.resolve_config().into_diagnostic()?;
    info!(
        "Publishing {} course values, stale threshold {}",
        config.calc_method, config.stale_threshold
    );

    let (request_tx, request_rx) = mpsc::channel(REQUEST_QUEUE);
    let (response_tx, response_rx) = mpsc::channel(RESPONSE_QUEUE);

    let worker = CourseWorker::new(config.stale_threshold, request_rx, response_tx);
    let provider = CourseProvider::new(config);
    let input = args.input.clone();

    Toplevel::new(|s| async move {
        s.start(SubsystemBuilder::new("CourseWorker", |s| worker.run(s)));
        s.start(SubsystemBuilder::new("CourseProvider", move |s| {
            provider.run(input, request_tx, response_rx, s)
        }));
    })
    .catch_signals()
    .handle_shutdown_requests(Duration::from_secs(5))
    .await
    .map_err(|e| miette::miette!("{}", e))
}
