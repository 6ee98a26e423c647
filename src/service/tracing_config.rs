use dotenv::dotenv;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use super::AppResult;

/// Where broker logs are written.
#[derive(Clone, Copy, Debug)]
pub enum LogMode {
    /// Console only.
    Console,
    /// Console plus an hourly-rolled log file under `logs/`.
    File,
}

/// Console-only tracing for tests and tooling, filtered by RUST_LOG.
pub fn setup_local_tracing() -> AppResult<()> {
    dotenv().ok();
    let timer = ChronoLocal::new("%Y-%m-%d %H:%M:%S%.6f".to_string());
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_timer(timer)
        .with_target(true)
        .with_thread_names(true)
        .with_thread_ids(true)
        .with_line_number(true);
    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();
    Ok(())
}

/// Broker tracing. In [`LogMode::File`] the returned guard must be held for
/// the life of the process; dropping it stops the non-blocking writer.
pub fn setup_tracing(mode: LogMode) -> AppResult<Option<WorkerGuard>> {
    dotenv().ok();
    let timer = ChronoLocal::new("%Y-%m-%d %H:%M:%S%.6f".to_string());

    match mode {
        LogMode::Console => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .with_timer(timer)
                .with_target(true)
                .with_thread_names(true)
                .with_thread_ids(true)
                .with_line_number(true);
            tracing_subscriber::registry()
                .with(fmt_layer)
                .with(tracing_subscriber::EnvFilter::from_default_env())
                .init();
            Ok(None)
        }
        LogMode::File => {
            let file_appender = tracing_appender::rolling::hourly("logs", "quillmq.log");
            let (non_blocking, worker_guard) = tracing_appender::non_blocking(file_appender);
            let writer = non_blocking.and(std::io::stdout);

            let fmt_layer = tracing_subscriber::fmt::layer()
                .with_timer(timer)
                .with_target(true)
                .with_thread_names(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .with_ansi(true)
                .with_writer(writer);
            tracing_subscriber::registry()
                .with(fmt_layer)
                .with(tracing_subscriber::EnvFilter::from_default_env())
                .init();
            Ok(Some(worker_guard))
        }
    }
}
