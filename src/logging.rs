use tracing::Level;
use tracing_subscriber::{
    filter::Targets,
    fmt::{
        self,
        format::{Format, Full},
        time::SystemTime,
    },
    prelude::*,
};

const LOG_FILE_NAME: &str = "expense_reminders.log";

fn build_base_log_format() -> Format<Full, SystemTime> {
    fmt::format()
        .with_level(true)
        .with_ansi(false)
        .with_file(true)
        .with_target(true)
        .with_thread_names(true)
}

/// Stdout always; daily rolling plain and JSON files when `log_dir` is given.
pub fn setup_logging(log_dir: Option<&str>) {
    let stdout_layer =
        tracing_subscriber::fmt::layer().event_format(build_base_log_format().with_ansi(true));

    let filter = Targets::new()
        .with_target("sqlx", Level::INFO)
        .with_target("hyper", Level::INFO)
        .with_target("hyper_util", Level::INFO)
        .with_target("tower_http", Level::INFO)
        .with_target("isahc", Level::WARN)
        .with_default(Level::DEBUG);

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer);

    match log_dir {
        Some(dir) => {
            let log_file_layer = tracing_subscriber::fmt::layer()
                .event_format(build_base_log_format())
                .with_writer(tracing_appender::rolling::daily(dir, LOG_FILE_NAME));
            let json_file_layer = tracing_subscriber::fmt::layer()
                .event_format(build_base_log_format().json())
                .with_writer(tracing_appender::rolling::daily(
                    format!("{}/structured", dir),
                    LOG_FILE_NAME,
                ));
            subscriber.with(log_file_layer).with(json_file_layer).init();
        }
        None => subscriber.init(),
    }
}
