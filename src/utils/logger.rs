//! JSON logs for the function runtime. Fields of the current span (bucket,
//! key) are attached to every line emitted while an object is processed.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_DIRECTIVES: &str = "csv2json_etl=info,lambda=info";

/// `RUST_LOG` wins when it parses; anything else falls back to the default.
fn filter_from(directives: Option<&str>) -> EnvFilter {
    directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_DIRECTIVES))
}

pub fn init_lambda_logger() {
    let directives = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let layer = fmt::layer()
        .json()
        .flatten_event(true)
        .with_current_span(true)
        .with_span_list(false)
        .with_target(false)
        .without_time(); // CloudWatch 已經記錄時間戳

    tracing_subscriber::registry()
        .with(filter_from(directives.as_deref()))
        .with(layer)
        .init();
}
