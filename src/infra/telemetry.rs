use std::sync::Once;

use metrics::{Unit, describe_counter, describe_histogram};
use tracing::{Subscriber, level_filters::LevelFilter};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    registry::LookupSpan,
    util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// sqlx logs every statement at `info`; keep it quiet unless asked for.
const QUIET_DEPENDENCIES: &[&str] = &["sqlx=warn"];

/// Install the global subscriber: `RUST_LOG` wins over the configured level.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    tracing_subscriber::registry()
        .with(env_filter(logging.level))
        .with(ErrorLayer::default())
        .with(output_layer(logging.format))
        .try_init()
        .map_err(|err| {
            InfraError::telemetry(format!("failed to install tracing subscriber: {err}"))
        })
}

fn env_filter(level: LevelFilter) -> EnvFilter {
    let mut filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();
    for directive in QUIET_DEPENDENCIES {
        if let Ok(directive) = directive.parse() {
            filter = filter.add_directive(directive);
        }
    }
    filter
}

fn output_layer<S>(format: LogFormat) -> Box<dyn Layer<S> + Send + Sync>
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    match format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(true).boxed(),
    }
}

fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            "plaza_home_cache_hit_total",
            Unit::Count,
            "Home timeline requests served from the page cache."
        );
        describe_counter!(
            "plaza_home_cache_miss_total",
            Unit::Count,
            "Home timeline requests rendered because no fresh cached page existed."
        );
        describe_histogram!(
            "plaza_http_request_duration_ms",
            Unit::Milliseconds,
            "Time spent handling HTTP requests, in milliseconds."
        );
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_keeps_configured_level_and_quiets_sqlx() {
        let rendered = env_filter(LevelFilter::DEBUG).to_string();
        assert!(rendered.contains("sqlx=warn"), "{rendered}");
    }
}
