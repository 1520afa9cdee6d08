use eyre::Result;
use tracing_subscriber::{
    filter::{LevelFilter, Targets},
    prelude::*,
};

pub use span_metrics::TimeSpanLifetime;

use crate::settings::trace::fmt::Style;
use crate::CoreMetrics;

/// Configure a `tracing_subscriber::fmt` Layer outputting to stdout
pub mod fmt;

mod span_metrics;

/// Logging level. A "higher level" means more will be logged.
#[derive(Default, Debug, Clone, Copy, serde::Deserialize, PartialOrd, Ord, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Level {
    /// Off
    Off = 0,
    /// Error
    Error = 1,
    /// Warn
    Warn = 2,
    /// Debug
    Debug = 4,
    /// Trace
    Trace = 5,
    /// Info
    #[serde(other)]
    #[default]
    Info = 3,
}

impl From<Level> for LevelFilter {
    fn from(level: Level) -> LevelFilter {
        match level {
            Level::Off => LevelFilter::OFF,
            Level::Error => LevelFilter::ERROR,
            Level::Warn => LevelFilter::WARN,
            Level::Debug => LevelFilter::DEBUG,
            Level::Trace => LevelFilter::TRACE,
            Level::Info => LevelFilter::INFO,
        }
    }
}

/// Configuration for the tracing subscribers used by teleport agents
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct TracingConfig {
    /// Output style
    #[serde(default)]
    pub fmt: Style,
    /// Verbosity
    #[serde(default)]
    pub level: Level,
}

impl TracingConfig {
    /// The target filter: `level` everywhere, with the chattier HTTP crates
    /// held at info unless tracing everything.
    pub fn targets(&self) -> Targets {
        let mut target_layer = Targets::new().with_default(self.level);
        if self.level < Level::Trace {
            // only show these debug and trace logs at trace level
            target_layer = target_layer.with_target("hyper", Level::Info);
            target_layer = target_layer.with_target("reqwest", Level::Info);
            target_layer = target_layer.with_target("h2", Level::Info);
        }
        target_layer
    }

    /// Attempt to instantiate and register a tracing subscriber setup from
    /// settings.
    pub fn start_tracing(&self, metrics: &CoreMetrics) -> Result<()> {
        let fmt_layer = self.fmt.layer();
        let err_layer = tracing_error::ErrorLayer::default();

        let subscriber = tracing_subscriber::Registry::default()
            .with(self.targets())
            .with(TimeSpanLifetime::new(metrics.span_duration_seconds()))
            .with(fmt_layer)
            .with(err_layer);

        subscriber.try_init()?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn unknown_levels_fall_back_to_info() {
        let cfg: TracingConfig = serde_json::from_str(r#"{"level": "verbose"}"#).unwrap();
        assert_eq!(cfg.level, Level::Info);
        assert!(Level::Debug > Level::Info);
        assert!(Level::Warn < Level::Info);
    }

    #[test]
    fn http_crates_are_quiet_below_trace() {
        let cfg: TracingConfig = serde_json::from_str(r#"{"level": "debug"}"#).unwrap();
        let targets = cfg.targets();
        assert!(!targets.would_enable("hyper::proto", &tracing::Level::DEBUG));
        assert!(targets.would_enable("teleport_base::relay", &tracing::Level::DEBUG));

        let cfg: TracingConfig = serde_json::from_str(r#"{"level": "trace"}"#).unwrap();
        assert!(cfg.targets().would_enable("hyper::proto", &tracing::Level::TRACE));
    }
}
