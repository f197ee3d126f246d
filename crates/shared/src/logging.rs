//! Logging infrastructure for the ETL run.
//!
//! Console output replaces per-unit progress bars; the file layer keeps a
//! daily-rotated record of every unit, projection and rejected row.

use anyhow::{Context, Result};
use std::path::Path;
use tracing::Level;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Log directory path
    pub log_dir: String,
    /// Component name (used for log file naming)
    pub component: String,
    /// Default log level
    pub default_level: Level,
    /// Enable console output
    pub console: bool,
    /// Enable file output
    pub file: bool,
    /// Enable JSON formatting for file logs
    pub json_format: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            log_dir: "data/logs".to_string(),
            component: "season-etl".to_string(),
            default_level: Level::INFO,
            console: true,
            file: true,
            json_format: false,
        }
    }
}

impl LogConfig {
    /// Build the `EnvFilter` directive string for this configuration.
    ///
    /// Crate targets use underscores, so the component name is normalized.
    pub fn filter_directives(&self) -> String {
        format!(
            "{}={},shared={},season_etl={},hyper=warn,reqwest=warn,h2=warn",
            self.component.replace('-', "_"),
            self.default_level,
            self.default_level,
            self.default_level
        )
    }
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Initialize the global subscriber
///
/// The filter comes from `RUST_LOG` when set, otherwise from
/// `LogConfig::filter_directives`. Console and file output are independent.
pub fn init(config: LogConfig) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.filter_directives()));

    let mut layers: Vec<BoxedLayer> = Vec::new();
    if config.console {
        layers.push(console_layer());
    }
    if config.file {
        layers.push(file_layer(&config)?);
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(env_filter)
        .try_init()
        .context("Failed to initialize tracing subscriber")?;

    tracing::info!(
        component = %config.component,
        log_dir = %config.log_dir,
        console = config.console,
        file = config.file,
        "Logging initialized"
    );

    Ok(())
}

fn console_layer() -> BoxedLayer {
    fmt::layer()
        .with_target(false)
        .with_span_events(FmtSpan::NONE)
        .with_writer(std::io::stdout)
        .boxed()
}

/// Daily-rolling `<log_dir>/<component>.<date>` file
fn file_layer(config: &LogConfig) -> Result<BoxedLayer> {
    let log_dir = Path::new(&config.log_dir);
    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("Failed to create log directory: {}", log_dir.display()))?;

    let appender = tracing_appender::rolling::daily(log_dir, &config.component);

    let layer = if config.json_format {
        fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(false)
            .with_writer(appender)
            .boxed()
    } else {
        fmt::layer()
            .with_ansi(false)
            .with_span_events(FmtSpan::CLOSE)
            .with_writer(appender)
            .boxed()
    };

    Ok(layer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_config() {
        let config = LogConfig::default();
        assert_eq!(config.component, "season-etl");
        assert_eq!(config.default_level, Level::INFO);
        assert!(config.console);
        assert!(config.file);
    }

    #[test]
    fn test_file_layer_creates_log_dir() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let log_dir = temp_dir.path().join("nested").join("logs");
        let config = LogConfig {
            log_dir: log_dir.to_string_lossy().to_string(),
            ..Default::default()
        };

        assert!(file_layer(&config).is_ok());
        assert!(log_dir.is_dir());
    }

    #[test]
    fn test_filter_directives_use_crate_targets() {
        let config = LogConfig {
            default_level: Level::DEBUG,
            ..Default::default()
        };

        let directives = config.filter_directives();
        assert!(directives.starts_with("season_etl=DEBUG"));
        assert!(directives.contains("shared=DEBUG"));
        assert!(directives.contains("reqwest=warn"));
        assert!(EnvFilter::try_new(&directives).is_ok());
    }
}
