use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer, Registry};

type BoxError = Box<dyn std::error::Error + Send + Sync>;
type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Console output style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub format: LogFormat,
    pub loki_enabled: bool,
    pub loki_url: Option<String>,
    pub service_name: String,
    pub environment: String,
    pub log_level: String,
}

impl LoggingConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let format = match lookup("LOG_FORMAT").as_deref().map(str::trim) {
            Some(f) if f.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        Self {
            format,
            loki_enabled: lookup("LOKI_ENABLED")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(false),
            loki_url: lookup("LOKI_URL").filter(|u| !u.trim().is_empty()),
            service_name: lookup("SERVICE_NAME").unwrap_or_else(|| "agentdesk".to_string()),
            environment: lookup("ENVIRONMENT").unwrap_or_else(|| "development".to_string()),
            log_level: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.loki_enabled && self.loki_url.is_none() {
            return Err("LOKI_ENABLED is true but LOKI_URL is not set".to_string());
        }
        Ok(())
    }
}

fn console_layer(format: LogFormat) -> BoxedLayer {
    match format {
        LogFormat::Pretty => tracing_subscriber::fmt::layer().boxed(),
        LogFormat::Json => tracing_subscriber::fmt::layer().json().boxed(),
    }
}

/// Installs the global subscriber. Fails if one is already set.
pub fn init_logging(config: LoggingConfig) -> Result<(), BoxError> {
    config.validate()?;

    let mut layers: Vec<BoxedLayer> = vec![console_layer(config.format)];

    #[cfg(feature = "loki")]
    {
        if let (true, Some(loki_url)) = (config.loki_enabled, &config.loki_url) {
            layers.push(loki_layer(&config, loki_url)?);
        }
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(tracing_subscriber::EnvFilter::new(&config.log_level))
        .try_init()?;

    tracing::info!(
        service = %config.service_name,
        environment = %config.environment,
        loki = config.loki_enabled,
        "📊 Logging initialized"
    );
    Ok(())
}

#[cfg(feature = "loki")]
fn loki_layer(config: &LoggingConfig, loki_url: &str) -> Result<BoxedLayer, BoxError> {
    let url = url::Url::parse(loki_url)?;

    let (layer, task) = tracing_loki::builder()
        .label("service", &config.service_name)?
        .label("environment", &config.environment)?
        .build_url(url)?;

    // ships buffered events; lives as long as the runtime
    tokio::spawn(task);

    Ok(layer.boxed())
}
