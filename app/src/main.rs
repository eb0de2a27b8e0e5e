//! The `todokit` server.
//!
//! ```bash
//! TODOKIT_LOG_FORMAT=text cargo run -p todokit-app
//! ```

use anyhow::Context as _;
use todokit_app::{AppComponents, Application, Config, event_bus, telemetry};
use todokit_runtime::metrics::MetricsExporter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("failed to load configuration")?;
    config.validate().context("invalid configuration")?;

    telemetry::init(config.log_format()?, &config.log.level, config.debug)?;

    tracing::info!(
        environment = %config.environment,
        debug = config.debug,
        event_bus = %config.event_bus,
        "Starting todokit"
    );

    let metrics = MetricsExporter::install().context("failed to install metrics recorder")?;

    let components = AppComponents::new(event_bus(&config)?, config.todo_topic.clone());
    let app = Application::bind(&config, &components, metrics.handle().clone()).await?;

    app.run().await
}
