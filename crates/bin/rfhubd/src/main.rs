use std::sync::Arc;

use tokio::io::BufReader;
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use rfhub_adapter_rf433::{ArduinoDriver, ArduinoSettings, Rf433Integration};
use rfhub_app::event_bus::InProcessEventBus;
use rfhub_app::ports::Integration;
use rfhub_app::registry::InMemoryRegistry;
use rfhubd::config::Config;
use rfhubd::console::Console;

type BoxError = Box<dyn std::error::Error>;

fn main() -> Result<(), BoxError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(run());
    // a pending stdin read would otherwise block shutdown
    runtime.shutdown_background();
    result
}

async fn run() -> Result<(), BoxError> {
    let config = Config::load()?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_new(&config.logging.filter).unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Event bus
    let event_bus = Arc::new(InProcessEventBus::new(config.events.capacity));
    let mut events = event_bus.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => tracing::info!(
                    event_type = ?event.event_type,
                    data = %event.data,
                    "event"
                ),
                Err(RecvError::Lagged(skipped)) => tracing::warn!(skipped, "event log lagging"),
                Err(RecvError::Closed) => break,
            }
        }
    });

    let registry = InMemoryRegistry::new(Arc::clone(&event_bus));

    // Integrations
    let mut rf433 = match config.rf433() {
        Ok(Some(rf433_config)) => {
            let driver = ArduinoDriver::new(ArduinoSettings::from(&rf433_config));
            let mut integration =
                Rf433Integration::new(rf433_config, driver, Arc::clone(&event_bus));
            match integration.setup(&registry).await {
                Ok(()) => Some(integration),
                Err(err) => {
                    tracing::error!(error = %err, "rf433 integration disabled");
                    None
                }
            }
        }
        Ok(None) => {
            tracing::info!("rf433 integration not configured");
            None
        }
        Err(err) => {
            tracing::error!(error = %err, "rf433 integration disabled");
            None
        }
    };

    tracing::info!(entities = registry.entities().len(), "rfhubd ready");

    let console = Console::new(rf433.as_ref(), &registry);
    tokio::select! {
        result = console.run(BufReader::new(tokio::io::stdin()), tokio::io::stdout()) => result?,
        result = tokio::signal::ctrl_c() => result?,
    }

    if let Some(integration) = rf433.as_mut() {
        integration.teardown().await?;
    }
    tracing::info!("rfhubd stopped");
    Ok(())
}
