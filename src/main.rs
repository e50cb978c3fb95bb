use blogproject::configuration::get_configuration;
use blogproject::startup::Application;
use blogproject::telemetry::init_telemetry;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // Misconfiguration stops the process before anything is served
    let configuration = get_configuration().map_err(|e| {
        eprintln!("Failed to read configuration: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "Configuration error")
    })?;

    init_telemetry(&configuration.application.log_level);
    tracing::info!("Configuration loaded successfully");

    let application = Application::build(configuration).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to build application");
        std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
    })?;

    tracing::info!(port = application.port(), "Server started successfully");
    application.run_until_stopped().await
}
