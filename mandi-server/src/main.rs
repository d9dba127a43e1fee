use mandi_server::{Config, Server, init_logger_with_file, print_banner};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // 1. Environment and configuration
    dotenv::dotenv().ok();
    let config = Config::from_env()?;

    // 2. Logging (directories must exist before the file appender opens)
    config.ensure_work_dir_structure()?;
    init_logger_with_file(None, config.log_dir.as_deref());

    print_banner();

    tracing::info!("Mandi server starting...");

    // 3. Serve until shutdown (Server::run starts the background pipeline)
    let server = Server::new(config);
    if let Err(e) = server.run().await {
        tracing::error!("Server error: {}", e);
        return Err(e.into());
    }

    Ok(())
}
