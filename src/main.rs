use std::process;
use std::sync::Arc;

use axum::Router;
use ledger_service::{
    config::Config,
    db::{self, Stores},
    routes,
    services::{AccountService, TransactionProcessor},
};
use tokio::net::TcpListener;
use tracing_subscriber::{fmt::{writer::BoxMakeWriter, Layer}, layer::SubscriberExt, EnvFilter, Registry};

#[tokio::main]
async fn main() {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Invalid configuration: {err}");
            process::exit(1);
        }
    };

    // add tracing layer
    let file_appender = tracing_appender::rolling::never(".", &config.log_file);
    let (file_writer, _file_guard) = tracing_appender::non_blocking(file_appender);
    let (stdout_writer, _stdout_guard) = tracing_appender::non_blocking(std::io::stdout());

    // json lines go to the log file, plain text to stdout
    let file_layer = Layer::new().json().with_writer(BoxMakeWriter::new(move || file_writer.clone()));
    let stdout_layer = Layer::new().with_writer(BoxMakeWriter::new(move || stdout_writer.clone()));

    let subscriber = Registry::default()
        .with(EnvFilter::from_default_env())
        .with(file_layer)
        .with(stdout_layer);

    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Unable to set global subscriber: {err}");
        process::exit(1);
    }

    let stores = match db::connect_stores(&config).await {
        Ok(stores) => stores,
        Err(err) => {
            tracing::error!("Failed to open stores: {}", err);
            process::exit(1);
        }
    };

    let listener = match TcpListener::bind(("0.0.0.0", config.port)).await {
        Ok(listener) => {
            tracing::info!("Listening on port: {}", config.port);
            listener
        }
        Err(err) => {
            tracing::error!("Failed to bind to port: {}", err);
            process::exit(1);
        }
    };

    let router = process_begin(stores, &config);
    tracing::info!("Routes constructed successfully");

    //start the http service
    let http_service = axum::serve(listener, router);
    if let Err(err) = http_service.await {
        tracing::error!("Failed to start server: {}", err);
        process::exit(1);
    }
}

fn process_begin((accounts, transactions): Stores, config: &Config) -> Router {
    let processor = Arc::new(TransactionProcessor::new(accounts.clone(), transactions));
    let account_service = Arc::new(AccountService::new(accounts, config.account_defaults.clone()));
    routes::router(processor, account_service)
}
