use onboard_auth::config::auth::AuthConfig;
use onboard_auth::config::database::Database;
use onboard_auth::config::invite::InviteConfig;
use onboard_auth::config::{logging, parameter};
use onboard_auth::handler::health_handler;
use onboard_auth::routes;
use onboard_auth::state::auth_state::AuthState;
use onboard_auth::state::health_state::HealthState;
use onboard_auth::state::invite_state::InviteState;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    parameter::init();
    logging::init_subscriber();
    logging::init();
    info!("Starting onboarding auth service...");

    health_handler::init_start_time();

    // Fail fast on missing or weak signing configuration.
    let auth_config = match AuthConfig::from_parameters() {
        Ok(config) => Arc::new(config),
        Err(e) => {
            error!("Invalid auth configuration: {}", e);
            return Err(e.into());
        }
    };
    let invite_config = match InviteConfig::from_parameters() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid invite configuration: {}", e);
            return Err(e.into());
        }
    };
    let request_timeout = Duration::from_secs(parameter::get_u64("REQUEST_TIMEOUT_SECONDS")?);

    let connection = match Database::init().await {
        Ok(conn) => {
            info!("Database connection established successfully");
            Arc::new(conn)
        }
        Err(e) => {
            error!("Failed to initialize database: {}", e);
            return Err(e.into());
        }
    };
    if let Err(e) = connection.migrate().await {
        error!("Failed to apply migrations: {}", e);
        return Err(e.into());
    }

    let auth_state = AuthState::new(&connection, auth_config);
    let invite_state = InviteState::new(&connection, &invite_config)?;
    let health_state = HealthState::new(&connection);
    let app = routes::root::routes(auth_state, invite_state, health_state, request_timeout);

    let server_address = parameter::get_required("SERVER_ADDRESS")?;
    let server_port = parameter::get_required("SERVER_PORT")?;
    let host = format!("{}:{}", server_address, server_port);

    let listener = match tokio::net::TcpListener::bind(&host).await {
        Ok(listener) => {
            info!("Server successfully bound to {}", host);
            listener
        }
        Err(e) => {
            error!("Failed to bind to {}: {}", host, e);
            return Err(e.into());
        }
    };

    match axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        Ok(()) => {
            info!("Server shutdown gracefully");
            Ok(())
        }
        Err(e) => {
            error!("Server error: {}", e);
            Err(e.into())
        }
    }
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received shutdown signal, initiating graceful shutdown..."),
        Err(err) => error!("Unable to listen for shutdown signal: {}", err),
    }
}
