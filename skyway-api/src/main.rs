use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use skyway_api::{app, AppState, AuthConfig, Ports};
use skyway_core::Notifier;
use skyway_store::{
    app_config::Config, AmadeusClient, DbClient, LogNotifier, PgBookingLedger, PgIdentityStore,
    SmtpNotifier, StripeClient,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "skyway_api=debug,skyway_booking=debug,skyway_store=info,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting Skyway API on port {}", config.server.port);

    // Postgres
    let db = DbClient::new(&config.database)
        .await
        .context("Failed to connect to Postgres")?;
    db.migrate().await.context("Failed to run migrations")?;

    // Outbound providers
    let inventory = AmadeusClient::new(&config.amadeus).context("Failed to build Amadeus client")?;
    let payments = StripeClient::new(&config.stripe).context("Failed to build Stripe client")?;
    let notifier: Arc<dyn Notifier> = match &config.mail {
        Some(mail) => Arc::new(SmtpNotifier::new(mail).context("Failed to configure SMTP")?),
        None => {
            tracing::warn!("No [mail] section configured, notifications will only be logged");
            Arc::new(LogNotifier)
        }
    };

    let ports = Ports {
        identity: Arc::new(PgIdentityStore::new(db.pool.clone())),
        inventory: Arc::new(inventory),
        payments: Arc::new(payments),
        ledger: Arc::new(PgBookingLedger::new(db.pool.clone())),
        notifier,
    };
    let state = AppState::new(
        ports,
        AuthConfig::from(&config.auth),
        &config.stripe.currency,
        &config.resiliency,
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app(state)).await?;
    Ok(())
}
