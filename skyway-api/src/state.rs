use std::sync::Arc;
use std::time::Duration;

use skyway_booking::{BookingLedger, BookingOrchestrator, PaymentOrchestrator};
use skyway_core::{IdentityStore, InventoryClient, Notifier, PaymentGateway};
use skyway_store::app_config::ResiliencyConfig;

use crate::accounts::AccountService;
use crate::middleware::resiliency::CircuitBreaker;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
    /// Bearer token lifetime in seconds.
    pub expiration: u64,
    /// Activation token lifetime in seconds.
    pub activation_expiration: u64,
    pub frontend_base_url: String,
}

impl From<&skyway_store::app_config::AuthConfig> for AuthConfig {
    fn from(cfg: &skyway_store::app_config::AuthConfig) -> Self {
        Self {
            secret: cfg.jwt_secret.clone(),
            expiration: cfg.jwt_expiration_seconds,
            activation_expiration: cfg.activation_expiration_seconds,
            frontend_base_url: cfg.frontend_base_url.trim_end_matches('/').to_string(),
        }
    }
}

pub struct ResiliencyState {
    pub payment_cb: CircuitBreaker,
    pub flights_cb: CircuitBreaker,
}

#[derive(Clone)]
pub struct AppState {
    pub accounts: Arc<AccountService>,
    pub bookings: Arc<BookingOrchestrator>,
    pub payments: Arc<PaymentOrchestrator>,
    pub inventory: Arc<dyn InventoryClient>,
    pub auth: AuthConfig,
    pub resiliency: Arc<ResiliencyState>,
}

/// The adapters behind every port, built once at startup.
pub struct Ports {
    pub identity: Arc<dyn IdentityStore>,
    pub inventory: Arc<dyn InventoryClient>,
    pub payments: Arc<dyn PaymentGateway>,
    pub ledger: Arc<dyn BookingLedger>,
    pub notifier: Arc<dyn Notifier>,
}

impl AppState {
    pub fn new(ports: Ports, auth: AuthConfig, currency: &str, resiliency: &ResiliencyConfig) -> Self {
        let accounts = AccountService::new(ports.identity.clone(), ports.notifier.clone(), auth.clone());
        let bookings = BookingOrchestrator::new(
            ports.identity.clone(),
            ports.inventory.clone(),
            ports.payments.clone(),
            ports.ledger,
            ports.notifier,
        );
        let payments = PaymentOrchestrator::new(ports.identity, ports.payments).with_currency(currency);
        let reset = Duration::from_secs(resiliency.reset_timeout_seconds);

        Self {
            accounts: Arc::new(accounts),
            bookings: Arc::new(bookings),
            payments: Arc::new(payments),
            inventory: ports.inventory,
            auth,
            resiliency: Arc::new(ResiliencyState {
                payment_cb: CircuitBreaker::new("payment", resiliency.failure_threshold, reset),
                flights_cb: CircuitBreaker::new("flights", resiliency.failure_threshold, reset),
            }),
        }
    }
}
