//! Barbería dormilona: N barberos, M sillas de espera y clientes que llegan
//! todos a la vez.
//!
//! El corazón es el monitor [`shop::Shop`]. Los clientes llaman
//! [`visit`](shop::Shop::visit) y después [`leave`](shop::Shop::leave); los
//! barberos llaman en loop [`hello_customer`](shop::Shop::hello_customer) y
//! [`bye_customer`](shop::Shop::bye_customer). La [`simulation`] arma los
//! hilos alrededor del monitor.

pub mod error;
pub mod shop;
pub mod simulation;

pub use error::ShopError;
pub use shop::{BarberId, CustomerId, Shop, Visit};

use simulation::{SimulationConfig, SimulationReport};

pub fn init_logger() {
    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_max_level(tracing::Level::INFO)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

/// Punto de entrada del binario: parsea los argumentos y corre la simulación.
pub fn run() -> Result<SimulationReport, ShopError> {
    init_logger();
    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = SimulationConfig::from_args(&args)?;
    simulation::run(&config)
}
