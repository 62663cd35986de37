//! Simulación: un hilo por barbero, un hilo por cliente.
//!
//! Los barberos trabajan hasta que la barbería cierra, cosa que pasa recién
//! cuando terminaron todos los clientes.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use rand::{thread_rng, Rng};
use std_semaphore::Semaphore;
use tracing::{debug, error, info};

use crate::error::ShopError;
use crate::shop::{BarberId, CustomerId, Shop, Visit, DEFAULT_WAIT_TIMEOUT};

/// Pausa máxima (al azar) entre un cliente que entra y el siguiente.
pub const DEFAULT_ARRIVAL_JITTER: Duration = Duration::from_micros(1000);

const USAGE: &str = "Usage: barberia-dormilona <barbers> <chairs> <customers> <service_time_us>";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationConfig {
    pub barbers: usize,
    pub chairs: usize,
    pub customers: usize,
    pub service_time: Duration,
    pub arrival_jitter: Duration,
    pub wait_timeout: Duration,
}

impl SimulationConfig {
    pub fn new(barbers: usize, chairs: usize, customers: usize, service_time: Duration) -> Self {
        SimulationConfig {
            barbers,
            chairs,
            customers,
            service_time,
            arrival_jitter: DEFAULT_ARRIVAL_JITTER,
            wait_timeout: DEFAULT_WAIT_TIMEOUT,
        }
    }

    /// Parsea los cuatro argumentos posicionales (sin el nombre del programa).
    /// El tiempo de servicio va en microsegundos.
    pub fn from_args(args: &[String]) -> Result<Self, ShopError> {
        if args.len() != 4 {
            error!("[Barbería] Cantidad de argumentos inválida: {}", args.len());
            return Err(ShopError::ArgsParsingError(USAGE.to_string()));
        }

        let barbers = parse_arg(&args[0], "barbers")?;
        let chairs = parse_arg(&args[1], "chairs")?;
        let customers = parse_arg(&args[2], "customers")?;
        let service_time = Duration::from_micros(parse_arg(&args[3], "service_time_us")? as u64);

        if barbers == 0 {
            error!("[Barbería] Se necesita al menos un barbero");
            return Err(ShopError::ArgsParsingError(String::from(
                "Invalid number of barbers",
            )));
        }

        Ok(SimulationConfig::new(barbers, chairs, customers, service_time))
    }
}

fn parse_arg(arg: &str, name: &str) -> Result<usize, ShopError> {
    arg.parse::<usize>().map_err(|err| {
        error!("[Barbería] Valor inválido para {}: {} ({})", name, arg, err);
        ShopError::ArgsParsingError(format!("Invalid {}: {}", name, arg))
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulationReport {
    pub customers: usize,
    pub served: usize,
    pub drop_offs: usize,
}

pub fn run(config: &SimulationConfig) -> Result<SimulationReport, ShopError> {
    if config.barbers == 0 {
        return Err(ShopError::ArgsParsingError(String::from(
            "Invalid number of barbers",
        )));
    }
    info!(
        "[Barbería] barberos: {} sillas: {} clientes: {} tiempo de servicio: {:?}",
        config.barbers, config.chairs, config.customers, config.service_time
    );

    let shop = Arc::new(Shop::with_wait_timeout(
        config.barbers,
        config.chairs,
        config.wait_timeout,
    ));

    let barbers: Vec<JoinHandle<Result<usize, ShopError>>> = (0..config.barbers)
        .map(|id| {
            let shop_barber = shop.clone();
            let service_time = config.service_time;
            thread::spawn(move || barber(id, &shop_barber, service_time))
        })
        .collect();

    // que todos los barberos estén ofreciéndose antes de abrir la puerta
    if let Err(err) = wait_for_barbers(&shop, &barbers) {
        error!("[Barbería] Los barberos no llegaron a abrir: {}", err);
        let _ = shop.close();
        for handle in barbers {
            let _ = join(handle, "barbero");
        }
        return Err(err);
    }
    let mut result: Result<(), ShopError> = Ok(());

    // la puerta arranca cerrada; se deja pasar de a un cliente, con una pausa
    // al azar entre uno y otro (sin pausa: entran todos de golpe)
    let door = Arc::new(Semaphore::new(0));
    let customers: Vec<JoinHandle<Result<Visit, ShopError>>> = (1..=config.customers)
        .map(|id| {
            let shop_customer = shop.clone();
            let door_customer = door.clone();
            thread::spawn(move || {
                door_customer.acquire();
                customer(id, &shop_customer)
            })
        })
        .collect();
    for _ in 0..config.customers {
        thread::sleep(arrival_gap(config.arrival_jitter));
        door.release();
    }

    let mut served_customers = 0;
    for handle in customers {
        match join(handle, "cliente") {
            Ok(Visit::Assigned(_)) => served_customers += 1,
            Ok(Visit::Rejected) => {}
            Err(err) => {
                error!("[Barbería] Falló un cliente: {}", err);
                result = result.and(Err(err));
            }
        }
    }

    result = result.and(shop.close());
    for handle in barbers {
        match join(handle, "barbero") {
            Ok(haircuts) => debug!("[Barbería] Un barbero se fue tras {} cortes", haircuts),
            Err(err) => {
                error!("[Barbería] Falló un barbero: {}", err);
                result = result.and(Err(err));
            }
        }
    }
    result?;

    let report = SimulationReport {
        customers: config.customers,
        served: shop.served()?,
        drop_offs: shop.drop_offs()?,
    };
    debug_assert_eq!(report.served, served_customers);
    info!(
        "# customers who didn't receive a service = {}",
        report.drop_offs
    );
    Ok(report)
}

fn barber(id: BarberId, shop: &Shop, service_time: Duration) -> Result<usize, ShopError> {
    let mut haircuts = 0;
    while shop.hello_customer(id)?.is_some() {
        // el corte se hace fuera de cualquier lock
        thread::sleep(service_time);
        shop.bye_customer(id)?;
        haircuts += 1;
    }
    Ok(haircuts)
}

fn customer(id: CustomerId, shop: &Shop) -> Result<Visit, ShopError> {
    let visit = shop.visit(id)?;
    if let Visit::Assigned(barber) = visit {
        shop.leave(id, barber)?;
    }
    Ok(visit)
}

/// Pausa al azar en `[0, jitter)` antes de dejar entrar al próximo cliente.
fn arrival_gap(jitter: Duration) -> Duration {
    let max = u64::try_from(jitter.as_micros()).unwrap_or(u64::MAX);
    if max == 0 {
        return Duration::ZERO;
    }
    Duration::from_micros(thread_rng().gen_range(0..max))
}

/// Espera a que todos los barberos estén en la cola de libres. Si alguno
/// terminó antes de ofrecerse no va a llegar nunca: error.
fn wait_for_barbers<T>(shop: &Shop, barbers: &[JoinHandle<T>]) -> Result<(), ShopError> {
    let start = Instant::now();
    while shop.idle_barbers()? < barbers.len() {
        if barbers.iter().any(|handle| handle.is_finished()) {
            return Err(ShopError::BarberExited);
        }
        thread::sleep(Duration::from_millis(1));
    }
    debug!("[Barbería] Barberos listos en {:?}", start.elapsed());
    Ok(())
}

fn join<T>(handle: JoinHandle<Result<T, ShopError>>, role: &str) -> Result<T, ShopError> {
    handle
        .join()
        .map_err(|_| ShopError::ThreadPanicked(role.to_string()))?
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test01_parses_four_positional_arguments() -> Result<(), ShopError> {
        let config = SimulationConfig::from_args(&args(&["3", "5", "20", "1500"]))?;

        assert_eq!(config.barbers, 3);
        assert_eq!(config.chairs, 5);
        assert_eq!(config.customers, 20);
        assert_eq!(config.service_time, Duration::from_micros(1500));
        assert_eq!(config.arrival_jitter, DEFAULT_ARRIVAL_JITTER);
        assert_eq!(config.wait_timeout, DEFAULT_WAIT_TIMEOUT);
        Ok(())
    }

    #[test]
    fn test02_wrong_argument_count_is_a_usage_error() {
        assert_eq!(
            SimulationConfig::from_args(&args(&["1", "2", "3"])),
            Err(ShopError::ArgsParsingError(USAGE.to_string()))
        );
        assert!(SimulationConfig::from_args(&args(&["1", "2", "3", "4", "5"])).is_err());
        assert!(SimulationConfig::from_args(&[]).is_err());
    }

    #[test]
    fn test03_non_numeric_argument_is_rejected() {
        assert_eq!(
            SimulationConfig::from_args(&args(&["1", "dos", "3", "0"])),
            Err(ShopError::ArgsParsingError("Invalid chairs: dos".to_string()))
        );
        assert!(SimulationConfig::from_args(&args(&["-1", "2", "3", "0"])).is_err());
    }

    #[test]
    fn test04_zero_barbers_is_rejected() {
        assert!(SimulationConfig::from_args(&args(&["0", "2", "3", "0"])).is_err());
        let config = SimulationConfig::new(0, 1, 1, Duration::ZERO);
        assert!(run(&config).is_err());
    }

    #[test]
    fn test05_arrival_gap_stays_below_the_jitter() {
        assert_eq!(arrival_gap(Duration::ZERO), Duration::ZERO);
        for _ in 0..100 {
            assert!(arrival_gap(DEFAULT_ARRIVAL_JITTER) < DEFAULT_ARRIVAL_JITTER);
        }
        // no se trunca: una demora enorme sigue siendo válida
        assert!(arrival_gap(Duration::MAX) < Duration::MAX);
    }

    #[test]
    fn test06_barber_gone_before_opening_is_an_error() {
        let shop = Shop::with_wait_timeout(1, 1, Duration::from_millis(5));
        let barbers: Vec<JoinHandle<Result<usize, ShopError>>> =
            vec![thread::spawn(|| Err(ShopError::UnknownBarber(0)))];

        assert_eq!(
            wait_for_barbers(&shop, &barbers),
            Err(ShopError::BarberExited)
        );
    }

    #[test]
    fn test07_zero_customers_finishes_with_empty_report() -> Result<(), ShopError> {
        let mut config = SimulationConfig::new(2, 2, 0, Duration::ZERO);
        config.wait_timeout = Duration::from_millis(5);

        let report = run(&config)?;
        assert_eq!(
            report,
            SimulationReport {
                customers: 0,
                served: 0,
                drop_offs: 0
            }
        );
        Ok(())
    }
}
