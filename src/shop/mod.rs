//! Monitor de la barbería.
//!
//! Dos dominios de exclusión: el de clientes (sillas de espera) y el de
//! barberos (cola de libres, sillones, señales de fin de corte). El orden es
//! siempre clientes -> barberos, ver [`locks`].
//!
//! Todas las esperas tienen timeout: los barberos avisan a los clientes sin
//! tener el lock de clientes, así que un aviso puede perderse y el timeout
//! acota cuánto tarda el cliente en volver a mirar.

pub mod free_barbers;
pub mod locks;
pub mod seats;
pub mod slots;

use std::sync::Condvar;
use std::time::Duration;

use tracing::{debug, info};

use crate::error::ShopError;
use free_barbers::FreeBarberQueue;
use locks::OrderedLocks;
use seats::SeatCounter;
use slots::{ServiceSlot, ServiceSlotTable};

pub type BarberId = usize;
pub type CustomerId = usize;

pub const DEFAULT_BARBERS: usize = 1;
pub const DEFAULT_CHAIRS: usize = 3;
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(1);

/// Resultado de entrar a la barbería.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visit {
    Assigned(BarberId),
    Rejected,
}

/// Estado protegido por el lock de barberos.
#[derive(Debug)]
struct BarberSide {
    free: FreeBarberQueue,
    slots: ServiceSlotTable,
    // clientes sentados esperando barbero; lo mantiene `visit` con los dos locks
    waiting: usize,
    served: usize,
    closed: bool,
}

pub struct Shop {
    barber_count: usize,
    chair_count: usize,
    locks: OrderedLocks<SeatCounter, BarberSide>,
    // se espera con el lock de clientes
    barber_available: Condvar,
    // se esperan con el lock de barberos, una por sillón
    barber_wakeups: Vec<Condvar>,
    haircut_done: Vec<Condvar>,
    wait_timeout: Duration,
}

impl Shop {
    pub fn new(barbers: usize, chairs: usize) -> Self {
        Self::with_wait_timeout(barbers, chairs, DEFAULT_WAIT_TIMEOUT)
    }

    pub fn with_wait_timeout(barbers: usize, chairs: usize, wait_timeout: Duration) -> Self {
        let barber_side = BarberSide {
            free: FreeBarberQueue::new(),
            slots: ServiceSlotTable::new(barbers),
            waiting: 0,
            served: 0,
            closed: false,
        };
        Shop {
            barber_count: barbers,
            chair_count: chairs,
            locks: OrderedLocks::new(SeatCounter::new(chairs), barber_side),
            barber_available: Condvar::new(),
            barber_wakeups: (0..barbers).map(|_| Condvar::new()).collect(),
            haircut_done: (0..barbers).map(|_| Condvar::new()).collect(),
            wait_timeout,
        }
    }

    /// Llamado por un cliente al llegar. Bloquea hasta conseguir barbero o
    /// devuelve [`Visit::Rejected`] si no hay sillas de espera.
    pub fn visit(&self, customer: CustomerId) -> Result<Visit, ShopError> {
        let mut customers = self.locks.customers("visit")?;

        if !customers.take_seat() {
            info!(
                "[Cliente {}] Se va: no hay sillas de espera libres",
                customer
            );
            return Ok(Visit::Rejected);
        }
        info!(
            "[Cliente {}] Toma una silla de espera. Sillas libres = {}",
            customer,
            customers.available()
        );

        let mut seated = false;
        let barber = loop {
            let mut barbers = customers.barbers("visit")?;
            if let Some(barber) = barbers.free.pop_front() {
                // lo reservo antes de soltar el lock: que nadie más lo tome
                barbers.slots.reserve(barber, customer)?;
                if seated {
                    barbers.waiting -= 1;
                }
                break barber;
            }
            let closed = barbers.closed;
            if closed && seated {
                barbers.waiting -= 1;
            } else if !closed && !seated {
                barbers.waiting += 1;
                seated = true;
            }
            drop(barbers);

            if closed {
                customers.vacate();
                info!("[Cliente {}] La barbería cerró, se va", customer);
                return Err(ShopError::Closed);
            }
            customers =
                customers.wait_timeout(&self.barber_available, self.wait_timeout, "visit")?;
        };

        customers.vacate();
        Ok(Visit::Assigned(barber))
    }

    /// Llamado por el cliente con el barbero que le dio [`Shop::visit`].
    /// Se sienta en su sillón y espera a que termine el corte.
    pub fn leave(&self, customer: CustomerId, barber: BarberId) -> Result<(), ShopError> {
        let wakeup = self.wakeup(barber)?;
        let done = self.done(barber)?;
        let mut barbers = self.locks.barbers("leave")?;

        barbers.slots.occupy(barber, customer)?;
        info!(
            "[Cliente {}] Pasa al sillón del barbero {}",
            customer, barber
        );
        wakeup.notify_one();

        info!(
            "[Cliente {}] Espera a que el barbero {} termine el corte",
            customer, barber
        );
        while barbers.slots.occupant(barber) == Some(customer) {
            barbers = done
                .wait_timeout(barbers, self.wait_timeout)
                .map_err(|_| ShopError::LockPoisoned("leave"))?
                .0;
        }

        info!("[Cliente {}] Se despide del barbero {}", customer, barber);
        Ok(())
    }

    /// Llamado por el barbero: espera hasta tener un cliente sentado.
    ///
    /// Devuelve `None` si la barbería cerró y no queda nadie por atender.
    pub fn hello_customer(&self, barber: BarberId) -> Result<Option<CustomerId>, ShopError> {
        let wakeup = self.wakeup(barber)?;
        let mut barbers = self.locks.barbers("hello_customer")?;
        let mut sleeping = false;

        loop {
            match barbers.slots.get(barber)? {
                ServiceSlot::Occupied(customer) => {
                    info!(
                        "[Barbero {}] Empieza el corte del cliente {}",
                        barber, customer
                    );
                    return Ok(Some(customer));
                }
                ServiceSlot::Empty if barbers.closed => {
                    barbers.free.remove(barber);
                    info!("[Barbero {}] La barbería cerró, se va", barber);
                    return Ok(None);
                }
                ServiceSlot::Empty => {
                    barbers.free.push_if_absent(barber);
                    if !sleeping && barbers.waiting == 0 {
                        info!("[Barbero {}] Duerme: no hay clientes", barber);
                        sleeping = true;
                    }
                }
                // un cliente ya lo tomó de la cola y está por sentarse
                ServiceSlot::Reserved(customer) => {
                    debug!(
                        "[Barbero {}] Esperando que se siente el cliente {}",
                        barber, customer
                    );
                }
            }

            self.barber_available.notify_one();
            barbers = wakeup
                .wait_timeout(barbers, self.wait_timeout)
                .map_err(|_| ShopError::LockPoisoned("hello_customer"))?
                .0;
        }
    }

    /// Llamado por el barbero al terminar el corte. Despierta a su cliente y
    /// vuelve a la cola de libres. Devuelve el cliente atendido.
    pub fn bye_customer(&self, barber: BarberId) -> Result<CustomerId, ShopError> {
        let done = self.done(barber)?;
        let customer = {
            let mut barbers = self.locks.barbers("bye_customer")?;
            let customer = barbers.slots.release(barber)?;
            done.notify_all();
            barbers.served += 1;
            if !barbers.closed {
                barbers.free.push_if_absent(barber);
            }
            customer
        };
        self.barber_available.notify_one();

        info!(
            "[Barbero {}] Terminó el corte del cliente {}, llama a otro",
            barber, customer
        );
        Ok(customer)
    }

    /// Cierre cooperativo: los barberos sin cliente salen de
    /// [`Shop::hello_customer`] con `None` en la próxima vuelta.
    pub fn close(&self) -> Result<(), ShopError> {
        self.locks.barbers("close")?.closed = true;
        info!("[Barbería] Cerrando");
        for wakeup in &self.barber_wakeups {
            wakeup.notify_all();
        }
        self.barber_available.notify_all();
        Ok(())
    }

    pub fn drop_offs(&self) -> Result<usize, ShopError> {
        Ok(self.locks.customers("drop_offs")?.drop_offs())
    }

    pub fn available_chairs(&self) -> Result<usize, ShopError> {
        Ok(self.locks.customers("available_chairs")?.available())
    }

    pub fn served(&self) -> Result<usize, ShopError> {
        Ok(self.locks.barbers("served")?.served)
    }

    /// Clientes sentados en sillas de espera sin barbero todavía.
    pub fn waiting_customers(&self) -> Result<usize, ShopError> {
        Ok(self.locks.barbers("waiting_customers")?.waiting)
    }

    /// Cantidad de barberos en la cola de libres.
    pub fn idle_barbers(&self) -> Result<usize, ShopError> {
        Ok(self.locks.barbers("idle_barbers")?.free.len())
    }

    pub fn slot(&self, barber: BarberId) -> Result<ServiceSlot, ShopError> {
        self.locks.barbers("slot")?.slots.get(barber)
    }

    pub fn barber_count(&self) -> usize {
        self.barber_count
    }

    pub fn chair_count(&self) -> usize {
        self.chair_count
    }

    fn wakeup(&self, barber: BarberId) -> Result<&Condvar, ShopError> {
        self.barber_wakeups
            .get(barber)
            .ok_or(ShopError::UnknownBarber(barber))
    }

    fn done(&self, barber: BarberId) -> Result<&Condvar, ShopError> {
        self.haircut_done
            .get(barber)
            .ok_or(ShopError::UnknownBarber(barber))
    }
}

impl Default for Shop {
    fn default() -> Self {
        Self::new(DEFAULT_BARBERS, DEFAULT_CHAIRS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Instant;

    const TIMEOUT: Duration = Duration::from_millis(5);

    fn wait_until_idle(shop: &Shop, idle: usize) -> Result<(), ShopError> {
        let start = Instant::now();
        while shop.idle_barbers()? != idle {
            assert!(start.elapsed() < Duration::from_secs(5), "los barberos no se ofrecieron");
            thread::sleep(Duration::from_millis(1));
        }
        Ok(())
    }

    #[test]
    fn test01_default_shop() -> Result<(), ShopError> {
        let shop = Shop::default();
        assert_eq!(shop.barber_count(), DEFAULT_BARBERS);
        assert_eq!(shop.chair_count(), DEFAULT_CHAIRS);
        assert_eq!(shop.available_chairs()?, DEFAULT_CHAIRS);
        assert_eq!(shop.drop_offs()?, 0);
        assert_eq!(shop.served()?, 0);
        Ok(())
    }

    #[test]
    fn test02_no_chairs_rejects_without_touching_barbers() -> Result<(), ShopError> {
        let shop = Shop::with_wait_timeout(2, 0, TIMEOUT);
        assert_eq!(shop.visit(1)?, Visit::Rejected);
        assert_eq!(shop.visit(2)?, Visit::Rejected);
        assert_eq!(shop.drop_offs()?, 2);
        assert_eq!(shop.available_chairs()?, 0);
        assert_eq!(shop.slot(0)?, ServiceSlot::Empty);
        Ok(())
    }

    #[test]
    fn test03_bye_after_repeated_hello_waits_leaves_barber_queued_once() -> Result<(), ShopError> {
        let shop = Arc::new(Shop::with_wait_timeout(1, 1, TIMEOUT));

        let shop_barber = shop.clone();
        let barber = thread::spawn(move || -> Result<CustomerId, ShopError> {
            let customer = shop_barber.hello_customer(0)?;
            assert_eq!(customer, Some(1));
            shop_barber.bye_customer(0)
        });

        wait_until_idle(&shop, 1)?;
        // varias vueltas del loop de espera del barbero
        thread::sleep(TIMEOUT * 10);
        assert_eq!(shop.idle_barbers()?, 1);

        assert_eq!(shop.visit(1)?, Visit::Assigned(0));
        assert_eq!(shop.slot(0)?, ServiceSlot::Reserved(1));
        assert_eq!(shop.available_chairs()?, 1);
        shop.leave(1, 0)?;

        let served = barber
            .join()
            .map_err(|_| ShopError::ThreadPanicked("barbero".to_string()))??;
        assert_eq!(served, 1);
        assert_eq!(shop.slot(0)?, ServiceSlot::Empty);
        assert_eq!(shop.idle_barbers()?, 1);
        assert_eq!(shop.served()?, 1);
        Ok(())
    }

    #[test]
    fn test04_bye_without_customer_is_an_invariant_violation() {
        let shop = Shop::with_wait_timeout(1, 1, TIMEOUT);
        assert_eq!(
            shop.bye_customer(0),
            Err(ShopError::InvalidSlotTransition {
                barber: 0,
                slot: ServiceSlot::Empty
            })
        );
        assert_eq!(shop.served(), Ok(0));
    }

    #[test]
    fn test05_leave_without_visit_is_rejected() {
        let shop = Shop::with_wait_timeout(1, 1, TIMEOUT);
        assert_eq!(
            shop.leave(4, 0),
            Err(ShopError::InvalidSlotTransition {
                barber: 0,
                slot: ServiceSlot::Empty
            })
        );
    }

    #[test]
    fn test06_unknown_barber() {
        let shop = Shop::with_wait_timeout(2, 1, TIMEOUT);
        assert_eq!(shop.hello_customer(2), Err(ShopError::UnknownBarber(2)));
        assert_eq!(shop.bye_customer(9), Err(ShopError::UnknownBarber(9)));
        assert_eq!(shop.leave(1, 5), Err(ShopError::UnknownBarber(5)));
    }

    #[test]
    fn test07_close_wakes_idle_barbers_and_takes_them_off_the_queue() -> Result<(), ShopError> {
        let shop = Arc::new(Shop::with_wait_timeout(2, 1, Duration::from_secs(30)));

        let barbers: Vec<_> = (0..2)
            .map(|id| {
                let shop_barber = shop.clone();
                thread::spawn(move || shop_barber.hello_customer(id))
            })
            .collect();

        wait_until_idle(&shop, 2)?;
        let start = Instant::now();
        shop.close()?;

        for barber in barbers {
            let result = barber
                .join()
                .map_err(|_| ShopError::ThreadPanicked("barbero".to_string()))?;
            assert_eq!(result, Ok(None));
        }
        // el broadcast despierta antes del timeout largo
        assert!(start.elapsed() < Duration::from_secs(10));
        assert_eq!(shop.idle_barbers()?, 0);
        Ok(())
    }

    #[test]
    fn test08_visit_to_closed_shop_without_barbers_gives_the_chair_back() -> Result<(), ShopError> {
        let shop = Shop::with_wait_timeout(1, 2, TIMEOUT);
        shop.close()?;

        assert_eq!(shop.visit(1), Err(ShopError::Closed));
        assert_eq!(shop.waiting_customers()?, 0);
        assert_eq!(shop.available_chairs()?, 2);
        assert_eq!(shop.drop_offs()?, 0);
        Ok(())
    }

    #[test]
    fn test09_waiting_customer_gets_the_barber_that_frees_up() -> Result<(), ShopError> {
        let shop = Arc::new(Shop::with_wait_timeout(1, 2, TIMEOUT));

        // el cliente llega antes que el barbero: se sienta a esperar
        let shop_customer = shop.clone();
        let customer = thread::spawn(move || -> Result<Visit, ShopError> {
            let visit = shop_customer.visit(1)?;
            if let Visit::Assigned(barber) = visit {
                shop_customer.leave(1, barber)?;
            }
            Ok(visit)
        });

        let start = Instant::now();
        while shop.waiting_customers()? != 1 {
            assert!(start.elapsed() < Duration::from_secs(5));
            thread::sleep(Duration::from_millis(1));
        }
        assert_eq!(shop.available_chairs()?, 1);

        assert_eq!(shop.hello_customer(0)?, Some(1));
        assert_eq!(shop.bye_customer(0)?, 1);

        let visit = customer
            .join()
            .map_err(|_| ShopError::ThreadPanicked("cliente".to_string()))??;
        assert_eq!(visit, Visit::Assigned(0));
        assert_eq!(shop.waiting_customers()?, 0);
        assert_eq!(shop.available_chairs()?, 2);
        assert_eq!(shop.served()?, 1);
        Ok(())
    }
}
