//! Par de locks con orden fijo: primero clientes, después barberos.
//!
//! La única forma de tener los dos tomados a la vez es pedir el de barberos a
//! partir del guard de clientes ([`CustomerGuard::barbers`]). El guard de
//! barberos queda atado al préstamo del de clientes, así que se suelta antes.
//! [`OrderedLocks::barbers`] devuelve un guard común que no llega al lado de
//! clientes.

use std::ops::{Deref, DerefMut};
use std::sync::{Condvar, Mutex, MutexGuard};
use std::time::Duration;

use crate::error::ShopError;

pub struct OrderedLocks<C, B> {
    customers: Mutex<C>,
    barbers: Mutex<B>,
}

impl<C, B> OrderedLocks<C, B> {
    pub fn new(customers: C, barbers: B) -> Self {
        OrderedLocks {
            customers: Mutex::new(customers),
            barbers: Mutex::new(barbers),
        }
    }

    pub fn customers(&self, op: &'static str) -> Result<CustomerGuard<'_, C, B>, ShopError> {
        let guard = self
            .customers
            .lock()
            .map_err(|_| ShopError::LockPoisoned(op))?;
        Ok(CustomerGuard {
            guard,
            barbers: &self.barbers,
        })
    }

    pub fn barbers(&self, op: &'static str) -> Result<MutexGuard<'_, B>, ShopError> {
        self.barbers.lock().map_err(|_| ShopError::LockPoisoned(op))
    }
}

pub struct CustomerGuard<'a, C, B> {
    guard: MutexGuard<'a, C>,
    barbers: &'a Mutex<B>,
}

impl<'a, C, B> CustomerGuard<'a, C, B> {
    /// Toma el lock de barberos anidado dentro del de clientes.
    pub fn barbers(&self, op: &'static str) -> Result<MutexGuard<'_, B>, ShopError> {
        self.barbers.lock().map_err(|_| ShopError::LockPoisoned(op))
    }

    /// Espera en `condvar` soltando el lock de clientes, a lo sumo `timeout`.
    pub fn wait_timeout(
        self,
        condvar: &Condvar,
        timeout: Duration,
        op: &'static str,
    ) -> Result<Self, ShopError> {
        let CustomerGuard { guard, barbers } = self;
        let (guard, _) = condvar
            .wait_timeout(guard, timeout)
            .map_err(|_| ShopError::LockPoisoned(op))?;
        Ok(CustomerGuard { guard, barbers })
    }
}

impl<C, B> Deref for CustomerGuard<'_, C, B> {
    type Target = C;

    fn deref(&self) -> &C {
        &self.guard
    }
}

impl<C, B> DerefMut for CustomerGuard<'_, C, B> {
    fn deref_mut(&mut self) -> &mut C {
        &mut self.guard
    }
}
