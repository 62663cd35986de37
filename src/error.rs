//! Errores de la barbería.
//!
//! Un cliente rechazado por falta de sillas NO es un error: es el valor
//! [`Visit::Rejected`](crate::shop::Visit::Rejected).

use std::{error::Error, fmt};

use crate::shop::{slots::ServiceSlot, BarberId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShopError {
    /// Algún hilo entró en pánico con un lock tomado. Lleva la operación que lo detectó.
    LockPoisoned(&'static str),
    UnknownBarber(BarberId),
    /// Transición de sillón inválida (ej: `bye_customer` sin cliente sentado).
    InvalidSlotTransition { barber: BarberId, slot: ServiceSlot },
    /// La barbería cerró mientras el cliente esperaba en una silla.
    Closed,
    /// Un hilo de barbero terminó antes de ofrecerse.
    BarberExited,
    ArgsParsingError(String),
    ThreadPanicked(String),
}

impl fmt::Display for ShopError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl Error for ShopError {}
