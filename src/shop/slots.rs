//! Tabla de sillones de servicio: un sillón por barbero.
//!
//! Cada servicio recorre `Empty -> Reserved -> Occupied -> Empty`. La reserva
//! la hace el cliente al sacar al barbero de la cola libre, así el barbero no
//! vuelve a ofrecerse antes de que el cliente se siente.

use crate::error::ShopError;

use super::{BarberId, CustomerId};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ServiceSlot {
    #[default]
    Empty,
    Reserved(CustomerId),
    Occupied(CustomerId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceSlotTable {
    slots: Vec<ServiceSlot>,
}

impl ServiceSlotTable {
    pub fn new(barbers: usize) -> Self {
        ServiceSlotTable {
            slots: vec![ServiceSlot::Empty; barbers],
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get(&self, barber: BarberId) -> Result<ServiceSlot, ShopError> {
        self.slots
            .get(barber)
            .copied()
            .ok_or(ShopError::UnknownBarber(barber))
    }

    /// Cliente sentado en el sillón del barbero, si lo hay.
    pub fn occupant(&self, barber: BarberId) -> Option<CustomerId> {
        match self.slots.get(barber) {
            Some(ServiceSlot::Occupied(customer)) => Some(*customer),
            _ => None,
        }
    }

    /// `Empty -> Reserved(customer)`
    pub fn reserve(&mut self, barber: BarberId, customer: CustomerId) -> Result<(), ShopError> {
        let slot = self.slot_mut(barber)?;
        match *slot {
            ServiceSlot::Empty => {
                *slot = ServiceSlot::Reserved(customer);
                Ok(())
            }
            other => Err(ShopError::InvalidSlotTransition { barber, slot: other }),
        }
    }

    /// `Reserved(customer) -> Occupied(customer)`
    pub fn occupy(&mut self, barber: BarberId, customer: CustomerId) -> Result<(), ShopError> {
        let slot = self.slot_mut(barber)?;
        match *slot {
            ServiceSlot::Reserved(reserved) if reserved == customer => {
                *slot = ServiceSlot::Occupied(customer);
                Ok(())
            }
            other => Err(ShopError::InvalidSlotTransition { barber, slot: other }),
        }
    }

    /// `Occupied(customer) -> Empty`. Devuelve el cliente que se levanta.
    pub fn release(&mut self, barber: BarberId) -> Result<CustomerId, ShopError> {
        let slot = self.slot_mut(barber)?;
        match *slot {
            ServiceSlot::Occupied(customer) => {
                *slot = ServiceSlot::Empty;
                Ok(customer)
            }
            other => Err(ShopError::InvalidSlotTransition { barber, slot: other }),
        }
    }

    fn slot_mut(&mut self, barber: BarberId) -> Result<&mut ServiceSlot, ShopError> {
        self.slots
            .get_mut(barber)
            .ok_or(ShopError::UnknownBarber(barber))
    }
}
