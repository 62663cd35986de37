use std::collections::VecDeque;

use super::BarberId;

/// Cola de barberos libres. El primero que quedó libre es el primero en ser tomado.
///
/// Un mismo barbero aparece a lo sumo una vez.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FreeBarberQueue {
    barbers: VecDeque<BarberId>,
}

impl FreeBarberQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Encola al barbero si no estaba. Devuelve `true` si lo agregó.
    pub fn push_if_absent(&mut self, barber: BarberId) -> bool {
        if self.contains(barber) {
            return false;
        }
        self.barbers.push_back(barber);
        true
    }

    pub fn pop_front(&mut self) -> Option<BarberId> {
        self.barbers.pop_front()
    }

    /// Saca al barbero de la cola (al cerrar la barbería).
    pub fn remove(&mut self, barber: BarberId) -> bool {
        match self.barbers.iter().position(|&b| b == barber) {
            Some(index) => self.barbers.remove(index).is_some(),
            None => false,
        }
    }

    pub fn contains(&self, barber: BarberId) -> bool {
        self.barbers.contains(&barber)
    }

    pub fn len(&self) -> usize {
        self.barbers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.barbers.is_empty()
    }
}
