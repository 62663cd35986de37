//! Contador de sillas de espera.
//!
//! Vive bajo el lock de clientes: decide si un cliente que llega se sienta a
//! esperar o se va (drop-off).

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeatCounter {
    capacity: usize,
    available: usize,
    drop_offs: usize,
}

impl SeatCounter {
    pub fn new(capacity: usize) -> Self {
        SeatCounter {
            capacity,
            available: capacity,
            drop_offs: 0,
        }
    }

    /// Intenta ocupar una silla. Si no hay, cuenta un drop-off y devuelve `false`.
    pub fn take_seat(&mut self) -> bool {
        if self.available == 0 {
            self.drop_offs += 1;
            return false;
        }
        self.available -= 1;
        true
    }

    /// Libera una silla: el cliente pasó al sillón del barbero (o se fue).
    pub fn vacate(&mut self) {
        debug_assert!(self.available < self.capacity, "se liberó una silla de más");
        self.available = (self.available + 1).min(self.capacity);
    }

    pub fn available(&self) -> usize {
        self.available
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn drop_offs(&self) -> usize {
        self.drop_offs
    }
}
