//! SPI bus access and the chip-select guard that scopes a transaction.

/// A byte-at-a-time full-duplex SPI transaction. Implemented by whatever
/// owns the MCU's SPI peripheral; this driver never touches registers
/// directly so it stays portable across targets.
pub trait SpiBus {
    /// Shifts `out` onto MOSI and returns what came back on MISO.
    fn transfer(&mut self, out: u8) -> u8;

    /// Shifts a single 0xFF byte (common "give me a byte" idiom while
    /// reading a response) and returns what came back.
    fn read_byte(&mut self) -> u8 {
        self.transfer(0xFF)
    }

    fn write_byte(&mut self, out: u8) {
        self.transfer(out);
    }

    fn assert_cs(&mut self);
    fn deassert_cs(&mut self);
}

/// Scoped chip-select guard: asserts CS on construction, deasserts on
/// drop, so no early return can leave the card selected.
pub struct CsGuard<'a, S: SpiBus> {
    bus: &'a mut S,
}

impl<'a, S: SpiBus> CsGuard<'a, S> {
    pub fn new(bus: &'a mut S) -> Self {
        bus.assert_cs();
        CsGuard { bus }
    }

    pub fn bus(&mut self) -> &mut S {
        &mut *self.bus
    }
}

impl<'a, S: SpiBus> Drop for CsGuard<'a, S> {
    fn drop(&mut self) {
        self.bus.deassert_cs();
    }
}
