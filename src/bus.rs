//! The serial bus capability consumed by the chip drivers.
//!
//! The drivers only ever need three operations: assert the chip select,
//! release it, and exchange one byte in full duplex. Everything else
//! (which peripheral, which pins, bit-banged or hardware-assisted) is
//! the implementer's business. The trait is object-safe, but the
//! drivers take it as a type parameter so the usual deployment is fully
//! statically dispatched.

use core::convert::Infallible;

use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiBus as HalSpiBus;

/// A three-operation serial bus with an exclusive chip-select line.
///
/// Contract: every [`select`](Bus::select) is matched by a
/// [`deselect`](Bus::deselect) before the driver returns, on every
/// path; [`transfer`](Bus::transfer) is synchronous and blocking.
pub trait Bus {
    /// Assert the chip select (typically drives CS low).
    fn select(&mut self);

    /// Release the chip select.
    fn deselect(&mut self);

    /// Exchange one byte in full duplex: shift `byte` out and return
    /// the byte shifted in by the device.
    fn transfer(&mut self, byte: u8) -> u8;
}

impl<T: Bus + ?Sized> Bus for &mut T {
    fn select(&mut self) {
        (**self).select();
    }

    fn deselect(&mut self) {
        (**self).deselect();
    }

    fn transfer(&mut self, byte: u8) -> u8 {
        (**self).transfer(byte)
    }
}

/// An [embedded-hal] SPI bus paired with a chip-select output pin.
///
/// This is the glue for the common deployment: a hardware SPI
/// peripheral plus a GPIO driving CS. The pin and bus error types must
/// be [`Infallible`]: the capability contract has no failure channel,
/// and on the bare-metal HALs where these drivers live, pin writes and
/// polled transfers genuinely cannot fail. Fallible buses need a custom
/// [`Bus`] implementation that decides an error policy.
///
/// [embedded-hal]: https://docs.rs/embedded-hal
pub struct SpiPair<SPI, CS> {
    spi: SPI,
    cs: CS,
}

impl<SPI, CS> SpiPair<SPI, CS> {
    pub const fn new(spi: SPI, cs: CS) -> Self {
        Self { spi, cs }
    }

    /// Tear the pair apart again, e.g. to reuse the SPI peripheral.
    pub fn release(self) -> (SPI, CS) {
        (self.spi, self.cs)
    }
}

impl<SPI, CS> Bus for SpiPair<SPI, CS>
where
    SPI: HalSpiBus<u8, Error = Infallible>,
    CS: OutputPin<Error = Infallible>,
{
    fn select(&mut self) {
        into_ok(self.cs.set_low());
    }

    fn deselect(&mut self) {
        // make sure every clocked byte reached the wire while CS is
        // still asserted
        into_ok(self.spi.flush());
        into_ok(self.cs.set_high());
    }

    fn transfer(&mut self, byte: u8) -> u8 {
        let mut exchange = [byte];
        into_ok(self.spi.transfer_in_place(&mut exchange));
        exchange[0]
    }
}

fn into_ok<T>(result: Result<T, Infallible>) -> T {
    match result {
        Ok(value) => value,
        Err(error) => match error {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use embedded_hal::digital::ErrorType as PinErrorType;
    use embedded_hal::spi::ErrorType as SpiErrorType;

    #[derive(Default)]
    struct TraceSpi {
        written: std::vec::Vec<u8>,
        flushed: usize,
    }

    impl SpiErrorType for TraceSpi {
        type Error = Infallible;
    }

    impl HalSpiBus<u8> for TraceSpi {
        fn read(&mut self, words: &mut [u8]) -> Result<(), Infallible> {
            words.fill(0xA5);
            Ok(())
        }

        fn write(&mut self, words: &[u8]) -> Result<(), Infallible> {
            self.written.extend_from_slice(words);
            Ok(())
        }

        fn transfer(&mut self, read: &mut [u8], write: &[u8]) -> Result<(), Infallible> {
            self.written.extend_from_slice(write);
            read.fill(0xA5);
            Ok(())
        }

        fn transfer_in_place(&mut self, words: &mut [u8]) -> Result<(), Infallible> {
            self.written.extend_from_slice(words);
            words.fill(0xA5);
            Ok(())
        }

        fn flush(&mut self) -> Result<(), Infallible> {
            self.flushed += 1;
            Ok(())
        }
    }

    #[derive(Default)]
    struct TracePin {
        levels: std::vec::Vec<bool>,
    }

    impl PinErrorType for TracePin {
        type Error = Infallible;
    }

    impl OutputPin for TracePin {
        fn set_low(&mut self) -> Result<(), Infallible> {
            self.levels.push(false);
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Infallible> {
            self.levels.push(true);
            Ok(())
        }
    }

    #[test]
    fn spi_pair_frames_a_transfer() {
        let mut pair = SpiPair::new(TraceSpi::default(), TracePin::default());
        pair.select();
        assert_eq!(pair.transfer(0x9F), 0xA5);
        pair.deselect();

        let (spi, cs) = pair.release();
        assert_eq!(spi.written, [0x9F]);
        assert_eq!(cs.levels, [false, true]);
        // flush happened before CS went high
        assert_eq!(spi.flushed, 1);
    }
}
