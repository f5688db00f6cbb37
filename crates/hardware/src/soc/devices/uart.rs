//! Minimal UART stub.
//!
//! A five-register transmit-only serial port, enough for firmware that probes
//! its console. Receive always reports an empty FIFO; transmitted bytes are
//! collected for the host to drain.

use crate::soc::traits::Device;

/// Transmit FIFO register (write: send byte; read: always 0, never full).
const REG_TXFIFO: u64 = 0;
/// Receive FIFO register (read: 0xff, the "empty" marker).
const REG_RXFIFO: u64 = 4;
/// Transmit control register (accepted, ignored).
const REG_TXCTRL: u64 = 8;
/// Receive control register (accepted, ignored).
const REG_RXCTRL: u64 = 12;
/// Baud divisor register (accepted, ignored).
const REG_DIV: u64 = 16;

/// Size of the MMIO window.
const UART_SIZE: u64 = 0x20;

/// UART stub device.
#[derive(Debug, Default)]
pub struct Uart {
    base_addr: u64,
    tx: Vec<u8>,
    echo: bool,
}

impl Uart {
    /// Creates a UART at `base_addr`.
    pub const fn new(base_addr: u64) -> Self {
        Self {
            base_addr,
            tx: Vec::new(),
            echo: false,
        }
    }

    /// Also writes transmitted bytes to stdout.
    #[must_use]
    pub const fn with_echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }

    /// Takes all bytes transmitted so far.
    pub fn take_output(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.tx)
    }
}

impl Device for Uart {
    fn name(&self) -> &str {
        "UART0"
    }

    fn address_range(&self) -> (u64, u64) {
        (self.base_addr, UART_SIZE)
    }

    fn load(&mut self, offset: u64, bytes: &mut [u8]) -> bool {
        match offset {
            REG_TXFIFO => bytes.fill(0x00),
            REG_RXFIFO => bytes.fill(0xff),
            _ => return false,
        }
        true
    }

    fn store(&mut self, offset: u64, bytes: &[u8]) -> bool {
        match offset {
            REG_TXFIFO => {
                if let Some(&byte) = bytes.first() {
                    self.tx.push(byte);
                    if self.echo {
                        print!("{}", char::from(byte));
                    }
                }
                true
            }
            REG_RXFIFO | REG_TXCTRL | REG_RXCTRL | REG_DIV => true,
            _ => false,
        }
    }
}
