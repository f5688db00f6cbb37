//! Memory-mapped I/O devices.

/// Transmit-only UART stub.
pub mod uart;

pub use uart::Uart;

pub use crate::soc::traits::Device;
