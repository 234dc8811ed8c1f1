//! Byte transport to a single EEPROM on an I²C bus
//!
//! The bus-level chip address is fixed when the transport is opened; all
//! calls here talk to that one device. Target (memory) addresses are part of
//! the transmitted bytes and framed by the caller, see `crate::eeprom`.
//!
//! A device that doesn't acknowledge (NACK) is not an error at this level:
//! it shows up as a short byte count, which the callers turn into write or
//! read failures.

mod bus;
mod linux;
mod simulated;

pub use self::bus::{
	Bus,
	reliable_sleep,
};

pub use self::linux::{
	LinuxI2c,
	open_bus,
};

pub use self::simulated::{
	Operation,
	SimulatedEeprom,
};
