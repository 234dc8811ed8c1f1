//! Page-oriented access to a byte-addressed serial EEPROM
//!
//! Writes are split into device pages; each page goes out as one bus
//! transaction framed as target address followed by data. After every page
//! the device runs its internal write cycle and doesn't acknowledge anything,
//! so the writer settles for the documented write cycle time before the next
//! operation.
//!
//! Reads set the target address and then read sequentially in one go.

mod geometry;
mod pages;

pub use self::geometry::{
	AddressWidth,
	Geometry,
};

pub use self::pages::{
	Page,
	Pages,
	pages,
};

use crate::ProvisionError;
use crate::i2c::Bus;

pub struct Eeprom<B: Bus> {
	bus: B,
	geometry: Geometry,
}

impl<B: Bus> Eeprom<B> {
	pub fn new(bus: B, geometry: Geometry) -> Self {
		Eeprom {
			bus,
			geometry,
		}
	}

	pub fn geometry(&self) -> &Geometry {
		&self.geometry
	}

	pub fn bus(&self) -> &B {
		&self.bus
	}

	pub fn bus_mut(&mut self) -> &mut B {
		&mut self.bus
	}

	fn check_range(&self, address: usize, len: usize) -> crate::AResult<()> {
		let limit = self.geometry.address_width().limit();
		// the start address is sent even for empty transfers
		ensure!(address < limit && len <= limit - address,
			"range 0x{:04x}+{} exceeds {} address space", address, len, self.geometry.address_width()
		);
		Ok(())
	}

	/// Write a single page (at most `page_size` bytes) and wait for the
	/// device write cycle.
	pub fn write_page(&mut self, address: usize, data: &[u8]) -> crate::AResult<()> {
		let width = self.geometry.address_width().len();
		let expected = width + data.len();

		if data.len() > self.geometry.page_size() {
			// would wrap around inside the device page
			return Err(ProvisionError::WriteFailed {
				address,
				len: data.len(),
				accepted: 0,
				expected,
			}.into());
		}
		self.check_range(address, data.len())?;

		let mut frame = Vec::with_capacity(expected);
		self.geometry.address_width().encode(address, &mut frame);
		frame.extend_from_slice(data);

		let accepted = with_context!(("bus error writing at address 0x{:04x}", address),
			self.bus.write(&frame)
		)?;
		if accepted < expected {
			return Err(ProvisionError::WriteFailed {
				address,
				len: data.len(),
				accepted,
				expected,
			}.into());
		}

		self.bus.settle(self.geometry.write_cycle());
		Ok(())
	}

	/// Write `data` starting at page-aligned `address`, one page per
	/// transaction in ascending order.
	///
	/// Stops at the first failing page; nothing after it is written.
	pub fn write(&mut self, address: usize, data: &[u8]) -> crate::AResult<()> {
		let page_size = self.geometry.page_size();
		ensure!(address % page_size == 0,
			"start address 0x{:04x} is not aligned to {} byte pages", address, page_size
		);
		self.check_range(address, data.len())?;

		for page in pages(data.len(), page_size) {
			let page_address = address + page.offset;
			self.write_page(page_address, &data[page.range()])?;
			info!("Wrote {} bytes at address 0x{:04x}", page.len, page_address);
		}

		Ok(())
	}

	/// Read `len` bytes starting at `address` in one sequential read.
	pub fn read(&mut self, address: usize, len: usize) -> crate::AResult<Vec<u8>> {
		self.check_range(address, len)?;
		let mut buf = vec![0u8; len];
		if 0 == len {
			return Ok(buf);
		}

		let mut target = Vec::with_capacity(self.geometry.address_width().len());
		self.geometry.address_width().encode(address, &mut target);

		let read = with_context!(("bus error reading at address 0x{:04x}", address),
			self.bus.write_read(&target, &mut buf)
		)?;
		if read < len {
			return Err(ProvisionError::ReadFailed {
				address,
				len,
				read,
			}.into());
		}
		debug!("Read {} bytes at address 0x{:04x}", len, address);

		Ok(buf)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::i2c::{
		Operation,
		SimulatedEeprom,
	};
	use pretty_assertions::assert_eq;
	use std::time::Duration;

	fn geometry(page_size: usize, address_width: AddressWidth) -> Geometry {
		Geometry::new(page_size, address_width, Geometry::DEFAULT_WRITE_CYCLE).unwrap()
	}

	#[test]
	fn oversized_page_is_rejected_before_the_bus() {
		let mut ee = Eeprom::new(SimulatedEeprom::new(256, 8, AddressWidth::One), Geometry::default());
		let err = ee.write_page(0, &[0u8; 9]).unwrap_err();
		assert_eq!(err.downcast_ref::<ProvisionError>(), Some(&ProvisionError::WriteFailed {
			address: 0,
			len: 9,
			accepted: 0,
			expected: 10,
		}));
		assert!(ee.bus().operations().is_empty());
	}

	#[test]
	fn page_write_settles_for_write_cycle() {
		let sim = SimulatedEeprom::new(256, 8, AddressWidth::One);
		let geometry = Geometry::new(8, AddressWidth::One, Duration::from_millis(10)).unwrap();
		let mut ee = Eeprom::new(sim, geometry);
		ee.write_page(16, b"abc").unwrap();
		assert_eq!(ee.bus().operations(), &[
			Operation::Write { address: 16, len: 3 },
			Operation::Settle(Duration::from_millis(10)),
		][..]);
		assert_eq!(&ee.bus().memory()[16..19], b"abc");
	}

	#[test]
	fn two_byte_addressing() {
		let mut ee = Eeprom::new(SimulatedEeprom::new(4096, 32, AddressWidth::Two), geometry(32, AddressWidth::Two));
		let data: Vec<u8> = (0..100u8).collect();
		ee.write(0x300, &data).unwrap();
		assert_eq!(ee.bus().page_writes(), vec![(0x300, 32), (0x320, 32), (0x340, 32), (0x360, 4)]);
		assert_eq!(ee.read(0x300, data.len()).unwrap(), data);
	}

	#[test]
	fn unaligned_or_out_of_range_writes_are_refused() {
		let mut ee = Eeprom::new(SimulatedEeprom::new(256, 8, AddressWidth::One), Geometry::default());
		assert!(ee.write(4, b"data").is_err());
		assert!(ee.write(248, &[0u8; 16]).is_err());
		assert!(ee.bus().operations().is_empty());
	}

	#[test]
	fn empty_page_past_the_end_is_refused() {
		let mut ee = Eeprom::new(SimulatedEeprom::new(256, 8, AddressWidth::One), Geometry::default());
		assert!(ee.write_page(256, &[]).is_err());
		assert!(ee.read(256, 0).is_err());
		assert!(ee.bus().operations().is_empty());
	}

	#[test]
	fn empty_read_skips_the_bus() {
		let mut ee = Eeprom::new(SimulatedEeprom::new(256, 8, AddressWidth::One).fail_reads(), Geometry::default());
		assert_eq!(ee.read(0, 0).unwrap(), Vec::<u8>::new());
	}

	#[test]
	fn short_read_is_a_read_failure() {
		let mut ee = Eeprom::new(SimulatedEeprom::new(256, 8, AddressWidth::One).fail_reads(), Geometry::default());
		let err = ee.read(0, 4).unwrap_err();
		assert_eq!(err.downcast_ref::<ProvisionError>(), Some(&ProvisionError::ReadFailed {
			address: 0,
			len: 4,
			read: 0,
		}));
	}
}
