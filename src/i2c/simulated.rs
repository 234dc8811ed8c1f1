use std::collections::BTreeMap;
use std::time::Duration;

use super::Bus;
use crate::eeprom::AddressWidth;

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Operation {
	/// page write; `len` counts data bytes only
	Write { address: usize, len: usize },
	Read { address: usize, len: usize },
	Settle(Duration),
}

/// In-memory EEPROM behaving like a 24xx-class part
///
/// - writes wrap around inside the page the start address falls into
/// - sequential reads wrap around at the end of the memory
/// - after an accepted write the device is busy and doesn't acknowledge
///   anything until the bus settled for at least the write cycle time
#[derive(Clone, Debug)]
pub struct SimulatedEeprom {
	memory: Vec<u8>,
	page_size: usize,
	address_width: AddressWidth,
	write_cycle: Duration,
	busy: bool,
	short_write_at: Option<usize>,
	failing_reads: bool,
	stuck: BTreeMap<usize, u8>,
	operations: Vec<Operation>,
}

impl SimulatedEeprom {
	pub const DEFAULT_WRITE_CYCLE: Duration = Duration::from_millis(5);

	pub fn new(capacity: usize, page_size: usize, address_width: AddressWidth) -> Self {
		assert!(capacity > 0 && capacity <= address_width.limit());
		assert!(page_size > 0 && capacity % page_size == 0);
		SimulatedEeprom {
			memory: vec![0xff; capacity],
			page_size,
			address_width,
			write_cycle: Self::DEFAULT_WRITE_CYCLE,
			busy: false,
			short_write_at: None,
			failing_reads: false,
			stuck: BTreeMap::new(),
			operations: Vec::new(),
		}
	}

	pub fn with_write_cycle(mut self, write_cycle: Duration) -> Self {
		self.write_cycle = write_cycle;
		self
	}

	/// NACK the data phase of a page write starting at `address`
	pub fn fail_write_at(mut self, address: usize) -> Self {
		self.short_write_at = Some(address);
		self
	}

	/// NACK every read
	pub fn fail_reads(mut self) -> Self {
		self.failing_reads = true;
		self
	}

	/// cell at `address` always reads as `value`, whatever was written
	pub fn stick(mut self, address: usize, value: u8) -> Self {
		assert!(address < self.memory.len());
		self.stuck.insert(address, value);
		self
	}

	pub fn memory(&self) -> &[u8] {
		&self.memory
	}

	pub fn operations(&self) -> &[Operation] {
		&self.operations
	}

	pub fn clear_operations(&mut self) {
		self.operations.clear();
	}

	/// page writes seen so far, as `(address, len)`
	pub fn page_writes(&self) -> Vec<(usize, usize)> {
		self.operations.iter().filter_map(|op| match *op {
			Operation::Write { address, len } => Some((address, len)),
			_ => None,
		}).collect()
	}

	fn decode_address(&self, data: &[u8]) -> Option<usize> {
		let width = self.address_width.len();
		if data.len() < width {
			return None;
		}
		let address = data[..width].iter().fold(0usize, |a, b| (a << 8) | (*b as usize));
		if address >= self.memory.len() {
			return None;
		}
		Some(address)
	}
}

impl Bus for SimulatedEeprom {
	fn write(&mut self, data: &[u8]) -> crate::AResult<usize> {
		if self.busy {
			return Ok(0);
		}
		let address = match self.decode_address(data) {
			None => return Ok(0),
			Some(a) => a,
		};
		let width = self.address_width.len();
		let payload = &data[width..];
		self.operations.push(Operation::Write { address, len: payload.len() });

		if self.short_write_at == Some(address) {
			// address acknowledged, data NACKed; nothing gets programmed
			return Ok(width);
		}

		let page_start = address - address % self.page_size;
		for (i, b) in payload.iter().enumerate() {
			let column = (address - page_start + i) % self.page_size;
			self.memory[page_start + column] = *b;
		}
		if !payload.is_empty() {
			self.busy = true;
		}
		Ok(data.len())
	}

	fn write_read(&mut self, address: &[u8], target: &mut [u8]) -> crate::AResult<usize> {
		if self.busy || self.failing_reads {
			return Ok(0);
		}
		let start = match self.decode_address(address) {
			None => return Ok(0),
			Some(a) => a,
		};
		self.operations.push(Operation::Read { address: start, len: target.len() });

		for (i, t) in target.iter_mut().enumerate() {
			let cell = (start + i) % self.memory.len();
			*t = match self.stuck.get(&cell) {
				Some(v) => *v,
				None => self.memory[cell],
			};
		}
		Ok(target.len())
	}

	fn settle(&mut self, duration: Duration) {
		self.operations.push(Operation::Settle(duration));
		if duration >= self.write_cycle {
			self.busy = false;
		}
	}
}
