use std::fmt;
use std::time::Duration;

/// Width of the target address sent in front of every transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AddressWidth {
	One,
	Two,
}

impl AddressWidth {
	pub fn len(self) -> usize {
		match self {
			AddressWidth::One => 1,
			AddressWidth::Two => 2,
		}
	}

	/// size of the addressable range
	pub fn limit(self) -> usize {
		1usize << (8 * self.len())
	}

	pub fn from_len(len: usize) -> crate::AResult<Self> {
		match len {
			1 => Ok(AddressWidth::One),
			2 => Ok(AddressWidth::Two),
			_ => bail!("unsupported address width: {} bytes (expected 1 or 2)", len),
		}
	}

	/// append `address` big-endian
	pub fn encode(self, address: usize, target: &mut Vec<u8>) {
		assert!(address < self.limit());
		match self {
			AddressWidth::One => {
				target.push(address as u8);
			},
			AddressWidth::Two => {
				target.push((address >> 8) as u8);
				target.push(address as u8);
			},
		}
	}
}

impl fmt::Display for AddressWidth {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "{}-bit", 8 * self.len())
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Geometry {
	page_size: usize,
	address_width: AddressWidth,
	write_cycle: Duration,
}

impl Geometry {
	pub const DEFAULT_PAGE_SIZE: usize = 8;
	pub const DEFAULT_WRITE_CYCLE: Duration = Duration::from_millis(5);

	pub fn new(page_size: usize, address_width: AddressWidth, write_cycle: Duration) -> crate::AResult<Self> {
		ensure!(page_size > 0, "page size must not be zero");
		ensure!(page_size <= address_width.limit(),
			"page size {} exceeds {} address space", page_size, address_width
		);
		Ok(Geometry {
			page_size,
			address_width,
			write_cycle,
		})
	}

	pub fn page_size(&self) -> usize {
		self.page_size
	}

	pub fn address_width(&self) -> AddressWidth {
		self.address_width
	}

	/// time the device needs to program a page
	pub fn write_cycle(&self) -> Duration {
		self.write_cycle
	}
}

// 24LC01/24LC02 class part: 8-byte pages, 8-bit addresses, 5 ms write cycle
impl Default for Geometry {
	fn default() -> Self {
		Geometry {
			page_size: Self::DEFAULT_PAGE_SIZE,
			address_width: AddressWidth::One,
			write_cycle: Self::DEFAULT_WRITE_CYCLE,
		}
	}
}
