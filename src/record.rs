//! Identification record stored at the start of a module EEPROM
//!
//! Layout (byte offsets from the start of the EEPROM):
//!
//! | Offset | Length | Field                              |
//! |--------|--------|------------------------------------|
//! | 0      | 10     | magic `open-ephys`                 |
//! | 10     | 20     | name, padded with spaces           |
//! | 30     | 1      | PCB revision                       |
//! | 31     | 1      | channel count N                    |
//! | 32     | N      | channel map, one byte per channel  |
//!
//! The layout is shared with everything reading these EEPROMs; changing it
//! requires a new magic or revision.

use std::fmt;
use std::ops::Deref;

use crate::eeprom::Eeprom;
use crate::i2c::Bus;

pub const MAGIC_LEN: usize = 10;
pub const NAME_LEN: usize = 20;
/// magic, name, revision and channel count
pub const HEADER_LEN: usize = MAGIC_LEN + NAME_LEN + 2;

pub const MAGIC: [u8; MAGIC_LEN] = *b"open-ephys";

const REVISION_OFFSET: usize = MAGIC_LEN + NAME_LEN;
const CHANNEL_COUNT_OFFSET: usize = REVISION_OFFSET + 1;

/// Pad `name` with spaces to the fixed name width.
pub const fn pad_name(name: &str) -> [u8; NAME_LEN] {
	let bytes = name.as_bytes();
	assert!(bytes.len() <= NAME_LEN, "module name longer than 20 bytes");
	let mut result = [b' '; NAME_LEN];
	let mut i = 0;
	while i < bytes.len() {
		result[i] = bytes[i];
		i += 1;
	}
	result
}

/// Compile-time description of a module, `N` channels
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct ModuleIdentity<const N: usize> {
	pub magic: [u8; MAGIC_LEN],
	pub name: [u8; NAME_LEN],
	pub revision: u8,
	pub channel_map: [u8; N],
}

impl<const N: usize> ModuleIdentity<N> {
	pub const RECORD_LEN: usize = HEADER_LEN + N;

	// referenced from `channel_count`, so an oversized `N` fails the build
	const CHANNEL_COUNT_FITS: () = assert!(N <= u8::MAX as usize, "too many channels for a one byte channel count");

	/// Panics (at compile time when used in a `const`) on a channel count
	/// that doesn't fit a byte or a map entry outside `0..2N`.
	pub const fn validate(&self) {
		assert!(N <= u8::MAX as usize, "too many channels for a one byte channel count");
		let mut i = 0;
		while i < N {
			assert!((self.channel_map[i] as usize) < 2 * N, "channel map entry out of range");
			i += 1;
		}
	}

	pub fn channel_count(&self) -> u8 {
		let () = Self::CHANNEL_COUNT_FITS;
		N as u8
	}

	/// Panics on a channel map entry outside `0..2N`.
	pub fn record(&self) -> Record {
		self.validate();
		let mut data = Vec::with_capacity(Self::RECORD_LEN);
		data.extend_from_slice(&self.magic);
		data.extend_from_slice(&self.name);
		data.push(self.revision);
		data.push(self.channel_count());
		data.extend_from_slice(&self.channel_map);
		debug_assert_eq!(data.len(), Self::RECORD_LEN);
		Record(data)
	}
}

/// Hirose DF40 64 channel connector module, revision A.
///
/// Channel map taken from the PCB schematic.
pub const HIROSE_DF40_64CH: ModuleIdentity<64> = ModuleIdentity {
	magic: MAGIC,
	name: pad_name("Hirose DF40 64-Ch."),
	revision: b'A',
	channel_map: [
		63, 95, 62, 94, 61, 93, 60, 92, 59, 91, 58, 90, 57, 89, 56, 88,
		55, 87, 54, 86, 53, 85, 52, 84, 51, 83, 50, 82, 49, 81, 48, 80,
		47, 79, 46, 78, 45, 77, 44, 76, 43, 75, 42, 74, 41, 73, 40, 72,
		39, 71, 38, 70, 37, 69, 36, 68, 35, 67, 34, 66, 33, 65, 32, 64,
	],
};

const _: () = HIROSE_DF40_64CH.validate();

/// Raw record bytes, written and verified as is
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct Record(Vec<u8>);

impl Record {
	pub fn as_bytes(&self) -> &[u8] {
		&self.0
	}

	pub fn parse(&self) -> crate::AResult<RecordInfo> {
		RecordInfo::parse(&self.0)
	}
}

impl Deref for Record {
	type Target = [u8];

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}

/// Decoded record
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct RecordInfo {
	pub name: String,
	pub revision: u8,
	pub channel_map: Vec<u8>,
}

impl RecordInfo {
	pub fn parse(data: &[u8]) -> crate::AResult<Self> {
		ensure!(data.len() >= HEADER_LEN, "Record too short: {} bytes (header is {})", data.len(), HEADER_LEN);
		ensure!(data[..MAGIC_LEN] == MAGIC[..],
			"Invalid magic: {:?} (expected {:?})",
			String::from_utf8_lossy(&data[..MAGIC_LEN]), String::from_utf8_lossy(&MAGIC),
		);

		let channels = data[CHANNEL_COUNT_OFFSET] as usize;
		ensure!(data.len() == HEADER_LEN + channels,
			"Record length {} doesn't match channel count {}", data.len(), channels
		);
		let channel_map = data[HEADER_LEN..].to_vec();
		for (channel, entry) in channel_map.iter().enumerate() {
			ensure!((*entry as usize) < 2 * channels,
				"Channel {} mapped to {}, out of range for {} channels", channel, entry, channels
			);
		}

		let name = String::from_utf8_lossy(&data[MAGIC_LEN..REVISION_OFFSET]).trim_end().to_string();

		Ok(RecordInfo {
			name,
			revision: data[REVISION_OFFSET],
			channel_map,
		})
	}
}

impl fmt::Display for RecordInfo {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		writeln!(f, "name:     {:?}", self.name)?;
		if self.revision.is_ascii_graphic() {
			writeln!(f, "revision: {}", self.revision as char)?;
		} else {
			writeln!(f, "revision: 0x{:02x}", self.revision)?;
		}
		writeln!(f, "channels: {}", self.channel_map.len())?;
		for (row, chunk) in self.channel_map.chunks(16).enumerate() {
			write!(f, "  {:3}:", row * 16)?;
			for entry in chunk {
				write!(f, " {:3}", entry)?;
			}
			writeln!(f)?;
		}
		Ok(())
	}
}

/// Read and decode the record stored at `address`.
pub fn read_record<B: Bus>(eeprom: &mut Eeprom<B>, address: usize) -> crate::AResult<RecordInfo> {
	let mut data = eeprom.read(address, HEADER_LEN)?;
	let channels = data[CHANNEL_COUNT_OFFSET] as usize;
	if data[..MAGIC_LEN] == MAGIC[..] && channels > 0 {
		data.extend(eeprom.read(address + HEADER_LEN, channels)?);
	} else if data.iter().all(|b| *b == 0xff) {
		warn!("EEPROM looks empty");
	}
	RecordInfo::parse(&data)
}
