use std::fmt;

use failure::Fail;

use crate::verify::Mismatch;

#[derive(Clone, PartialEq, Eq, Debug, Fail)]
pub enum ProvisionError {
	/// The bus accepted fewer bytes than the framed page (address + data).
	WriteFailed {
		address: usize,
		len: usize,
		accepted: usize,
		expected: usize,
	},
	/// Read-back returned fewer bytes than requested.
	ReadFailed {
		address: usize,
		len: usize,
		read: usize,
	},
	/// Read-back completed, but the data differs from what was written.
	DataMismatch {
		mismatches: Vec<Mismatch>,
	},
}

impl ProvisionError {
	/// device address the failure is attributed to
	pub fn address(&self) -> Option<usize> {
		match *self {
			ProvisionError::WriteFailed { address, .. } => Some(address),
			ProvisionError::ReadFailed { address, .. } => Some(address),
			ProvisionError::DataMismatch { ref mismatches } => mismatches.first().map(|m| m.offset),
		}
	}
}

impl fmt::Display for ProvisionError {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			ProvisionError::WriteFailed { address, len, accepted, expected } => write!(f,
				"Failed to write {} bytes at address 0x{:04x} (bus accepted {} of {} bytes)",
				len, address, accepted, expected,
			),
			ProvisionError::ReadFailed { address, len, read } => write!(f,
				"Failed to read {} bytes from address 0x{:04x} (got {} bytes)",
				len, address, read,
			),
			ProvisionError::DataMismatch { mismatches } => write!(f,
				"Verification failed! {} byte(s) differ",
				mismatches.len(),
			),
		}
	}
}
