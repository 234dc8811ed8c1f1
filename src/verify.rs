use std::fmt;

use crate::ProvisionError;
use crate::eeprom::Eeprom;
use crate::i2c::Bus;

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Mismatch {
	pub offset: usize,
	pub expected: u8,
	pub actual: u8,
}

impl fmt::Display for Mismatch {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "byte {}: expected {}, got {}", self.offset, self.expected, self.actual)
	}
}

/// Outcome of comparing read-back data with what was written
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Verification {
	len: usize,
	mismatches: Vec<Mismatch>,
}

impl Verification {
	/// Compare every byte; never stops at the first difference.
	pub fn compare(expected: &[u8], actual: &[u8]) -> Self {
		assert_eq!(expected.len(), actual.len());
		let mismatches = expected.iter().zip(actual).enumerate()
			.filter(|(_, (e, a))| e != a)
			.map(|(offset, (e, a))| Mismatch {
				offset,
				expected: *e,
				actual: *a,
			})
			.collect();
		Verification {
			len: expected.len(),
			mismatches,
		}
	}

	pub fn len(&self) -> usize {
		self.len
	}

	pub fn is_empty(&self) -> bool {
		0 == self.len
	}

	pub fn passed(&self) -> bool {
		self.mismatches.is_empty()
	}

	pub fn mismatches(&self) -> &[Mismatch] {
		&self.mismatches
	}

	pub fn report(&self) {
		for m in &self.mismatches {
			error!("Verification failed at {}", m);
		}
		if self.passed() {
			info!("Verification successful! All {} bytes match.", self.len);
		} else {
			error!("Verification failed! Data mismatch detected.");
		}
	}

	pub fn into_result(self) -> crate::AResult<()> {
		if self.passed() {
			return Ok(());
		}
		Err(ProvisionError::DataMismatch {
			mismatches: self.mismatches,
		}.into())
	}
}

/// Read back `expected.len()` bytes at `address` and compare them.
///
/// A failing read is returned as [`ProvisionError::ReadFailed`], separate
/// from data that was read but differs.
pub fn verify<B: Bus>(eeprom: &mut Eeprom<B>, address: usize, expected: &[u8]) -> crate::AResult<Verification> {
	let actual = eeprom.read(address, expected.len())?;
	Ok(Verification::compare(expected, &actual))
}

#[cfg(test)]
mod tests {
	use super::*;
	use pretty_assertions::assert_eq;

	#[test]
	fn collects_every_mismatch() {
		let v = Verification::compare(b"abcdef", b"abXdeY");
		assert!(!v.passed());
		assert_eq!(v.len(), 6);
		assert!(!v.is_empty());
		assert_eq!(v.mismatches(), &[
			Mismatch { offset: 2, expected: b'c', actual: b'X' },
			Mismatch { offset: 5, expected: b'f', actual: b'Y' },
		][..]);
		assert_eq!(v.mismatches()[0].to_string(), "byte 2: expected 99, got 88");
	}

	#[test]
	fn empty_range_passes() {
		let v = Verification::compare(&[], &[]);
		assert!(v.passed());
		assert!(v.is_empty());
		assert!(v.into_result().is_ok());
	}

	#[test]
	fn mismatch_becomes_error() {
		let err = Verification::compare(&[1, 2], &[1, 3]).into_result().unwrap_err();
		assert_eq!(err.downcast_ref::<ProvisionError>(), Some(&ProvisionError::DataMismatch {
			mismatches: vec![Mismatch { offset: 1, expected: 2, actual: 3 }],
		}));
	}
}
