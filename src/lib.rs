#[macro_use]
extern crate failure;
#[macro_use]
extern crate log;

macro_rules! with_context {
	(( $fmt:tt $($t:tt)* ), $e:expr) => {{
		use failure::Error;

		match (|| { $e })() {
			Ok(v) => Ok(v),
			Err(e) => {
				let e: Error = e;
				let msg = format!(concat!($fmt, ": {}") $($t)*, e);
				Err(Error::from(e.context(msg)))
			}
		}
	}};

	($msg:expr, $e:expr) => {
		with_context!(("{}", $msg), $e)
	};
}

pub type AResult<T> = Result<T, failure::Error>;

pub mod eeprom;
pub mod error;
pub mod i2c;
pub mod record;
pub mod verify;

pub use self::error::ProvisionError;

use self::eeprom::Eeprom;
use self::i2c::Bus;

/// Device address the module record starts at.
pub const RECORD_ADDRESS: usize = 0;

/// Write `record` page by page, then read it back and compare.
///
/// A failed page write aborts the run before verification; a verification
/// mismatch is returned as [`ProvisionError::DataMismatch`] after every
/// differing byte has been logged.
pub fn provision<B: Bus>(eeprom: &mut Eeprom<B>, record: &[u8]) -> AResult<()> {
	info!("Writing {} bytes to EEPROM...", record.len());
	eeprom.write(RECORD_ADDRESS, record)?;

	info!("Write complete. Verifying data...");
	let verification = verify::verify(eeprom, RECORD_ADDRESS, record)?;
	verification.report();
	verification.into_result()
}
