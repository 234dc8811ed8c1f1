use std::fs;
use std::io::{
	self,
	Write,
};
use std::os::unix::io::AsRawFd;

use libc::{
	EREMOTEIO,
	ENXIO,
	c_ulong,
	ioctl,
};

use super::Bus;

// <linux/i2c-dev.h>
const I2C_SLAVE: c_ulong = 0x0703;
const I2C_RDWR: c_ulong = 0x0707;
// <linux/i2c.h>
const I2C_M_RD: u16 = 0x0001;

#[repr(C)]
struct I2cMsg {
	addr: u16,
	flags: u16,
	len: u16,
	buf: *mut u8,
}

#[repr(C)]
struct I2cRdwrIoctlData {
	msgs: *mut I2cMsg,
	nmsgs: u32,
}

// the adapter reports a missing ACK as one of these
fn is_nack(e: &io::Error) -> bool {
	match e.raw_os_error() {
		Some(ENXIO) | Some(EREMOTEIO) => true,
		_ => false,
	}
}

/// EEPROM on a Linux `i2c-dev` bus node (`/dev/i2c-N`)
#[derive(Debug)]
pub struct LinuxI2c {
	file: fs::File,
	path: String,
	chip_address: u8,
}

impl LinuxI2c {
	pub fn path(&self) -> &str {
		&self.path
	}

	pub fn chip_address(&self) -> u8 {
		self.chip_address
	}
}

impl Bus for LinuxI2c {
	fn write(&mut self, data: &[u8]) -> crate::AResult<usize> {
		match self.file.write(data) {
			Ok(n) => Ok(n),
			Err(ref e) if is_nack(e) => {
				debug!("I2C {} @0x{:02x}: write NACK: {}", self.path, self.chip_address, e);
				Ok(0)
			},
			Err(e) => Err(e.into()),
		}
	}

	fn write_read(&mut self, address: &[u8], target: &mut [u8]) -> crate::AResult<usize> {
		ensure!(address.len() <= u16::max_value() as usize, "I2C address phase too long: {}", address.len());
		ensure!(target.len() <= u16::max_value() as usize, "I2C read too long: {}", target.len());

		// the kernel never writes through the address message
		let mut msgs = [
			I2cMsg {
				addr: self.chip_address as u16,
				flags: 0,
				len: address.len() as u16,
				buf: address.as_ptr() as *mut u8,
			},
			I2cMsg {
				addr: self.chip_address as u16,
				flags: I2C_M_RD,
				len: target.len() as u16,
				buf: target.as_mut_ptr(),
			},
		];
		let mut data = I2cRdwrIoctlData {
			msgs: msgs.as_mut_ptr(),
			nmsgs: msgs.len() as u32,
		};

		let res = unsafe { ioctl(self.file.as_raw_fd(), I2C_RDWR as _, &mut data as *mut I2cRdwrIoctlData) };
		if -1 == res {
			let e = io::Error::last_os_error();
			if is_nack(&e) {
				debug!("I2C {} @0x{:02x}: read NACK: {}", self.path, self.chip_address, e);
				return Ok(0);
			}
			return Err(e.into());
		}
		// number of messages transferred
		if res as usize != msgs.len() {
			return Ok(0);
		}
		Ok(target.len())
	}
}

// TODO: exclusive open / file locking?
pub fn open_bus(path: &str, chip_address: u8) -> crate::AResult<LinuxI2c> {
	ensure!(chip_address < 0x80, "invalid 7-bit I2C chip address: 0x{:02x}", chip_address);

	let file = with_context!(("couldn't open I2C bus {}", path), {
		Ok(fs::OpenOptions::new()
			.read(true)
			.write(true)
			.open(path)?)
	})?;

	let res = unsafe { ioctl(file.as_raw_fd(), I2C_SLAVE as _, chip_address as c_ulong) };
	if -1 == res {
		let e = io::Error::last_os_error();
		bail!("couldn't select I2C chip 0x{:02x} on {}: {}", chip_address, path, e);
	}

	debug!("I2C {}: opened chip 0x{:02x}", path, chip_address);
	Ok(LinuxI2c {
		file,
		path: path.into(),
		chip_address,
	})
}
