use std::thread;
use std::time::{
	Duration,
	Instant,
};

pub fn reliable_sleep(mut duration: Duration) {
	loop {
		let now = Instant::now();
		thread::sleep(duration);
		let elapsed = now.elapsed();
		if elapsed >= duration {
			return;
		}
		duration -= elapsed;
	}
}

pub trait Bus {
	/// Send `data` in a single transaction (START, data, STOP).
	///
	/// Returns the number of bytes the device acknowledged.
	fn write(&mut self, data: &[u8]) -> crate::AResult<usize>;

	/// Send `address` without STOP, then read `target.len()` bytes after a
	/// repeated START.
	///
	/// Returns the number of bytes read into `target`.
	fn write_read(&mut self, address: &[u8], target: &mut [u8]) -> crate::AResult<usize>;

	// block for (at least) `duration`; the device is busy with its internal
	// write cycle and won't acknowledge anything meanwhile
	fn settle(&mut self, duration: Duration) {
		reliable_sleep(duration);
	}
}

impl<'a, B: ?Sized + Bus> Bus for &'a mut B {
	fn write(&mut self, data: &[u8]) -> crate::AResult<usize> {
		B::write(*self, data)
	}
	fn write_read(&mut self, address: &[u8], target: &mut [u8]) -> crate::AResult<usize> {
		B::write_read(*self, address, target)
	}
	fn settle(&mut self, duration: Duration) {
		B::settle(*self, duration)
	}
}
