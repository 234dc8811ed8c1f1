use std::time::Duration;

use ephys_eeprom_flash::eeprom::{
	AddressWidth,
	Eeprom,
	Geometry,
};
use ephys_eeprom_flash::i2c::{
	Operation,
	SimulatedEeprom,
};
use ephys_eeprom_flash::record::{
	self,
	HIROSE_DF40_64CH,
};
use ephys_eeprom_flash::verify::{
	self,
	Mismatch,
};
use ephys_eeprom_flash::{
	ProvisionError,
	RECORD_ADDRESS,
	provision,
};
use pretty_assertions::assert_eq;

const SETTLE: Duration = Geometry::DEFAULT_WRITE_CYCLE;

fn sim() -> SimulatedEeprom {
	SimulatedEeprom::new(256, 8, AddressWidth::One)
}

fn provision_error(err: &failure::Error) -> &ProvisionError {
	err.downcast_ref::<ProvisionError>().expect("expected a ProvisionError")
}

#[test]
fn df40_record_in_twelve_pages() {
	let record = HIROSE_DF40_64CH.record();
	assert_eq!(record.len(), 96);

	let mut ee = Eeprom::new(sim(), Geometry::default());
	provision(&mut ee, &record).unwrap();

	let expected_writes: Vec<(usize, usize)> = (0..12).map(|i| (i * 8, 8)).collect();
	assert_eq!(ee.bus().page_writes(), expected_writes);

	// every page write is followed by a settle, the read comes last
	let ops = ee.bus().operations();
	assert_eq!(ops.len(), 12 * 2 + 1);
	for pair in ops[..24].chunks(2) {
		assert_eq!(pair[1], Operation::Settle(SETTLE));
	}
	assert_eq!(ops[24], Operation::Read { address: 0, len: 96 });

	assert_eq!(&ee.bus().memory()[..96], record.as_bytes());
}

#[test]
fn empty_record() {
	let mut ee = Eeprom::new(sim(), Geometry::default());
	provision(&mut ee, &[]).unwrap();
	assert!(ee.bus().operations().is_empty());
}

#[test]
fn exactly_one_page() {
	let mut ee = Eeprom::new(sim(), Geometry::default());
	provision(&mut ee, &[0x11; 8]).unwrap();
	assert_eq!(ee.bus().page_writes(), vec![(0, 8)]);
}

#[test]
fn one_byte_past_a_page() {
	let mut ee = Eeprom::new(sim(), Geometry::default());
	provision(&mut ee, &[0x22; 9]).unwrap();
	assert_eq!(ee.bus().page_writes(), vec![(0, 8), (8, 1)]);
}

#[test]
fn failed_page_aborts_remaining_writes_and_verification() {
	let record = HIROSE_DF40_64CH.record();
	let mut ee = Eeprom::new(sim().fail_write_at(24), Geometry::default());

	let err = provision(&mut ee, &record).unwrap_err();
	assert_eq!(provision_error(&err), &ProvisionError::WriteFailed {
		address: 24,
		len: 8,
		accepted: 1,
		expected: 9,
	});
	assert_eq!(ee.bus().page_writes(), vec![(0, 8), (8, 8), (16, 8), (24, 8)]);
	assert!(!ee.bus().operations().iter().any(|op| match op {
		Operation::Read { .. } => true,
		_ => false,
	}));
}

#[test]
fn corrupted_bytes_are_all_reported() {
	let record = HIROSE_DF40_64CH.record();
	let mut ee = Eeprom::new(sim().stick(5, 0x00).stick(40, 0xff), Geometry::default());

	let err = provision(&mut ee, &record).unwrap_err();
	assert_eq!(provision_error(&err), &ProvisionError::DataMismatch {
		mismatches: vec![
			Mismatch { offset: 5, expected: b'e', actual: 0x00 },
			Mismatch { offset: 40, expected: 59, actual: 0xff },
		],
	});
}

#[test]
fn read_failure_is_not_a_mismatch() {
	let record = HIROSE_DF40_64CH.record();
	let mut ee = Eeprom::new(sim().fail_reads(), Geometry::default());

	let err = provision(&mut ee, &record).unwrap_err();
	assert_eq!(provision_error(&err), &ProvisionError::ReadFailed {
		address: 0,
		len: 96,
		read: 0,
	});
}

#[test]
fn repeated_runs_give_identical_results() {
	let record = HIROSE_DF40_64CH.record();
	let mut ee = Eeprom::new(sim().stick(77, 0x00), Geometry::default());

	ee.write(RECORD_ADDRESS, &record).unwrap();
	let first = verify::verify(&mut ee, RECORD_ADDRESS, &record).unwrap();
	let memory = ee.bus().memory().to_vec();

	ee.write(RECORD_ADDRESS, &record).unwrap();
	let second = verify::verify(&mut ee, RECORD_ADDRESS, &record).unwrap();

	assert!(!first.passed());
	assert_eq!(first, second);
	assert_eq!(ee.bus().memory(), &memory[..]);
}

#[test]
fn too_short_write_cycle_is_caught() {
	let record = HIROSE_DF40_64CH.record();
	let sim = sim().with_write_cycle(Duration::from_millis(10));
	let geometry = Geometry::new(8, AddressWidth::One, Duration::from_millis(2)).unwrap();
	let mut ee = Eeprom::new(sim, geometry);

	let err = provision(&mut ee, &record).unwrap_err();
	assert_eq!(provision_error(&err).address(), Some(8));
	assert_eq!(ee.bus().page_writes(), vec![(0, 8)]);
}

#[test]
fn page_size_larger_than_device_page_fails_verification() {
	let record = HIROSE_DF40_64CH.record();
	let geometry = Geometry::new(16, AddressWidth::One, SETTLE).unwrap();
	let mut ee = Eeprom::new(sim(), geometry);

	let err = provision(&mut ee, &record).unwrap_err();
	match provision_error(&err) {
		ProvisionError::DataMismatch { mismatches } => assert!(!mismatches.is_empty()),
		other => panic!("unexpected error: {:?}", other),
	}
}

#[test]
fn two_byte_addressed_device() {
	let record = HIROSE_DF40_64CH.record();
	let geometry = Geometry::new(32, AddressWidth::Two, SETTLE).unwrap();
	let mut ee = Eeprom::new(SimulatedEeprom::new(4096, 32, AddressWidth::Two), geometry);

	provision(&mut ee, &record).unwrap();
	assert_eq!(ee.bus().page_writes(), vec![(0, 32), (32, 32), (64, 32)]);
}

#[test]
fn dump_reads_back_the_record() {
	let record = HIROSE_DF40_64CH.record();
	let mut ee = Eeprom::new(sim(), Geometry::default());
	provision(&mut ee, &record).unwrap();

	ee.bus_mut().clear_operations();
	let info = record::read_record(&mut ee, RECORD_ADDRESS).unwrap();
	assert_eq!(info, record.parse().unwrap());
	assert_eq!(ee.bus().operations(), &[
		Operation::Read { address: 0, len: 32 },
		Operation::Read { address: 32, len: 64 },
	][..]);
}

#[test]
fn dump_of_blank_eeprom_fails() {
	let mut ee = Eeprom::new(sim(), Geometry::default());
	assert!(record::read_record(&mut ee, RECORD_ADDRESS).is_err());
}
