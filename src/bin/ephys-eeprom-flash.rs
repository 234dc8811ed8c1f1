#[macro_use]
extern crate clap;
#[macro_use]
extern crate failure;
#[macro_use]
extern crate log;

extern crate ephys_eeprom_flash;
use ephys_eeprom_flash::*;

use std::cmp;
use std::process::exit;
use std::time::Duration;

use ephys_eeprom_flash::eeprom::{
	AddressWidth,
	Eeprom,
	Geometry,
};
use ephys_eeprom_flash::i2c::{
	Bus,
	SimulatedEeprom,
};
use ephys_eeprom_flash::record::HIROSE_DF40_64CH;

const DEFAULT_BUS: &str = "/dev/i2c-1";
const DEFAULT_CHIP_ADDRESS: u8 = 0x50;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Command {
	Flash,
	Verify,
	Dump,
}

fn get_param_or<T>(matches: &clap::ArgMatches, name: &str, default: T) -> AResult<T>
where
	T: std::str::FromStr,
	failure::Error: From<<T as std::str::FromStr>::Err>,
{
	let param = match matches.value_of(name) {
		Some(p) => p,
		None => return Ok(default),
	};
	param.parse::<T>().map_err(|e| {
		let e = failure::Error::from(e);
		let msg = format!("invalid paramater {}: {}", name, e);
		e.context(msg).into()
	})
}

fn get_chip_address(matches: &clap::ArgMatches) -> AResult<u8> {
	let param = match matches.value_of("chip") {
		Some(p) => p,
		None => return Ok(DEFAULT_CHIP_ADDRESS),
	};
	let digits = param.trim_start_matches("0x");
	let address = u8::from_str_radix(digits, 16).map_err(|e| {
		format_err!("invalid parameter chip: {:?}: {}", param, e)
	})?;
	ensure!(address < 0x80, "invalid parameter chip: 0x{:02x} is not a 7-bit address", address);
	Ok(address)
}

fn get_geometry(matches: &clap::ArgMatches) -> AResult<Geometry> {
	let page_size: usize = get_param_or(matches, "page_size", Geometry::DEFAULT_PAGE_SIZE)?;
	let address_width = AddressWidth::from_len(get_param_or(matches, "address_width", 1usize)?)?;
	let write_delay: u64 = get_param_or(matches, "write_delay", Geometry::DEFAULT_WRITE_CYCLE.as_millis() as u64)?;
	Geometry::new(page_size, address_width, Duration::from_millis(write_delay))
}

fn hexdump(data: &[u8]) {
	for i in 0..data.len() {
		if 0 == i % 16 {
			print!("{:08x} ", i);
		} else if 0 == i % 8 {
			print!(" ");
		}
		print!(" {:02x}", data[i]);
		if 15 == i % 16 {
			println!("");
		}
	}
	if 0 != data.len() % 16 {
		println!("");
	}
	println!("{:08x}", data.len());
}

// a fresh simulated EEPROM is blank, there is nothing to verify or dump
fn check_simulate(command: Command) -> AResult<()> {
	ensure!(command == Command::Flash, "--simulate only works with the flash subcommand");
	Ok(())
}

fn run<B: Bus>(command: Command, mut eeprom: Eeprom<B>) -> AResult<()> {
	let record = HIROSE_DF40_64CH.record();
	debug!("EEPROM geometry: {:?}", eeprom.geometry());

	match command {
		Command::Flash => {
			provision(&mut eeprom, &record)
		},
		Command::Verify => {
			let verification = verify::verify(&mut eeprom, RECORD_ADDRESS, &record)?;
			verification.report();
			verification.into_result()
		},
		Command::Dump => {
			let info = record::read_record(&mut eeprom, RECORD_ADDRESS)?;
			print!("{}", info);
			Ok(())
		},
	}
}

fn main_app() -> AResult<()> {
	let matches = clap_app!(@app (app_from_crate!())
		(@setting SubcommandRequiredElseHelp)
		(global_setting: clap::AppSettings::VersionlessSubcommands)
		(@arg bus: -b --bus +takes_value "I2C bus device [default: /dev/i2c-1]")
		(@arg chip: -c --chip +takes_value "I2C address of the EEPROM in hex [default: 50]")
		(@arg page_size: -p --("page-size") +takes_value "EEPROM page size in bytes [default: 8]")
		(@arg address_width: -a --("address-width") +takes_value "EEPROM address bytes, 1 or 2 [default: 1]")
		(@arg write_delay: -d --("write-delay") +takes_value "EEPROM write cycle time in ms [default: 5]")
		(@arg simulate: -s --simulate "write to a simulated EEPROM instead of the I2C bus (flash only)")
		(@subcommand flash =>
			(about: "write the module record and verify it")
		)
		(@subcommand verify =>
			(about: "compare EEPROM contents with the module record")
		)
		(@subcommand dump =>
			(about: "read and decode the record stored in the EEPROM")
		)
		(@subcommand show =>
			(about: "show the module record without accessing the bus")
		)
	).get_matches();

	let command = match matches.subcommand() {
		("flash", _) => Command::Flash,
		("verify", _) => Command::Verify,
		("dump", _) => Command::Dump,
		("show", _) => {
			let record = HIROSE_DF40_64CH.record();
			print!("{}", record.parse()?);
			hexdump(&record);
			return Ok(());
		},
		("", _) => bail!("no subcommand"),
		(cmd, _) => bail!("not implemented subcommand {:?}", cmd),
	};

	let geometry = get_geometry(&matches)?;

	if matches.is_present("simulate") {
		check_simulate(command)?;
		let page_size = geometry.page_size();
		let capacity = cmp::max(page_size, cmp::min(geometry.address_width().limit(), 0x1000));
		let capacity = capacity - capacity % page_size;
		info!("Using simulated {} byte EEPROM", capacity);
		let sim = SimulatedEeprom::new(capacity, page_size, geometry.address_width())
			.with_write_cycle(geometry.write_cycle());
		return run(command, Eeprom::new(sim, geometry));
	}

	let path = matches.value_of("bus").unwrap_or(DEFAULT_BUS);
	let bus = i2c::open_bus(path, get_chip_address(&matches)?)?;
	info!("Using EEPROM 0x{:02x} on {}", bus.chip_address(), bus.path());
	run(command, Eeprom::new(bus, geometry))
}

fn main() {
	env_logger::from_env(env_logger::Env::default().default_filter_or("info")).init();

	if let Err(e) = main_app() {
		error!("Error: {}", e);
		// eprintln!("Backtrace: {:?}", e.backtrace());
		match e.downcast_ref::<ProvisionError>() {
			Some(ProvisionError::DataMismatch { .. }) => exit(2),
			_ => exit(1),
		}
	}
}
