//! Read ADT7410/ADT7420 sensors through the Raspberry Pi's I2C peripheral.

use std::io::stdout;

use anyhow::Result;
use clap::Parser;

use rppal::hal::Delay;

use adt74x0_tools::bus::{open_raspi, RASPI_BUS_NAME};
use adt74x0_tools::{run, ScanConfig};

/// Scan the Raspberry Pi I2C bus for ADT74x0 temperature sensors and print their readings
///
/// The sensors want a 10 kHz bus clock to cope with long or badly terminated
/// cables. The clock is fixed at boot, so add `dtparam=i2c_arm_baudrate=10000`
/// to /boot/config.txt; a warning is logged when the bus runs at another speed.
#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {}

fn main() -> Result<()> {
    env_logger::init();
    Args::parse();

    run(
        RASPI_BUS_NAME,
        open_raspi,
        Delay::new(),
        ScanConfig::restricted(),
        &mut stdout().lock(),
    )?;

    Ok(())
}
