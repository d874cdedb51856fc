//! Read ADT7410/ADT7420 sensors through a kernel `/dev/i2c-N` device.

use std::io::stdout;

use anyhow::Result;
use clap::Parser;

use linux_embedded_hal::Delay;

use adt74x0_tools::bus::{open_i2cdev, DEFAULT_I2C_DEV};
use adt74x0_tools::{run, ScanConfig};

/// Scan an I2C bus for ADT74x0 temperature sensors and print their readings
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// I2C character device
    #[arg(default_value = DEFAULT_I2C_DEV)]
    bus: String,

    /// Check the ID register before configuring a sensor. Fails on some buses, e.g. the Raspberry Pi's
    #[arg(long)]
    verify_id: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    run(
        &args.bus,
        || open_i2cdev(&args.bus),
        Delay,
        ScanConfig::generic(args.verify_id),
        &mut stdout().lock(),
    )?;

    Ok(())
}
