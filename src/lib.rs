//! Scan an I2C bus for ADT7410/ADT7420 temperature sensors and print what they read.

pub mod adt74x0;
pub mod bus;
pub mod error;
pub mod scan;

use std::io::Write;

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;
use log::info;

pub use crate::adt74x0::Temperature;
pub use crate::bus::TransportError;
pub use crate::error::{BusOpenError, SensorError};
pub use crate::scan::{DeviceStatus, ScanConfig, ScanReport, SensorReader};

/// Open the bus, scan it, release it, then print the report.
///
/// Only a failure to open the bus is returned as an error; everything that
/// goes wrong with individual sensors ends up as a line in `out`.
pub fn run<B, D>(
    target: &str,
    open: impl FnOnce() -> Result<B, BusOpenError>,
    delay: D,
    config: ScanConfig,
    out: &mut impl Write,
) -> anyhow::Result<ScanReport>
where
    B: I2c,
    B::Error: Into<TransportError>,
    D: DelayNs,
{
    writeln!(out, "# Scanning {} for ADT74x0...", target)?;

    let bus = open()?;
    info!("Opened {}", target);

    let mut reader = SensorReader::new(bus, delay, config);
    let report = reader.scan();
    drop(reader.release());

    report.write_to(out)?;
    Ok(report)
}
