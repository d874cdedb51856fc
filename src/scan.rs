use std::collections::BTreeMap;
use std::io::{self, Write};
use std::ops::RangeInclusive;

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;
use log::{debug, info, warn};

use crate::adt74x0::*;
use crate::bus::TransportError;
use crate::error::SensorError;

pub const ADT74X0_WAIT_AFTER_RESET_US: u32 = 250; // Needs 200us after reset
pub const ADT74X0_WAIT_AFTER_RESET_PI_US: u32 = 1000; // Coarser margin for the Pi
pub const ADT74X0_WAIT_FOR_CONVERSION_MS: u32 = 1000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanConfig {
    /// Addresses that get a status entry. Only the ones inside the ADT74x0 window are probed.
    pub addresses: RangeInclusive<u8>,
    /// Read the ID register before configuring. Unreliable on some buses.
    pub verify_identity: bool,
    pub settle_time_us: u32,
    pub conversion_time_ms: u32,
}

impl ScanConfig {
    /// Kernel `/dev/i2c-N` scan over every 7-bit address.
    pub fn generic(verify_identity: bool) -> Self {
        ScanConfig {
            addresses: 0..=0x7F,
            verify_identity,
            settle_time_us: ADT74X0_WAIT_AFTER_RESET_US,
            conversion_time_ms: ADT74X0_WAIT_FOR_CONVERSION_MS,
        }
    }

    /// Raspberry Pi peripheral scan, limited to the sensor's own addresses.
    pub fn restricted() -> Self {
        ScanConfig {
            addresses: ADT74X0_ADDR_WINDOW,
            verify_identity: true,
            settle_time_us: ADT74X0_WAIT_AFTER_RESET_PI_US,
            conversion_time_ms: ADT74X0_WAIT_FOR_CONVERSION_MS,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DeviceStatus {
    Unscanned,
    Candidate,
    Initialized,
    InitFailed(SensorError),
    ReadOk(Temperature),
    ReadFailed(SensorError),
}

/// Drives one scan-init-read pass over a bus it owns exclusively.
///
/// Every transfer carries its device address, so there is no separate
/// address-selection step; a refused address is reported as
/// [`SensorError::AddressSelect`] by whichever transfer hit it.
pub struct SensorReader<I, D> {
    i2c: I,
    delay: D,
    config: ScanConfig,
}

impl<I, D> SensorReader<I, D>
where
    I: I2c,
    I::Error: Into<TransportError>,
    D: DelayNs,
{
    pub fn new(i2c: I, delay: D, config: ScanConfig) -> Self {
        SensorReader { i2c, delay, config }
    }

    pub fn reset_device(&mut self, addr: u8) -> Result<(), SensorError> {
        self.i2c
            .write(addr, &[ADT74X0_RESET])
            .map_err(|e| SensorError::at_stage(e, SensorError::Reset))
    }

    pub fn configure_device(&mut self, addr: u8) -> Result<(), SensorError> {
        self.i2c
            .write(addr, &[ADT74X0_CONFIG, ADT74X0_CONFIG_16BIT_CONTINUOUS])
            .map_err(|e| SensorError::at_stage(e, SensorError::Config))
    }

    /// Returns the raw ID byte when it identifies an ADT74x0.
    pub fn verify_identity(&mut self, addr: u8) -> Result<u8, SensorError> {
        let mut buffer = [0u8; 1];
        self.i2c
            .write_read(addr, &[ADT74X0_ID], &mut buffer)
            .map_err(|e| SensorError::at_stage(e, SensorError::IdentityRead))?;

        let id = buffer[0];
        debug!("0x{:02x} has ID 0x{:02x}", addr, id);
        if is_adt74x0_id(id) {
            Ok(id)
        } else {
            Err(SensorError::IdentityMismatch { id })
        }
    }

    pub fn read_temperature(&mut self, addr: u8) -> Result<Temperature, SensorError> {
        let mut buffer = [0u8; 2];
        self.i2c
            .write_read(addr, &[ADT74X0_T_MSB], &mut buffer)
            .map_err(|e| SensorError::at_stage(e, SensorError::Read))?;

        Ok(Temperature::from_wire(buffer))
    }

    /// Reset, settle, optionally check the ID, then start continuous conversions.
    fn init_device(&mut self, addr: u8, report: &mut ScanReport) -> Result<(), SensorError> {
        self.reset_device(addr)?;
        self.delay.delay_us(self.config.settle_time_us);

        if self.config.verify_identity {
            let identity = self.verify_identity(addr);
            if let Ok(id) | Err(SensorError::IdentityMismatch { id }) = &identity {
                report.identities.insert(addr, *id);
            }
            identity?;
        }

        self.configure_device(addr)
    }

    pub fn scan(&mut self) -> ScanReport {
        let mut report = ScanReport {
            statuses: self
                .config
                .addresses
                .clone()
                .map(|addr| {
                    let status = if ADT74X0_ADDR_WINDOW.contains(&addr) {
                        DeviceStatus::Candidate
                    } else {
                        DeviceStatus::Unscanned
                    };
                    (addr, status)
                })
                .collect(),
            identities: BTreeMap::new(),
        };

        let candidates = report.addresses_with(|s| matches!(s, DeviceStatus::Candidate));
        for &addr in &candidates {
            let status = match self.init_device(addr, &mut report) {
                Ok(()) => DeviceStatus::Initialized,
                Err(error) => {
                    warn!("0x{:02x} failed to initialize: {}", addr, error);
                    DeviceStatus::InitFailed(error)
                }
            };
            report.statuses.insert(addr, status);
        }

        let initialized = report.addresses_with(|s| matches!(s, DeviceStatus::Initialized));
        if initialized.is_empty() {
            info!("No sensor initialized, skipping conversion wait");
            return report;
        }

        debug!(
            "Waiting {} ms for {} sensor(s) to convert",
            self.config.conversion_time_ms,
            initialized.len()
        );
        self.delay.delay_ms(self.config.conversion_time_ms);

        for addr in initialized {
            let status = match self.read_temperature(addr) {
                Ok(temperature) => DeviceStatus::ReadOk(temperature),
                Err(error) => {
                    warn!("0x{:02x} failed to read: {}", addr, error);
                    DeviceStatus::ReadFailed(error)
                }
            };
            report.statuses.insert(addr, status);
        }

        report
    }

    /// Give the bus back. Dropping the reader does the same.
    pub fn release(self) -> I {
        self.i2c
    }
}

/// Outcome of a scan, by address.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScanReport {
    pub statuses: BTreeMap<u8, DeviceStatus>,
    /// ID register contents for every address where it was read.
    pub identities: BTreeMap<u8, u8>,
}

impl ScanReport {
    fn addresses_with(&self, pred: impl Fn(&DeviceStatus) -> bool) -> Vec<u8> {
        self.statuses
            .iter()
            .filter(|(_, status)| pred(status))
            .map(|(&addr, _)| addr)
            .collect()
    }

    pub fn status(&self, addr: u8) -> Option<&DeviceStatus> {
        self.statuses.get(&addr)
    }

    pub fn temperatures(&self) -> impl Iterator<Item = (u8, Temperature)> + '_ {
        self.statuses.iter().filter_map(|(&addr, status)| match status {
            DeviceStatus::ReadOk(t) => Some((addr, *t)),
            _ => None,
        })
    }

    /// One comment per ID read, then one line per probed address. Transport
    /// details only go to the log.
    pub fn write_to(&self, out: &mut impl Write) -> io::Result<()> {
        for (addr, id) in &self.identities {
            writeln!(out, "# 0x{:02x} has ID 0x{:02x}", addr, id)?;
        }

        for (addr, status) in &self.statuses {
            match status {
                DeviceStatus::ReadOk(temperature) => {
                    writeln!(out, "0x{:02x} {}", addr, temperature)?
                }
                DeviceStatus::InitFailed(error) | DeviceStatus::ReadFailed(error) => {
                    writeln!(out, "# 0x{:02x} error {}", addr, error.code())?
                }
                DeviceStatus::Unscanned | DeviceStatus::Candidate | DeviceStatus::Initialized => {}
            }
        }

        Ok(())
    }
}
