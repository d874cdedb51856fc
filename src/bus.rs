use std::fmt;
use std::path::Path;

use embedded_hal::i2c::{Error as _, ErrorKind, NoAcknowledgeSource};
use linux_embedded_hal::i2cdev::linux::LinuxI2CError;
use linux_embedded_hal::{I2CError, I2cdev};
use log::{debug, warn};
use rppal::i2c::{Error as RppalError, I2c};

use crate::error::BusOpenError;

const EBUSY: i32 = 16;

/// A failure reported by the bus driver, with the driver's own integer code
/// (an errno on both Linux backends, -1 when the driver has none).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportError {
    pub code: i32,
    pub kind: ErrorKind,
    pub message: String,
    /// The device address itself was refused, as opposed to a later byte.
    pub address_rejected: bool,
}

impl TransportError {
    pub fn new(code: i32, kind: ErrorKind, message: impl Into<String>) -> Self {
        TransportError {
            code,
            kind,
            message: message.into(),
            address_rejected: kind == ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address),
        }
    }

    fn from_linux(error: &LinuxI2CError, kind: ErrorKind) -> Self {
        let (code, message) = match error {
            LinuxI2CError::Errno(errno) => (
                *errno,
                std::io::Error::from_raw_os_error(*errno).to_string(),
            ),
            LinuxI2CError::Io(io) => (io.raw_os_error().unwrap_or(-1), io.to_string()),
        };
        let mut transport = TransportError::new(code, kind, message);
        // Another driver owns the address; the kernel refuses to let us talk to it
        transport.address_rejected |= code == EBUSY;
        transport
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} (code {})", self.message, self.code)
    }
}

impl std::error::Error for TransportError {}

/// HALs that only report an [`ErrorKind`].
impl From<ErrorKind> for TransportError {
    fn from(kind: ErrorKind) -> Self {
        TransportError::new(-1, kind, kind.to_string())
    }
}

impl From<LinuxI2CError> for TransportError {
    fn from(error: LinuxI2CError) -> Self {
        TransportError::from_linux(&error, ErrorKind::Other)
    }
}

impl From<I2CError> for TransportError {
    fn from(error: I2CError) -> Self {
        TransportError::from_linux(error.inner(), error.kind())
    }
}

impl From<RppalError> for TransportError {
    fn from(error: RppalError) -> Self {
        let kind = error.kind();
        let mut transport = match &error {
            RppalError::Io(io) => {
                TransportError::new(io.raw_os_error().unwrap_or(-1), kind, io.to_string())
            }
            other => TransportError::new(-1, kind, other.to_string()),
        };
        transport.address_rejected |= matches!(error, RppalError::InvalidSlaveAddress(_));
        transport
    }
}

// --- --- --- --- Linux /dev/i2c-N --- --- --- ---

pub const DEFAULT_I2C_DEV: &str = "/dev/i2c-0";

/// Open a kernel I2C character device. Sensor addresses are only selected
/// per transfer, so a refused address never fails the open.
pub fn open_i2cdev(path: impl AsRef<Path>) -> Result<I2cdev, BusOpenError> {
    let path = path.as_ref();
    I2cdev::new(path).map_err(|error| BusOpenError {
        target: path.display().to_string(),
        source: error.into(),
    })
}

// --- --- --- --- Raspberry Pi I2C peripheral --- --- --- ---

/// Clock the sensors were qualified at. Long or badly terminated cables need
/// this instead of the usual 100 kHz.
pub const RASPI_TARGET_CLOCK_HZ: u32 = 10_000;

const RASPI_TIMEOUT_MS: u32 = 100;

pub const RASPI_BUS_NAME: &str = "Raspberry Pi I2C";

/// Acquire the Pi's primary I2C peripheral (the one on the GPIO header).
///
/// rppal cannot change the clock (that is set with `dtparam=i2c_arm_baudrate`
/// at boot), so the configured speed is only checked against the target.
pub fn open_raspi() -> Result<I2c, BusOpenError> {
    let open_error = |error: RppalError| BusOpenError {
        target: RASPI_BUS_NAME.to_string(),
        source: error.into(),
    };

    let i2c = I2c::new().map_err(open_error)?;
    i2c.set_timeout(RASPI_TIMEOUT_MS).map_err(open_error)?;
    let bus = i2c.bus();

    match i2c.clock_speed() {
        Ok(RASPI_TARGET_CLOCK_HZ) => {
            debug!("I2C bus {} clock is {} Hz", bus, RASPI_TARGET_CLOCK_HZ)
        }
        Ok(hz) => warn!(
            "I2C bus {} runs at {} Hz, {} Hz is recommended (set dtparam=i2c_arm_baudrate={})",
            bus, hz, RASPI_TARGET_CLOCK_HZ, RASPI_TARGET_CLOCK_HZ
        ),
        Err(error) => warn!("Could not read I2C clock speed: {}", error),
    }

    Ok(i2c)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linux_errno_is_preserved() {
        let error = TransportError::from(I2CError::from(LinuxI2CError::Errno(121)));
        assert_eq!(error.code, 121);
        assert!(!error.address_rejected);
    }

    #[test]
    fn claimed_address_counts_as_rejected() {
        let error = TransportError::from(I2CError::from(LinuxI2CError::Errno(EBUSY)));
        assert_eq!(error.code, EBUSY);
        assert!(error.address_rejected);
    }

    #[test]
    fn io_errors_keep_their_os_code() {
        let io = std::io::Error::from_raw_os_error(6);
        let error = TransportError::from(LinuxI2CError::Io(io));
        assert_eq!(error.code, 6);
    }

    #[test]
    fn address_nack_counts_as_rejected() {
        let error = TransportError::from(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address));
        assert!(error.address_rejected);
        assert_eq!(error.code, -1);

        let error = TransportError::from(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data));
        assert!(!error.address_rejected);
    }

    #[test]
    fn rppal_invalid_address_counts_as_rejected() {
        let error = TransportError::from(RppalError::InvalidSlaveAddress(0x80));
        assert_eq!(error.code, -1);
        assert!(error.address_rejected);
        assert!(!error.message.is_empty());
    }

    #[test]
    fn missing_device_file_is_a_bus_open_error() {
        let error = open_i2cdev("/nonexistent/i2c-99")
            .err()
            .expect("opening a missing device should fail");
        assert_eq!(error.target, "/nonexistent/i2c-99");
        assert_eq!(error.source.code, 2); // ENOENT
    }

    #[test]
    fn display_includes_the_code() {
        let error = TransportError::from(LinuxI2CError::Errno(121));
        assert_eq!(error.to_string(), "Remote I/O error (os error 121) (code 121)");
    }
}
