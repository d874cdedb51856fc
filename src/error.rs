use thiserror::Error;

use crate::bus::TransportError;

/// The bus itself could not be acquired. Nothing can be scanned without it.
#[derive(Debug, Error)]
#[error("Unable to open {target}")]
pub struct BusOpenError {
    pub target: String,
    #[source]
    pub source: TransportError,
}

/// Something went wrong talking to one sensor. Only that address is affected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SensorError {
    #[error("address not accepted: {0}")]
    AddressSelect(TransportError),

    #[error("could not write reset command: {0}")]
    Reset(TransportError),

    #[error("could not read ID register: {0}")]
    IdentityRead(TransportError),

    #[error("ID {id:#04x} is not an ADT74x0")]
    IdentityMismatch { id: u8 },

    #[error("could not write configuration: {0}")]
    Config(TransportError),

    #[error("could not read temperature: {0}")]
    Read(TransportError),
}

impl SensorError {
    /// Stage code printed on the error line, one per step of the init/read sequence.
    pub fn code(&self) -> i32 {
        match self {
            SensorError::AddressSelect(_) => -1,
            SensorError::Reset(_) => -2,
            SensorError::IdentityRead(_) => -3,
            SensorError::IdentityMismatch { .. } => -4,
            SensorError::Config(_) => -5,
            SensorError::Read(_) => -6,
        }
    }

    /// The transport failure underneath, if the bus reported one.
    pub fn transport(&self) -> Option<&TransportError> {
        match self {
            SensorError::AddressSelect(source)
            | SensorError::Reset(source)
            | SensorError::IdentityRead(source)
            | SensorError::Config(source)
            | SensorError::Read(source) => Some(source),
            SensorError::IdentityMismatch { .. } => None,
        }
    }

    /// Attribute a transfer failure to `stage`, unless the device address
    /// itself was refused.
    pub(crate) fn at_stage(
        error: impl Into<TransportError>,
        stage: fn(TransportError) -> SensorError,
    ) -> SensorError {
        let error = error.into();
        if error.address_rejected {
            SensorError::AddressSelect(error)
        } else {
            stage(error)
        }
    }
}
