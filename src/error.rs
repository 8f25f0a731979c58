use thiserror::Error;

#[derive(Debug, Error)]
pub enum BleError {
    #[error("Bluetooth error: {0}")]
    Bluetooth(#[from] bluer::Error),
    #[error("Bluetooth adapter unavailable: {0}")]
    AdapterUnavailable(String),
    #[error("Invalid peripheral identifier: {0}")]
    InvalidId(String),
    #[error("Unknown peripheral: {0} is not in the device list")]
    UnknownPeripheral(String),
    #[error("Native binding failed: {0}")]
    Native(String),
}

pub type Result<T> = std::result::Result<T, BleError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_subject() {
        let unavailable = BleError::AdapterUnavailable("hci1: No such adapter".to_string());
        assert_eq!(
            unavailable.to_string(),
            "Bluetooth adapter unavailable: hci1: No such adapter"
        );

        let unknown = BleError::UnknownPeripheral("AA:BB:CC:DD:EE:FF".to_string());
        assert_eq!(
            unknown.to_string(),
            "Unknown peripheral: AA:BB:CC:DD:EE:FF is not in the device list"
        );
    }
}
