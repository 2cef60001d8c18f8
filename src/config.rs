use bluer::{Address, Uuid};
use log::info;
use std::env;
use std::time::Duration;

const DEFAULT_POLLING_INTERVAL_SECS: u64 = 60;
const DEFAULT_NOTIFICATION_TIMEOUT_SECS: u64 = 1;

#[derive(Debug, Clone)]
pub struct StationConfig {
    /// BLE address of the W820 station
    pub mac: Address,
    pub polling_interval: Duration,
    /// How long to wait for each notification frame
    pub notification_timeout: Duration,
    /// Data characteristic, auto-detected when unset
    pub characteristic_uuid: Option<Uuid>,
}

impl StationConfig {
    /// Load the configuration from the environment, `mac` takes precedence over W820_MAC
    pub fn new(mac: Option<Address>) -> Result<Self, Box<dyn std::error::Error>> {
        // Load environment variables
        dotenv::dotenv().ok();

        Self::from_lookup(with_mac_override(|key| env::var(key).ok(), mac))
    }

    /// Build the configuration from any key/value source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, Box<dyn std::error::Error>>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mac = lookup("W820_MAC")
            .ok_or("W820_MAC environment variable not set")?
            .trim()
            .parse::<Address>()
            .map_err(|e| format!("Invalid W820_MAC: {}", e))?;

        let polling_interval = Duration::from_secs(parse_secs(
            &lookup,
            "W820_POLLING_INTERVAL",
            DEFAULT_POLLING_INTERVAL_SECS,
        )?);

        let notification_timeout = Duration::from_secs(parse_secs(
            &lookup,
            "W820_NOTIFICATION_TIMEOUT",
            DEFAULT_NOTIFICATION_TIMEOUT_SECS,
        )?);

        let characteristic_uuid = match lookup("W820_CHARACTERISTIC_UUID") {
            Some(value) if !value.trim().is_empty() => Some(
                value
                    .trim()
                    .parse::<Uuid>()
                    .map_err(|e| format!("Invalid W820_CHARACTERISTIC_UUID: {}", e))?,
            ),
            _ => None,
        };

        info!(
            "Station {} polled every {}s (notification timeout {}s)",
            mac,
            polling_interval.as_secs(),
            notification_timeout.as_secs()
        );

        Ok(StationConfig {
            mac,
            polling_interval,
            notification_timeout,
            characteristic_uuid,
        })
    }
}

fn with_mac_override<F>(lookup: F, mac: Option<Address>) -> impl Fn(&str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    move |key| match (key, mac) {
        ("W820_MAC", Some(mac)) => Some(mac.to_string()),
        _ => lookup(key),
    }
}

fn parse_secs<F>(lookup: &F, key: &str, default: u64) -> Result<u64, Box<dyn std::error::Error>>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(value) = lookup(key) else {
        return Ok(default);
    };

    let secs = value
        .trim()
        .parse::<u64>()
        .map_err(|e| format!("Invalid {} '{}': {}", key, value, e))?;

    if secs == 0 {
        return Err(format!("{} must be greater than zero", key).into());
    }

    Ok(secs)
}
