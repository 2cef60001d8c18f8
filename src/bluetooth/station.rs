//! Bluetooth Low Energy session with a Ventus W820 weather station
//!
//! The station does not advertise its readings. A client has to connect,
//! subscribe to notifications on the data characteristic and request the
//! readings, which arrive as three separate frames:
//!
//! 1. write `b0 01 00 00` (request data), wait for a notification
//! 2. write `40 01 00 00` (ack), wait for the next notification
//! 3. write `40 01 00 00` (ack), wait for the last notification
use bluer::gatt::remote::Characteristic;
use bluer::gatt::CharacteristicFlags;
use bluer::{Adapter, AdapterEvent, Address, Device, Uuid};
use futures_util::{pin_mut, Stream, StreamExt};
use log::{debug, error, info, warn};
use tokio::time::{sleep, timeout, Duration};

use crate::config::StationConfig;
use crate::decoder::decode_frame;
use crate::models::SensorReading;

// W820 protocol constants
const REQUEST_DATA: [u8; 4] = [0xb0, 0x01, 0x00, 0x00]; // Ask the station for a reading
const ACK: [u8; 4] = [0x40, 0x01, 0x00, 0x00]; // Acknowledge a frame, station sends the next one
const FRAMES_PER_READING: usize = 3;

const DISCOVERY_TIMEOUT_SECS: u64 = 20; // How long to scan for an unknown station
const SERVICES_TIMEOUT_SECS: u64 = 10; // How long to wait for GATT service resolution
const SERVICES_POLL_MILLIS: u64 = 200;

/// Read one complete set of measurements from the station
///
/// Opens a fresh connection, runs the request/ack exchange and always
/// disconnects afterwards, whether the exchange succeeded or not.
///
/// # Arguments
/// * `config` - Station address and timing configuration
///
/// # Returns
/// Reading merged from every frame received, or error if the session fails
pub async fn read_station(
    config: &StationConfig,
) -> Result<SensorReading, Box<dyn std::error::Error>> {
    // Initialize Bluetooth session
    let session = match bluer::Session::new().await {
        Ok(session) => session,
        Err(e) => {
            error!("Failed to create Bluetooth session: {}", e);
            return Err(e.into());
        }
    };

    // Get the default Bluetooth adapter
    let adapter = match session.default_adapter().await {
        Ok(adapter) => adapter,
        Err(e) => {
            error!("Failed to get default Bluetooth adapter: {}", e);
            return Err(e.into());
        }
    };

    // Ensure Bluetooth adapter is powered on
    if let Err(e) = adapter.set_powered(true).await {
        error!("Failed to power on adapter: {}", e);
        return Err(e.into());
    }

    let device = find_station(&adapter, config.mac).await?;

    if !device.is_connected().await? {
        debug!("Connecting to {}", config.mac);
        device.connect().await?;
    }

    let result = exchange(&device, config).await;

    debug!("Disconnecting from {}", config.mac);
    if let Err(e) = device.disconnect().await {
        warn!("Failed to disconnect from {}: {}", config.mac, e);
    }

    result
}

/// Look up the station, scanning for it if BlueZ does not know it yet
async fn find_station(
    adapter: &Adapter,
    mac: Address,
) -> Result<Device, Box<dyn std::error::Error>> {
    if adapter.device_addresses().await?.contains(&mac) {
        return Ok(adapter.device(mac)?);
    }

    info!("Station {} not known yet, scanning", mac);

    let events = adapter.discover_devices().await?;
    pin_mut!(events);

    let found = timeout(Duration::from_secs(DISCOVERY_TIMEOUT_SECS), async {
        while let Some(event) = events.next().await {
            debug!("Discovery event: {:?}", event);
            if let AdapterEvent::DeviceAdded(addr) = event {
                if addr == mac {
                    return true;
                }
            }
        }
        false
    })
    .await
    .unwrap_or(false);

    if !found {
        return Err(format!(
            "Station {} not found within {}s",
            mac, DISCOVERY_TIMEOUT_SECS
        )
        .into());
    }

    Ok(adapter.device(mac)?)
}

/// Run the request/ack exchange on a connected station
async fn exchange(
    device: &Device,
    config: &StationConfig,
) -> Result<SensorReading, Box<dyn std::error::Error>> {
    wait_for_services(device).await?;

    let characteristic = find_data_characteristic(device, config.characteristic_uuid).await?;

    // Subscribing enables notifications on the station side
    let notifications = characteristic.notify().await?;
    pin_mut!(notifications);

    let mut reading = SensorReading::new();

    for index in 0..FRAMES_PER_READING {
        let command = if index == 0 { &REQUEST_DATA } else { &ACK };
        characteristic.write(command).await?;

        let Some(data) = next_frame(&mut notifications, config.notification_timeout).await else {
            warn!(
                "No frame {} of {} from {}",
                index + 1,
                FRAMES_PER_READING,
                config.mac
            );
            break;
        };

        if let Err(e) = decode_frame(&data, &mut reading) {
            warn!("Skipping malformed frame from {}: {}", config.mac, e);
        }
    }

    Ok(reading)
}

/// Wait for the next notification, None on timeout or closed stream
async fn next_frame<S>(notifications: &mut S, wait: Duration) -> Option<Vec<u8>>
where
    S: Stream<Item = Vec<u8>> + Unpin,
{
    match timeout(wait, notifications.next()).await {
        Ok(frame) => frame,
        Err(_) => None,
    }
}

async fn wait_for_services(device: &Device) -> Result<(), Box<dyn std::error::Error>> {
    let resolved = timeout(Duration::from_secs(SERVICES_TIMEOUT_SECS), async {
        loop {
            match device.is_services_resolved().await {
                Ok(true) => return Ok(()),
                Ok(false) => sleep(Duration::from_millis(SERVICES_POLL_MILLIS)).await,
                Err(e) => return Err(e),
            }
        }
    })
    .await;

    match resolved {
        Ok(result) => Ok(result?),
        Err(_) => Err("Timed out waiting for GATT services".into()),
    }
}

/// Find the characteristic the station talks through
async fn find_data_characteristic(
    device: &Device,
    wanted: Option<Uuid>,
) -> Result<Characteristic, Box<dyn std::error::Error>> {
    for service in device.services().await? {
        for characteristic in service.characteristics().await? {
            let uuid = characteristic.uuid().await?;
            let flags = characteristic.flags().await?;

            if is_data_characteristic(uuid, &flags, wanted) {
                debug!("Using characteristic {} for station data", uuid);
                return Ok(characteristic);
            }
        }
    }

    match wanted {
        Some(uuid) => Err(format!("Characteristic {} not found on station", uuid).into()),
        None => Err("No characteristic with write and notify support found".into()),
    }
}

/// A configured UUID wins, otherwise the first writable notifying characteristic is used
fn is_data_characteristic(uuid: Uuid, flags: &CharacteristicFlags, wanted: Option<Uuid>) -> bool {
    match wanted {
        Some(wanted) => uuid == wanted,
        None => flags.notify && (flags.write || flags.write_without_response),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;

    const DATA_UUID: Uuid = Uuid::from_u128(0x0000fff1_0000_1000_8000_00805f9b34fb);
    const OTHER_UUID: Uuid = Uuid::from_u128(0x00002a00_0000_1000_8000_00805f9b34fb);

    #[test]
    fn picks_writable_notifying_characteristic() {
        let mut data = CharacteristicFlags::default();
        data.write = true;
        data.notify = true;

        let mut read_only = CharacteristicFlags::default();
        read_only.read = true;
        read_only.notify = true;

        assert!(is_data_characteristic(DATA_UUID, &data, None));
        assert!(!is_data_characteristic(OTHER_UUID, &read_only, None));
    }

    #[test]
    fn configured_uuid_overrides_flags() {
        let flags = CharacteristicFlags::default();

        assert!(is_data_characteristic(DATA_UUID, &flags, Some(DATA_UUID)));
        assert!(!is_data_characteristic(OTHER_UUID, &flags, Some(DATA_UUID)));
    }

    #[tokio::test]
    async fn next_frame_returns_queued_notifications() {
        let mut notifications = stream::iter(vec![vec![1, 2], vec![3]]);

        assert_eq!(
            next_frame(&mut notifications, Duration::from_millis(50)).await,
            Some(vec![1, 2])
        );
        assert_eq!(
            next_frame(&mut notifications, Duration::from_millis(50)).await,
            Some(vec![3])
        );
        assert_eq!(
            next_frame(&mut notifications, Duration::from_millis(50)).await,
            None
        );
    }

    #[tokio::test]
    async fn next_frame_times_out() {
        let mut notifications = stream::pending::<Vec<u8>>();

        assert_eq!(
            next_frame(&mut notifications, Duration::from_millis(10)).await,
            None
        );
    }
}
