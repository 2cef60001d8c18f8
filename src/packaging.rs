//! Packaging of decoded readings into consumer packets
//!
//! The decoder already delivers metric values. Packaging renames fields,
//! converts the rain counter from mm to cm and turns the monotonic station
//! counter into rain since the previous packet.
use log::warn;
use time::OffsetDateTime;

use crate::models::{Packet, SensorReading};

/// Degrees per compass sector reported by the station
const WIND_SECTOR_DEGREES: f64 = 22.5;
const MM_PER_CM: f64 = 10.0;

/// Build a packet from a finished reading
///
/// # Arguments
/// * `reading` - Reading merged from all frames of one station session
/// * `date_time` - Timestamp to stamp the packet with
/// * `last_rain_total` - Rain counter of the previous packet in cm, if any
///
/// # Returns
/// Packet in metric units with rain in cm
pub fn to_packet(
    reading: &SensorReading,
    date_time: OffsetDateTime,
    last_rain_total: Option<f64>,
) -> Packet {
    let wind_speed = reading.wind_speed;

    // Direction is meaningless in calm air
    let wind_dir = match (wind_speed, reading.wind_direction) {
        (Some(speed), Some(sector)) if speed != 0.0 => Some(sector as f64 * WIND_SECTOR_DEGREES),
        _ => None,
    };

    let rain_total = reading.rain_total.map(|mm| mm / MM_PER_CM);

    Packet {
        date_time,
        in_temp: reading.indoor_temperature,
        in_humidity: reading.indoor_humidity,
        out_temp: reading.outdoor_temperature,
        out_humidity: reading.outdoor_humidity,
        barometer: reading.air_pressure,
        out_temp_battery_status: reading.low_battery,
        uv: reading.uv,
        wind_speed,
        wind_dir,
        wind_gust: None,
        wind_gust_dir: None,
        wind_chill: reading.wind_chill,
        rain_total,
        rain: calculate_rain(rain_total, last_rain_total),
    }
}

/// Rain since the previous counter value
///
/// Returns None when either total is unknown or the counter went backwards,
/// which happens when the station is reset.
pub fn calculate_rain(new_total: Option<f64>, last_total: Option<f64>) -> Option<f64> {
    match (new_total, last_total) {
        (Some(new_total), Some(last_total)) if new_total >= last_total => {
            Some(new_total - last_total)
        }
        (Some(new_total), Some(last_total)) => {
            warn!(
                "Rain counter decrement detected: new={} old={}",
                new_total, last_total
            );
            None
        }
        _ => None,
    }
}
