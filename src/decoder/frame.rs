//! W820 notification frame layouts
//!
//! The station answers a data request with three notifications, each tagged
//! by its first byte:
//! - Type 1: indoor/outdoor temperature and humidity, battery flag
//! - Type 2: barometric pressure
//! - Type 3: wind, rain counters and UV index
//!
//! Byte 1 of every frame carries the display-unit selectors of the station.
//! Multi-byte values are big-endian.
use crate::decoder::error::MalformedFrame;
use crate::decoder::units::{PressureUnit, RainUnit, TemperatureUnit, WindUnit};
use crate::models::SensorReading;

pub const TEMPERATURE_HUMIDITY_TYPE: u8 = 1;
pub const PRESSURE_TYPE: u8 = 2;
pub const WIND_RAIN_UV_TYPE: u8 = 3;

const TEMPERATURE_HUMIDITY_LEN: usize = 15;
const PRESSURE_LEN: usize = 5;
const WIND_RAIN_UV_LEN: usize = 19;

const LOW_BATTERY_MASK: u8 = 0x08;

#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    TemperatureHumidity(TemperatureHumidity),
    Pressure(Pressure),
    WindRainUv(WindRainUv),
}

/// Decoded type 1 frame, temperatures already in °C
#[derive(Debug, Clone, PartialEq)]
pub struct TemperatureHumidity {
    pub temperature_unit: TemperatureUnit,
    pub indoor_temperature: f64,
    pub outdoor_temperature: f64,
    pub indoor_humidity: u8,
    pub outdoor_humidity: u8,
    pub low_battery: bool,
}

/// Decoded type 2 frame
#[derive(Debug, Clone, PartialEq)]
pub struct Pressure {
    #[allow(dead_code)]
    pub unit: PressureUnit,
    /// hPa
    pub air_pressure: f64,
}

/// Decoded type 3 frame, rain in mm
///
/// Wind speed stays raw here because its conversion depends on the
/// temperature unit, which only type 1 frames carry.
#[derive(Debug, Clone, PartialEq)]
pub struct WindRainUv {
    #[allow(dead_code)]
    pub rain_unit: RainUnit,
    pub wind_unit: WindUnit,
    pub uv: u8,
    pub rain_daily: f64,
    pub rain_weekly: f64,
    pub rain_monthly: f64,
    pub rain_total: f64,
    pub raw_wind_speed: u32,
    pub wind_chill: f64,
    pub wind_direction: u8,
}

impl Frame {
    /// Parse a raw notification payload
    ///
    /// # Arguments
    /// * `data` - Notification bytes as received from the station
    ///
    /// # Returns
    /// The decoded frame, or `MalformedFrame` for empty, unknown or truncated payloads
    pub fn parse(data: &[u8]) -> Result<Self, MalformedFrame> {
        let Some(&frame_type) = data.first() else {
            return Err(MalformedFrame::Empty);
        };

        match frame_type {
            TEMPERATURE_HUMIDITY_TYPE => {
                check_len(data, TEMPERATURE_HUMIDITY_LEN)?;
                Ok(Frame::TemperatureHumidity(TemperatureHumidity::parse(data)))
            }
            PRESSURE_TYPE => {
                check_len(data, PRESSURE_LEN)?;
                Ok(Frame::Pressure(Pressure::parse(data)))
            }
            WIND_RAIN_UV_TYPE => {
                check_len(data, WIND_RAIN_UV_LEN)?;
                Ok(Frame::WindRainUv(WindRainUv::parse(data)))
            }
            other => Err(MalformedFrame::UnknownType(other)),
        }
    }

    pub fn frame_type(&self) -> u8 {
        match self {
            Frame::TemperatureHumidity(_) => TEMPERATURE_HUMIDITY_TYPE,
            Frame::Pressure(_) => PRESSURE_TYPE,
            Frame::WindRainUv(_) => WIND_RAIN_UV_TYPE,
        }
    }

    /// Write the fields owned by this frame type into `reading`
    pub fn apply(&self, reading: &mut SensorReading) {
        match self {
            Frame::TemperatureHumidity(frame) => frame.apply(reading),
            Frame::Pressure(frame) => frame.apply(reading),
            Frame::WindRainUv(frame) => frame.apply(reading),
        }
    }
}

impl TemperatureHumidity {
    fn parse(data: &[u8]) -> Self {
        let flags = data[1];
        let temperature_unit = TemperatureUnit::from_flags(flags);

        Self {
            temperature_unit,
            indoor_temperature: temperature_unit.to_celsius(decode_temperature(data[5], data[6])),
            outdoor_temperature: temperature_unit
                .to_celsius(decode_temperature(data[12], data[13])),
            indoor_humidity: data[7],
            outdoor_humidity: data[14],
            low_battery: flags & LOW_BATTERY_MASK != 0,
        }
    }

    fn apply(&self, reading: &mut SensorReading) {
        reading.temperature_unit = Some(self.temperature_unit);
        reading.indoor_temperature = Some(self.indoor_temperature);
        reading.outdoor_temperature = Some(self.outdoor_temperature);
        reading.indoor_humidity = Some(self.indoor_humidity);
        reading.outdoor_humidity = Some(self.outdoor_humidity);
        reading.low_battery = Some(self.low_battery);

        // A wind frame that arrived first can be converted now
        if let Some((raw, wind_unit)) = reading.pending_wind.take() {
            reading.wind_speed =
                Some(wind_unit.to_kilometres_per_hour(raw, self.temperature_unit));
        }
    }
}

impl Pressure {
    fn parse(data: &[u8]) -> Self {
        let unit = PressureUnit::from_flags(data[1]);

        Self {
            unit,
            air_pressure: unit.to_hectopascal(be16(data[3], data[4])),
        }
    }

    fn apply(&self, reading: &mut SensorReading) {
        reading.air_pressure = Some(self.air_pressure);
    }
}

impl WindRainUv {
    fn parse(data: &[u8]) -> Self {
        let flags = data[1];
        let rain_unit = RainUnit::from_flags(flags);
        let rain_factor = rain_unit.factor();

        Self {
            rain_unit,
            wind_unit: WindUnit::from_flags(flags),
            uv: data[18],
            rain_daily: be16(data[3], data[4]) as f64 * rain_factor,
            rain_weekly: be16(data[5], data[6]) as f64 * rain_factor,
            rain_monthly: be24(data[7], data[8], data[9]) as f64 * rain_factor,
            rain_total: be24(data[15], data[16], data[17]) as f64 * rain_factor,
            raw_wind_speed: be16(data[11], data[12]),
            wind_chill: be16(data[13], data[14]) as f64 / 10.0,
            wind_direction: data[10],
        }
    }

    /// Wind speed in km/h, if the conversion does not need the temperature
    /// unit or it is already known
    fn wind_speed(&self, temperature_unit: Option<TemperatureUnit>) -> Option<f64> {
        let needs_temperature_unit = !matches!(
            self.wind_unit,
            WindUnit::KilometresPerHour | WindUnit::Beaufort
        );

        match (temperature_unit, needs_temperature_unit) {
            (Some(unit), _) => Some(self.wind_unit.to_kilometres_per_hour(self.raw_wind_speed, unit)),
            // Correction is the same either way
            (None, false) => Some(
                self.wind_unit
                    .to_kilometres_per_hour(self.raw_wind_speed, TemperatureUnit::Celsius),
            ),
            (None, true) => None,
        }
    }

    fn apply(&self, reading: &mut SensorReading) {
        reading.uv = Some(self.uv);
        reading.rain_daily = Some(self.rain_daily);
        reading.rain_weekly = Some(self.rain_weekly);
        reading.rain_monthly = Some(self.rain_monthly);
        reading.rain_total = Some(self.rain_total);
        reading.wind_chill = Some(self.wind_chill);
        reading.wind_direction = Some(self.wind_direction);

        match self.wind_speed(reading.temperature_unit) {
            Some(speed) => {
                reading.wind_speed = Some(speed);
                reading.pending_wind = None;
            }
            None => {
                reading.wind_speed = None;
                reading.pending_wind = Some((self.raw_wind_speed, self.wind_unit));
            }
        }
    }
}

fn check_len(data: &[u8], expected: usize) -> Result<(), MalformedFrame> {
    if data.len() < expected {
        return Err(MalformedFrame::TooShort {
            frame_type: data[0],
            expected,
            actual: data.len(),
        });
    }

    Ok(())
}

/// Decode a temperature in tenths of a degree
///
/// Negative values are not plain two's complement: each byte is complemented
/// on its own, so 0xFF 0xFF is -0.0 and 0xFF 0xFE is -0.1.
fn decode_temperature(high: u8, low: u8) -> f64 {
    if high < 127 {
        (high as u32 * 256 + low as u32) as f64 / 10.0
    } else {
        -(((255 - high) as u32 * 256 + (255 - low) as u32) as f64) / 10.0
    }
}

fn be16(high: u8, low: u8) -> u32 {
    u16::from_be_bytes([high, low]) as u32
}

fn be24(high: u8, mid: u8, low: u8) -> u32 {
    u32::from_be_bytes([0x00, high, mid, low])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    fn temperature_frame(flags: u8, indoor: [u8; 2], outdoor: [u8; 2]) -> Vec<u8> {
        let mut data = vec![0u8; TEMPERATURE_HUMIDITY_LEN];
        data[0] = TEMPERATURE_HUMIDITY_TYPE;
        data[1] = flags;
        data[5] = indoor[0];
        data[6] = indoor[1];
        data[7] = 45;
        data[12] = outdoor[0];
        data[13] = outdoor[1];
        data[14] = 60;
        data
    }

    #[test]
    fn positive_temperatures() {
        assert_eq!(decode_temperature(0, 215), 21.5);
        assert_eq!(decode_temperature(10, 50), 261.0);
        assert_eq!(decode_temperature(126, 255), 3251.1);
    }

    #[test]
    fn negative_temperatures_complement_each_byte() {
        assert_eq!(decode_temperature(0xff, 0xfe), -0.1);
        assert_eq!(decode_temperature(0xff, 0x9b), -10.0);
        assert_eq!(decode_temperature(0xfe, 0xff), -25.6);
        // 127 is already on the negative side
        assert_eq!(decode_temperature(127, 255), -3276.8);

        for high in 127..=255u8 {
            for low in [0u8, 1, 100, 254] {
                let expected = -((((255 - high) as u32) * 256 + (255 - low) as u32) as f64 / 10.0);
                assert_eq!(decode_temperature(high, low), expected);
                assert!(decode_temperature(high, low) < 0.0);
            }
        }
    }

    #[test]
    fn temperature_frame_in_celsius() {
        let data = temperature_frame(0x00, [10, 50], [20, 100]);

        let Frame::TemperatureHumidity(frame) = Frame::parse(&data).unwrap() else {
            panic!("expected temperature/humidity frame");
        };

        assert_eq!(frame.temperature_unit, TemperatureUnit::Celsius);
        assert_eq!(frame.indoor_temperature, 261.0);
        assert_eq!(frame.outdoor_temperature, 522.0);
        assert_eq!(frame.indoor_humidity, 45);
        assert_eq!(frame.outdoor_humidity, 60);
        assert!(!frame.low_battery);
    }

    #[test]
    fn temperature_frame_in_fahrenheit() {
        // 68.0°F indoors, -4.0°F outdoors
        let data = temperature_frame(0x02 | LOW_BATTERY_MASK, [0x02, 0xa8], [0xff, 0xd7]);

        let Frame::TemperatureHumidity(frame) = Frame::parse(&data).unwrap() else {
            panic!("expected temperature/humidity frame");
        };

        assert_eq!(frame.temperature_unit, TemperatureUnit::Fahrenheit);
        assert_close(frame.indoor_temperature, (68.0 - 32.0) / 1.8);
        assert_close(frame.outdoor_temperature, (-4.0 - 32.0) / 1.8);
        assert!(frame.low_battery);
    }

    #[test]
    fn pressure_frame_in_inches_of_mercury() {
        let data = [PRESSURE_TYPE, 0b100, 0, 10, 0];

        let Frame::Pressure(frame) = Frame::parse(&data).unwrap() else {
            panic!("expected pressure frame");
        };

        assert_eq!(frame.unit, PressureUnit::InchMercury);
        assert_close(frame.air_pressure, 2560.0 * 0.338639);
        assert!((frame.air_pressure - 866.92).abs() < 0.01);
    }

    #[test]
    fn pressure_selectors_zero_and_one_agree() {
        let hpa = Frame::parse(&[PRESSURE_TYPE, 0b000, 0, 0x27, 0x94]).unwrap();
        let mmhg = Frame::parse(&[PRESSURE_TYPE, 0b010, 0, 0x27, 0x94]).unwrap();

        let (Frame::Pressure(hpa), Frame::Pressure(mmhg)) = (hpa, mmhg) else {
            panic!("expected pressure frames");
        };

        assert_eq!(hpa.air_pressure, 1013.2);
        assert_eq!(hpa.air_pressure, mmhg.air_pressure);
    }

    #[test]
    fn wind_rain_frame_shares_rain_factor() {
        let mut data = [0u8; WIND_RAIN_UV_LEN];
        data[0] = WIND_RAIN_UV_TYPE;
        data[1] = 0x10;
        data[3..5].copy_from_slice(&[0, 100]);
        data[5..7].copy_from_slice(&[1, 0]);
        data[7..10].copy_from_slice(&[1, 0, 0]);
        data[10] = 4;
        data[11..13].copy_from_slice(&[0, 55]);
        data[13..15].copy_from_slice(&[0, 123]);
        data[15..18].copy_from_slice(&[0, 2, 0]);
        data[18] = 7;

        let Frame::WindRainUv(frame) = Frame::parse(&data).unwrap() else {
            panic!("expected wind/rain/UV frame");
        };

        let factor = 0.01 * 25.4;
        assert_eq!(frame.rain_unit, RainUnit::Inch);
        assert_close(frame.rain_daily, 100.0 * factor);
        assert_close(frame.rain_weekly, 256.0 * factor);
        assert_close(frame.rain_monthly, 65536.0 * factor);
        assert_close(frame.rain_total, 512.0 * factor);
        assert_eq!(frame.raw_wind_speed, 55);
        assert_eq!(frame.wind_unit, WindUnit::KilometresPerHour);
        assert_eq!(frame.wind_chill, 12.3);
        assert_eq!(frame.wind_direction, 4);
        assert_eq!(frame.uv, 7);
    }

    #[test]
    fn rejects_short_frames() {
        assert_eq!(Frame::parse(&[]), Err(MalformedFrame::Empty));
        assert_eq!(
            Frame::parse(&[TEMPERATURE_HUMIDITY_TYPE; 14]),
            Err(MalformedFrame::TooShort {
                frame_type: TEMPERATURE_HUMIDITY_TYPE,
                expected: 15,
                actual: 14,
            })
        );
        assert_eq!(
            Frame::parse(&[PRESSURE_TYPE, 0, 0, 0]),
            Err(MalformedFrame::TooShort {
                frame_type: PRESSURE_TYPE,
                expected: 5,
                actual: 4,
            })
        );
        assert_eq!(
            Frame::parse(&[WIND_RAIN_UV_TYPE; 18]),
            Err(MalformedFrame::TooShort {
                frame_type: WIND_RAIN_UV_TYPE,
                expected: 19,
                actual: 18,
            })
        );
    }

    #[test]
    fn rejects_unknown_frame_types() {
        assert_eq!(Frame::parse(&[0; 20]), Err(MalformedFrame::UnknownType(0)));
        assert_eq!(Frame::parse(&[4; 20]), Err(MalformedFrame::UnknownType(4)));
    }

    #[test]
    fn frame_type_round_trips_discriminator() {
        let frame = Frame::parse(&[PRESSURE_TYPE, 0, 0, 0, 0]).unwrap();
        assert_eq!(frame.frame_type(), PRESSURE_TYPE);
    }
}
