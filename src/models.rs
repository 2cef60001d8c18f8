use time::OffsetDateTime;

use crate::decoder::units::{TemperatureUnit, WindUnit};

/// Metric sensor reading merged from the three W820 frame types
///
/// Each frame type owns a disjoint set of fields. A reading is built up over
/// one station session and is never cleared by the decoder, so callers that
/// want a fresh observation create a new one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SensorReading {
    pub indoor_temperature: Option<f64>,
    pub outdoor_temperature: Option<f64>,
    pub indoor_humidity: Option<u8>,
    pub outdoor_humidity: Option<u8>,
    pub low_battery: Option<bool>,
    /// Display unit of the station at decode time, needed for the wind speed correction
    pub temperature_unit: Option<TemperatureUnit>,
    pub air_pressure: Option<f64>,
    pub uv: Option<u8>,
    pub rain_daily: Option<f64>,
    pub rain_weekly: Option<f64>,
    pub rain_monthly: Option<f64>,
    pub rain_total: Option<f64>,
    pub wind_speed: Option<f64>,
    pub wind_chill: Option<f64>,
    /// Compass sector 0..=15, clockwise from north in 22.5° steps
    pub wind_direction: Option<u8>,
    /// Raw wind speed waiting for the temperature unit to arrive
    pub(crate) pending_wind: Option<(u32, WindUnit)>,
}

impl SensorReading {
    pub fn new() -> Self {
        Self::default()
    }

    /// A reading is only worth packaging once the temperature frame was seen
    pub fn is_valid(&self) -> bool {
        self.indoor_temperature.is_some()
    }

    /// Flatten the reading into `(key, value)` pairs, skipping absent fields
    ///
    /// Keys follow the station's own field names, flags are exported as 0/1.
    pub fn fields(&self) -> Vec<(&'static str, f64)> {
        let flag = |b: bool| if b { 1.0 } else { 0.0 };

        [
            ("indoorTemperature", self.indoor_temperature),
            ("outdoorTemperature", self.outdoor_temperature),
            ("indoorHumidity", self.indoor_humidity.map(f64::from)),
            ("outdoorHumidity", self.outdoor_humidity.map(f64::from)),
            ("lowBat", self.low_battery.map(flag)),
            (
                "degF",
                self.temperature_unit
                    .map(|u| flag(u == TemperatureUnit::Fahrenheit)),
            ),
            ("airPressure", self.air_pressure),
            ("UV", self.uv.map(f64::from)),
            ("rainDaily", self.rain_daily),
            ("rainWeekly", self.rain_weekly),
            ("rainMonthly", self.rain_monthly),
            ("rainTotal", self.rain_total),
            ("windSpeed", self.wind_speed),
            ("windChill", self.wind_chill),
            ("windDirection", self.wind_direction.map(f64::from)),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.map(|v| (key, v)))
        .collect()
    }
}

/// One packaged observation handed to the consumer, metric throughout
#[derive(Debug, Clone, PartialEq)]
pub struct Packet {
    pub date_time: OffsetDateTime,
    pub in_temp: Option<f64>,
    pub in_humidity: Option<u8>,
    pub out_temp: Option<f64>,
    pub out_humidity: Option<u8>,
    /// hPa
    pub barometer: Option<f64>,
    pub out_temp_battery_status: Option<bool>,
    pub uv: Option<u8>,
    /// km/h
    pub wind_speed: Option<f64>,
    /// Degrees, only set while the wind is blowing
    pub wind_dir: Option<f64>,
    pub wind_gust: Option<f64>,
    pub wind_gust_dir: Option<f64>,
    pub wind_chill: Option<f64>,
    /// Station rain counter in cm
    pub rain_total: Option<f64>,
    /// Rain since the previous packet in cm
    pub rain: Option<f64>,
}
