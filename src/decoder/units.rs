//! Unit selectors embedded in W820 frames and their conversion tables
//!
//! Every selector is read from byte 1 of a frame. Out-of-range bit patterns
//! are clamped to the highest known value instead of being rejected.

/// Temperature unit the station display is configured for (frame type 1, bit 1)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemperatureUnit {
    Celsius,
    Fahrenheit,
}

impl TemperatureUnit {
    const FAHRENHEIT_MASK: u8 = 0x02;

    pub fn from_flags(flags: u8) -> Self {
        if flags & Self::FAHRENHEIT_MASK != 0 {
            TemperatureUnit::Fahrenheit
        } else {
            TemperatureUnit::Celsius
        }
    }

    /// Convert a decoded temperature to °C
    pub fn to_celsius(self, value: f64) -> f64 {
        match self {
            TemperatureUnit::Celsius => value,
            TemperatureUnit::Fahrenheit => (value - 32.0) / 1.8,
        }
    }
}

/// Air pressure unit (frame type 2, bits 1-2)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PressureUnit {
    /// Raw value is 0.1 hPa
    Hectopascal,
    /// Labelled mmHg on the station, but the payload is still 0.1 hPa
    MillimetreMercury,
    InchMercury,
}

impl PressureUnit {
    pub fn from_flags(flags: u8) -> Self {
        match ((flags & 0x06) >> 1).min(2) {
            0 => PressureUnit::Hectopascal,
            1 => PressureUnit::MillimetreMercury,
            _ => PressureUnit::InchMercury,
        }
    }

    /// Convert the raw 16-bit pressure value into hPa
    pub fn to_hectopascal(self, raw: u32) -> f64 {
        match self {
            PressureUnit::Hectopascal | PressureUnit::MillimetreMercury => raw as f64 / 10.0,
            PressureUnit::InchMercury => raw as f64 * 0.338639,
        }
    }
}

/// Rain gauge unit (frame type 3, bit 4)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RainUnit {
    Millimetre,
    Inch,
}

impl RainUnit {
    const INCH_MASK: u8 = 0x10;

    pub fn from_flags(flags: u8) -> Self {
        if flags & Self::INCH_MASK != 0 {
            RainUnit::Inch
        } else {
            RainUnit::Millimetre
        }
    }

    /// Millimetres per raw counter step, shared by all four rain fields
    pub fn factor(self) -> f64 {
        match self {
            RainUnit::Millimetre => 0.1,
            RainUnit::Inch => 0.01 * 25.4,
        }
    }
}

/// Wind speed unit (frame type 3, bits 1-3)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindUnit {
    KilometresPerHour,
    MilesPerHour,
    MetresPerSecond,
    Knots,
    Beaufort,
}

impl WindUnit {
    pub fn from_flags(flags: u8) -> Self {
        match ((flags & 0x0e) >> 1).min(4) {
            0 => WindUnit::KilometresPerHour,
            1 => WindUnit::MilesPerHour,
            2 => WindUnit::MetresPerSecond,
            3 => WindUnit::Knots,
            _ => WindUnit::Beaufort,
        }
    }

    /// Multiplier from this unit to km/h, applied after the 0.1 resolution
    /// step. `None` when the station value is passed through untouched.
    pub fn factor(self) -> Option<f64> {
        match self {
            WindUnit::KilometresPerHour => Some(1.0),
            WindUnit::MilesPerHour => Some(1.60934),
            WindUnit::MetresPerSecond => Some(3.6),
            WindUnit::Knots => Some(1.85199539525386),
            // TODO: map Beaufort to km/h once a station in that mode has been sniffed
            WindUnit::Beaufort => None,
        }
    }

    /// Firmware correction for non-km/h wind speeds.
    ///
    /// The W820 scales these speeds differently depending on the configured
    /// *temperature* unit. Readings taken while the station shows Celsius need
    /// an extra empirical factor; Fahrenheit readings are already correct.
    pub fn firmware_correction(self, temperature_unit: TemperatureUnit) -> f64 {
        if temperature_unit == TemperatureUnit::Fahrenheit {
            return 1.0;
        }

        match self {
            WindUnit::MilesPerHour => 0.01313868613138686131,
            WindUnit::MetresPerSecond => 0.01157742402315484804,
            WindUnit::Knots => 0.03782505910165484633,
            WindUnit::KilometresPerHour | WindUnit::Beaufort => 1.0,
        }
    }

    /// Convert a raw wind speed counter into km/h
    pub fn to_kilometres_per_hour(self, raw: u32, temperature_unit: TemperatureUnit) -> f64 {
        match self.factor() {
            Some(factor) => raw as f64 * 0.1 * factor * self.firmware_correction(temperature_unit),
            None => raw as f64,
        }
    }
}
