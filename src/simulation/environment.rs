use crate::models::SensorKind;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Moisture boost applied to soil-moisture sensors while it rains.
const RAIN_MOISTURE_BOOST: f64 = 1.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weather {
    Sunny,
    Cloudy,
    Rainy,
    Windy,
}

impl Weather {
    pub fn all() -> &'static [Weather] {
        &[
            Weather::Sunny,
            Weather::Cloudy,
            Weather::Rainy,
            Weather::Windy,
        ]
    }

    pub fn random<R: Rng>(rng: &mut R) -> Self {
        let all = Self::all();
        all[rng.gen_range(0..all.len())]
    }

    pub fn factors(&self) -> WeatherFactors {
        match self {
            Weather::Sunny => WeatherFactors::new(1.2, 0.8, 1.3),
            Weather::Cloudy => WeatherFactors::new(0.9, 1.1, 0.6),
            Weather::Rainy => WeatherFactors::new(0.8, 1.4, 0.4),
            Weather::Windy => WeatherFactors::new(0.9, 0.9, 1.0),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Weather::Sunny => "Sunny",
            Weather::Cloudy => "Cloudy",
            Weather::Rainy => "Rainy",
            Weather::Windy => "Windy",
        }
    }
}

impl std::fmt::Display for Weather {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeatherFactors {
    pub temperature: f64,
    pub humidity: f64,
    pub light: f64,
}

impl WeatherFactors {
    const fn new(temperature: f64, humidity: f64, light: f64) -> Self {
        Self {
            temperature,
            humidity,
            light,
        }
    }
}

/// Diurnal multipliers, symmetric around noon.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeFactors {
    pub temperature: f64,
    pub light: f64,
    pub humidity: f64,
}

impl TimeFactors {
    pub fn for_hour(hour: u32) -> Self {
        let distance = (12.0 - f64::from(hour.min(23))).abs() / 12.0;
        Self {
            // Cooler at night
            temperature: 1.0 - 0.3 * distance,
            // Dark at night
            light: (1.0 - distance).max(0.1),
            // More humid at night
            humidity: 1.0 + 0.2 * distance,
        }
    }
}

/// Snapshot of the conditions used for one round of readings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvironmentalFactors {
    pub hour: u32,
    pub time: TimeFactors,
    pub weather: Weather,
}

impl EnvironmentalFactors {
    pub fn new(hour: u32, weather: Weather) -> Self {
        Self {
            hour,
            time: TimeFactors::for_hour(hour),
            weather,
        }
    }

    pub fn sample<R: Rng>(hour: u32, rng: &mut R) -> Self {
        Self::new(hour, Weather::random(rng))
    }

    /// Combined multiplier for a sensor kind under these conditions.
    pub fn multiplier_for(&self, kind: SensorKind) -> f64 {
        let weather = self.weather.factors();
        match kind {
            SensorKind::Temperature => self.time.temperature * weather.temperature,
            SensorKind::Humidity => self.time.humidity * weather.humidity,
            SensorKind::Light => self.time.light * weather.light,
            SensorKind::SoilMoisture if self.weather == Weather::Rainy => RAIN_MOISTURE_BOOST,
            SensorKind::SoilMoisture | SensorKind::Generic => 1.0,
        }
    }
}
