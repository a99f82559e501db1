use super::environment::EnvironmentalFactors;
use crate::error::{FieldWatchError, Result};
use crate::logic::calculations::round2;
use crate::models::SensorConfig;
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use std::collections::HashMap;

/// Probability that a sensor reverses its drift direction after a reading.
const DRIFT_FLIP_PROBABILITY: f64 = 0.1;

/// Random-walk state of one simulated sensor.
#[derive(Debug, Clone, PartialEq)]
pub struct SimState {
    /// Walk position before environmental modifiers.
    pub value: f64,
    /// +1.0 or -1.0
    pub drift_direction: f64,
    /// Fraction of the value used as the noise amplitude.
    pub noise_level: f64,
    pub last_reading: Option<DateTime<Utc>>,
}

impl SimState {
    /// Start somewhere inside the optimal range with a random drift direction.
    pub fn initialize<R: Rng>(config: &SensorConfig, rng: &mut R) -> Self {
        Self {
            value: near_optimal(config, rng),
            drift_direction: if rng.gen_bool(0.5) { 1.0 } else { -1.0 },
            noise_level: rng.gen_range(0.01..=0.05),
            last_reading: None,
        }
    }
}

fn near_optimal<R: Rng>(config: &SensorConfig, rng: &mut R) -> f64 {
    let range = config.optimal_range;
    rng.gen_range(range.min..=range.max)
}

/// Produce one reading for `config`, advancing its random walk.
///
/// The walk takes a bounded drift step and proportional noise and is clamped
/// to the hard range; the environmental multiplier is applied to the reported
/// value only, so diurnal and weather effects do not compound across reads.
pub fn read<R: Rng>(
    config: &SensorConfig,
    state: &mut SimState,
    env: &EnvironmentalFactors,
    rng: &mut R,
    now: DateTime<Utc>,
) -> f64 {
    let rate = config.drift_rate.abs();
    let drift = rng.gen_range(-rate..=rate) * state.drift_direction;
    let walked = state.value + drift;

    let noise_level = state.noise_level.abs();
    let noise = rng.gen_range(-noise_level..=noise_level) * walked;
    state.value = config.hard_range.clamp(walked + noise);

    let modified = state.value * env.multiplier_for(config.kind);
    let reading = config.hard_range.clamp(round2(config.hard_range.clamp(modified)));

    if rng.gen_bool(DRIFT_FLIP_PROBABILITY) {
        state.drift_direction = -state.drift_direction;
    }

    state.last_reading = Some(now);
    reading
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    /// Sensor stuck at one end of its physical range.
    Failure,
    /// Operator-chosen value, used for what-if testing.
    Pinned,
}

impl FaultKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FaultKind::Failure => "Failure",
            FaultKind::Pinned => "Pinned",
        }
    }
}

/// A time-limited override of a sensor's readings.
#[derive(Debug, Clone, PartialEq)]
pub struct Fault {
    pub sensor_id: String,
    pub kind: FaultKind,
    pub value: f64,
    pub started_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Fault {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        (self.expires_at - now).max(Duration::zero())
    }
}

/// Simulates every configured sensor channel.
///
/// Sensor order follows configuration order. Faults replace a sensor's
/// reading until they expire; expiry is checked by the caller once per cycle
/// via [`SensorSimulator::clear_expired_faults`].
#[derive(Debug, Clone)]
pub struct SensorSimulator {
    configs: Vec<SensorConfig>,
    states: HashMap<String, SimState>,
    faults: HashMap<String, Fault>,
    last_environment: Option<EnvironmentalFactors>,
}

impl SensorSimulator {
    pub fn new<R: Rng>(configs: Vec<SensorConfig>, rng: &mut R) -> Self {
        let states = configs
            .iter()
            .map(|c| (c.id.clone(), SimState::initialize(c, rng)))
            .collect();

        Self {
            configs,
            states,
            faults: HashMap::new(),
            last_environment: None,
        }
    }

    pub fn config(&self, sensor_id: &str) -> Result<&SensorConfig> {
        self.configs
            .iter()
            .find(|c| c.id == sensor_id)
            .ok_or_else(|| FieldWatchError::UnknownSensor(sensor_id.to_string()))
    }

    pub fn state(&self, sensor_id: &str) -> Option<&SimState> {
        self.states.get(sensor_id)
    }

    pub fn last_environment(&self) -> Option<&EnvironmentalFactors> {
        self.last_environment.as_ref()
    }

    /// Read a single sensor under freshly sampled conditions.
    pub fn read<R: Rng>(
        &mut self,
        sensor_id: &str,
        hour: u32,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> Result<f64> {
        // Validate before touching any state
        self.config(sensor_id)?;
        let env = EnvironmentalFactors::sample(hour, rng);
        self.last_environment = Some(env);
        self.read_with(sensor_id, &env, now, rng)
    }

    /// Read every sensor under one shared set of conditions.
    pub fn read_all<R: Rng>(
        &mut self,
        hour: u32,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> Vec<(String, f64)> {
        let env = EnvironmentalFactors::sample(hour, rng);
        self.last_environment = Some(env);
        tracing::debug!(weather = %env.weather, hour, "Sampled environment");

        let ids: Vec<String> = self.configs.iter().map(|c| c.id.clone()).collect();
        ids.into_iter()
            .filter_map(|id| {
                let value = self.read_with(&id, &env, now, rng).ok()?;
                Some((id, value))
            })
            .collect()
    }

    fn read_with<R: Rng>(
        &mut self,
        sensor_id: &str,
        env: &EnvironmentalFactors,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> Result<f64> {
        let config = self
            .configs
            .iter()
            .find(|c| c.id == sensor_id)
            .ok_or_else(|| FieldWatchError::UnknownSensor(sensor_id.to_string()))?;
        let state = self
            .states
            .entry(sensor_id.to_string())
            .or_insert_with(|| SimState::initialize(config, rng));

        if let Some(fault) = self.faults.get(sensor_id) {
            if !fault.is_expired(now) {
                state.last_reading = Some(now);
                return Ok(fault.value);
            }
        }

        Ok(read(config, state, env, rng, now))
    }

    /// Force a sensor to one end of its physical range for `duration`.
    pub fn simulate_failure<R: Rng>(
        &mut self,
        sensor_id: &str,
        duration: Duration,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> Result<Fault> {
        let range = self.config(sensor_id)?.hard_range;
        let value = if rng.gen_bool(0.5) { range.min } else { range.max };
        self.insert_fault(sensor_id, FaultKind::Failure, value, duration, now)
    }

    /// Hold a sensor at `value` (clamped to its hard range) for `duration`.
    /// NaN and infinite values are rejected.
    pub fn pin_value(
        &mut self,
        sensor_id: &str,
        value: f64,
        duration: Duration,
        now: DateTime<Utc>,
    ) -> Result<Fault> {
        let range = self.config(sensor_id)?.hard_range;
        if !value.is_finite() {
            return Err(FieldWatchError::InvalidValue {
                sensor: sensor_id.to_string(),
                value,
            });
        }
        let value = range.clamp(value);
        self.insert_fault(sensor_id, FaultKind::Pinned, value, duration, now)
    }

    fn insert_fault(
        &mut self,
        sensor_id: &str,
        kind: FaultKind,
        value: f64,
        duration: Duration,
        now: DateTime<Utc>,
    ) -> Result<Fault> {
        let expires_at = now.checked_add_signed(duration).ok_or_else(|| {
            FieldWatchError::Config(format!(
                "fault duration of {}s is out of range",
                duration.num_seconds()
            ))
        })?;
        let fault = Fault {
            sensor_id: sensor_id.to_string(),
            kind,
            value,
            started_at: now,
            expires_at,
        };
        tracing::info!(
            sensor = sensor_id,
            kind = fault.kind.as_str(),
            value,
            seconds = duration.num_seconds(),
            "Sensor fault injected"
        );
        self.faults.insert(sensor_id.to_string(), fault.clone());
        Ok(fault)
    }

    /// Drop faults whose expiry has passed and restart those sensors inside
    /// their optimal range. Returns the cleared faults.
    pub fn clear_expired_faults<R: Rng>(
        &mut self,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> Vec<Fault> {
        let mut expired: Vec<String> = self
            .faults
            .values()
            .filter(|f| f.is_expired(now))
            .map(|f| f.sensor_id.clone())
            .collect();
        // Stable order keeps seeded runs reproducible
        expired.sort();

        let mut cleared = Vec::with_capacity(expired.len());
        for id in expired {
            let Some(fault) = self.faults.remove(&id) else {
                continue;
            };
            if let (Some(config), Some(state)) = (
                self.configs.iter().find(|c| c.id == id),
                self.states.get_mut(&id),
            ) {
                state.value = near_optimal(config, rng);
            }
            tracing::info!(sensor = %id, "Sensor recovered");
            cleared.push(fault);
        }
        cleared
    }

    pub fn active_faults(&self) -> impl Iterator<Item = &Fault> {
        self.faults.values()
    }

    pub fn fault(&self, sensor_id: &str) -> Option<&Fault> {
        self.faults.get(sensor_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SensorKind, ValueRange};
    use crate::simulation::Weather;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn simulator(seed: u64) -> (SensorSimulator, StdRng) {
        let mut rng = StdRng::seed_from_u64(seed);
        let sim = SensorSimulator::new(SensorConfig::defaults(), &mut rng);
        (sim, rng)
    }

    #[test]
    fn readings_stay_within_hard_range() {
        let (mut sim, mut rng) = simulator(42);
        let now = Utc::now();

        for round in 0..500 {
            let hour = round % 24;
            for (id, value) in sim.read_all(hour, now, &mut rng) {
                let range = sim.config(&id).map(|c| c.hard_range).unwrap();
                assert!(
                    range.contains(value),
                    "{} read {} outside {}",
                    id,
                    value,
                    range
                );
            }
        }
    }

    #[test]
    fn extreme_drift_is_still_clamped() {
        let config = SensorConfig::new(
            "light_intensity",
            "Light Intensity",
            "lux",
            SensorKind::Light,
            ValueRange::new(0.0, 100_000.0),
            ValueRange::new(10_000.0, 50_000.0),
            1_000_000.0,
        );
        let mut rng = StdRng::seed_from_u64(3);
        let mut state = SimState::initialize(&config, &mut rng);
        let env = EnvironmentalFactors::new(12, Weather::Sunny);

        for _ in 0..200 {
            let value = read(&config, &mut state, &env, &mut rng, Utc::now());
            assert!(config.hard_range.contains(value));
        }
    }

    #[test]
    fn readings_are_rounded_to_two_decimals() {
        let (mut sim, mut rng) = simulator(1);
        for (_, value) in sim.read_all(9, Utc::now(), &mut rng) {
            assert!((value * 100.0 - (value * 100.0).round()).abs() < 1e-6);
        }
    }

    #[test]
    fn unknown_sensor_is_rejected_without_mutation() {
        let (mut sim, mut rng) = simulator(5);
        let before = sim.state("soil_moisture").cloned();

        let err = sim.read("sonar", 12, Utc::now(), &mut rng).unwrap_err();
        assert!(matches!(err, FieldWatchError::UnknownSensor(ref id) if id == "sonar"));
        assert_eq!(sim.state("soil_moisture").cloned(), before);
        assert!(sim.last_environment().is_none());
    }

    #[test]
    fn read_updates_state_timestamp() {
        let (mut sim, mut rng) = simulator(11);
        let now = Utc::now();
        let value = sim.read("temperature", 14, now, &mut rng).unwrap();

        let state = sim.state("temperature").unwrap();
        assert!(value.is_finite());
        assert_eq!(state.last_reading, Some(now));
    }

    #[test]
    fn initial_values_start_near_optimal() {
        let (sim, _) = simulator(9);
        for config in &sim.configs {
            let state = sim.state(&config.id).unwrap();
            assert!(config.optimal_range.contains(state.value));
            assert!(state.drift_direction == 1.0 || state.drift_direction == -1.0);
            assert!((0.01..=0.05).contains(&state.noise_level));
        }
    }

    #[test]
    fn failure_forces_extreme_until_expiry() {
        let (mut sim, mut rng) = simulator(21);
        let start = Utc::now();

        let fault = sim
            .simulate_failure("soil_ph", Duration::seconds(30), start, &mut rng)
            .unwrap();
        assert!(fault.value == 0.0 || fault.value == 14.0);

        let during = start + Duration::seconds(10);
        let value = sim.read("soil_ph", 12, during, &mut rng).unwrap();
        assert_eq!(value, fault.value);

        // Not yet expired
        assert!(sim.clear_expired_faults(during, &mut rng).is_empty());

        let after = start + Duration::seconds(31);
        let cleared = sim.clear_expired_faults(after, &mut rng);
        assert_eq!(cleared.len(), 1);
        assert!(sim.fault("soil_ph").is_none());

        let state = sim.state("soil_ph").unwrap();
        assert!(ValueRange::new(5.5, 7.5).contains(state.value));
    }

    #[test]
    fn pinned_value_is_clamped_to_hard_range() {
        let (mut sim, _) = simulator(2);
        let fault = sim
            .pin_value("humidity", 250.0, Duration::seconds(5), Utc::now())
            .unwrap();
        assert_eq!(fault.value, 100.0);
        assert_eq!(fault.kind, FaultKind::Pinned);
    }

    #[test]
    fn non_finite_pin_is_rejected() {
        let (mut sim, mut rng) = simulator(2);
        let now = Utc::now();
        for value in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let err = sim
                .pin_value("soil_moisture", value, Duration::minutes(1), now)
                .unwrap_err();
            assert!(matches!(err, FieldWatchError::InvalidValue { ref sensor, .. } if sensor == "soil_moisture"));
        }
        assert!(sim.fault("soil_moisture").is_none());

        let reading = sim.read("soil_moisture", 12, now, &mut rng).unwrap();
        assert!(reading.is_finite());
        assert!(sim.config("soil_moisture").unwrap().hard_range.contains(reading));
    }

    #[test]
    fn overflowing_fault_duration_is_rejected() {
        let (mut sim, mut rng) = simulator(4);
        let now = Utc::now();
        assert!(matches!(
            sim.simulate_failure("humidity", Duration::MAX, now, &mut rng),
            Err(FieldWatchError::Config(_))
        ));
        assert!(matches!(
            sim.pin_value("humidity", 70.0, Duration::MAX, now),
            Err(FieldWatchError::Config(_))
        ));
        assert!(sim.active_faults().next().is_none());
    }

    #[test]
    fn fault_on_unknown_sensor_fails() {
        let (mut sim, mut rng) = simulator(2);
        assert!(sim
            .simulate_failure("sonar", Duration::seconds(5), Utc::now(), &mut rng)
            .is_err());
        assert!(sim.active_faults().next().is_none());
    }

    #[test]
    fn fault_remaining_never_negative() {
        let now = Utc::now();
        let fault = Fault {
            sensor_id: "x".into(),
            kind: FaultKind::Failure,
            value: 0.0,
            started_at: now,
            expires_at: now + Duration::seconds(3),
        };
        assert_eq!(fault.remaining(now), Duration::seconds(3));
        assert_eq!(fault.remaining(now + Duration::seconds(10)), Duration::zero());
        assert!(fault.is_expired(now + Duration::seconds(3)));
    }
}
