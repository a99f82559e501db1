//! The farm control loop.
//!
//! [`AgricultureSystem`] owns the simulator, the yield predictor and an
//! explicit [`FarmState`]. Each call to [`AgricultureSystem::update_cycle`]
//! runs one complete monitoring cycle; nothing happens between calls.

use super::calculations::endpoint_trend;
use super::rules::irrigation::MOISTURE_SENSOR_ID;
use super::rules::{RuleContext, RulesEngine};
use crate::config::{AlertConfig, Config};
use crate::error::{FieldWatchError, Result};
use crate::models::{
    Alert, AlertCategory, AlertDraft, AlertType, Crop, CropProjection, Sensor, SensorSnapshot,
    SystemReport, SystemStatus, Trend,
};
use crate::prediction::{TrainingSummary, YieldPredictor};
use crate::simulation::{Fault, SensorSimulator, SimState};
use chrono::{DateTime, Duration, Local, Timelike, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};

/// One cycle's readings as kept in the learning buffer.
#[derive(Debug, Clone, Serialize)]
pub struct LearningSample {
    pub timestamp: DateTime<Utc>,
    pub readings: Vec<(String, f64)>,
}

impl LearningSample {
    pub fn value(&self, sensor_id: &str) -> Option<f64> {
        self.readings
            .iter()
            .find(|(id, _)| id == sensor_id)
            .map(|(_, v)| *v)
    }
}

/// Everything that changes from cycle to cycle.
#[derive(Debug, Clone, Default)]
pub struct FarmState {
    pub sensors: Vec<Sensor>,
    pub crops: Vec<Crop>,
    pub alerts: Vec<Alert>,
    pub learning_buffer: VecDeque<LearningSample>,
    pub trends: HashMap<String, Trend>,
    pub irrigation_active: bool,
    pub status: SystemStatus,
    pub cycles: u64,
    alert_seq: u64,
}

/// What a single cycle did.
#[derive(Debug, Clone, Serialize)]
pub struct CycleSummary {
    pub cycle: u64,
    pub timestamp: DateTime<Utc>,
    pub status: SystemStatus,
    pub readings: Vec<(String, f64)>,
    pub yields: Vec<(String, f64)>,
    pub alerts_raised: Vec<Alert>,
    /// Sensors whose injected faults expired at the start of this cycle.
    pub recovered: Vec<String>,
    pub irrigation_active: bool,
}

pub struct AgricultureSystem {
    farm_name: String,
    field_id: String,
    alert_config: AlertConfig,
    fault_duration: Duration,
    dataset: Option<PathBuf>,
    simulator: SensorSimulator,
    predictor: YieldPredictor,
    rules: RulesEngine,
    state: FarmState,
    rng: StdRng,
}

impl AgricultureSystem {
    /// Build the system from config, seeded from `simulation.seed` when set.
    pub fn new(config: &Config) -> Result<Self> {
        match config.simulation.seed {
            Some(seed) => Self::with_seed(config, seed),
            None => Self::with_rng(config, StdRng::from_entropy()),
        }
    }

    pub fn with_seed(config: &Config, seed: u64) -> Result<Self> {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: &Config, mut rng: StdRng) -> Result<Self> {
        config.validate()?;
        let now = Utc::now();
        let fault_duration = i64::try_from(config.simulation.fault_duration_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .ok_or_else(|| {
                FieldWatchError::Config(format!(
                    "simulation.fault_duration_secs {} is out of range",
                    config.simulation.fault_duration_secs
                ))
            })?;

        let simulator = SensorSimulator::new(config.sensors.clone(), &mut rng);
        let sensors = config.sensors.iter().map(Sensor::from_config).collect();
        let crops = config
            .crops
            .iter()
            .map(|c| c.to_crop(now))
            .collect::<Result<Vec<_>>>()?;

        let state = FarmState {
            sensors,
            crops,
            learning_buffer: VecDeque::with_capacity(config.alerts.learning_buffer_capacity),
            ..FarmState::default()
        };

        tracing::info!(
            farm = %config.farm.name,
            sensors = state.sensors.len(),
            crops = state.crops.len(),
            "Agriculture system initialized"
        );

        Ok(Self {
            farm_name: config.farm.name.clone(),
            field_id: config.farm.field_id.clone(),
            alert_config: config.alerts.clone(),
            fault_duration,
            dataset: config.predictor.dataset.clone(),
            simulator,
            predictor: YieldPredictor::new(config.predictor.forest.clone()),
            rules: RulesEngine::new(),
            state,
            rng,
        })
    }

    pub fn update_cycle(&mut self) -> CycleSummary {
        self.update_cycle_at(Utc::now())
    }

    /// Run one monitoring cycle as of `now`.
    pub fn update_cycle_at(&mut self, now: DateTime<Utc>) -> CycleSummary {
        // Expired faults
        let recovered: Vec<String> = self
            .simulator
            .clear_expired_faults(now, &mut self.rng)
            .into_iter()
            .map(|f| f.sensor_id)
            .collect();
        for sensor_id in &recovered {
            for alert in self.state.alerts.iter_mut().filter(|a| {
                a.is_active() && a.category == AlertCategory::SensorFault && &a.subject == sensor_id
            }) {
                alert.resolved = true;
            }
        }

        // Sensor readings
        let hour = now.with_timezone(&Local).hour();
        let readings = self.simulator.read_all(hour, now, &mut self.rng);
        for (id, value) in &readings {
            if let Some(sensor) = self.state.sensors.iter_mut().find(|s| &s.id == id) {
                sensor.record(*value, now);
            }
        }

        // Learning buffer and trends
        self.state.learning_buffer.push_back(LearningSample {
            timestamp: now,
            readings: readings.clone(),
        });
        while self.state.learning_buffer.len() > self.alert_config.learning_buffer_capacity {
            self.state.learning_buffer.pop_front();
        }
        self.state.trends = self.compute_trends();

        // Yield predictions
        let mut yields = Vec::with_capacity(self.state.crops.len());
        for crop in self.state.crops.iter_mut() {
            crop.predicted_yield = self
                .predictor
                .predict(crop, &self.state.sensors, &mut self.rng);
            yields.push((crop.crop_type.to_string(), crop.predicted_yield));
        }

        // Predictive, critical and irrigation alerts
        let drafts = self.rules.evaluate(&RuleContext {
            field_id: &self.field_id,
            sensors: &self.state.sensors,
            trends: &self.state.trends,
            irrigation_threshold: self.alert_config.irrigation_threshold,
        });
        let mut alerts_raised = Vec::new();
        for draft in drafts {
            if draft.category == AlertCategory::Irrigation && !self.state.irrigation_active {
                self.state.irrigation_active = true;
                tracing::info!("Irrigation switched on");
            }
            if let Some(alert) = self.raise_alert(draft, now) {
                alerts_raised.push(alert);
            }
        }

        self.state.status = SystemStatus::from_sensors(&self.state.sensors);
        self.state.cycles += 1;

        tracing::debug!(
            cycle = self.state.cycles,
            status = %self.state.status,
            alerts = alerts_raised.len(),
            "Cycle complete"
        );

        CycleSummary {
            cycle: self.state.cycles,
            timestamp: now,
            status: self.state.status,
            readings,
            yields,
            alerts_raised,
            recovered,
            irrigation_active: self.state.irrigation_active,
        }
    }

    /// Endpoint trend per sensor over the most recent window, once the
    /// buffer holds a full window.
    fn compute_trends(&self) -> HashMap<String, Trend> {
        let window = self.alert_config.trend_window;
        let buffer = &self.state.learning_buffer;
        if buffer.len() < window {
            return HashMap::new();
        }

        let recent: Vec<&LearningSample> = buffer.iter().skip(buffer.len() - window).collect();
        self.state
            .sensors
            .iter()
            .map(|sensor| {
                let series: Vec<f64> = recent
                    .iter()
                    .filter_map(|sample| sample.value(&sensor.id))
                    .collect();
                (
                    sensor.id.clone(),
                    endpoint_trend(&series, self.alert_config.trend_change_ratio),
                )
            })
            .collect()
    }

    /// Record an alert unless an open one already covers the same category
    /// and subject.
    fn raise_alert(&mut self, draft: AlertDraft, now: DateTime<Utc>) -> Option<Alert> {
        if self.state.alerts.iter().any(|a| a.duplicates(&draft)) {
            return None;
        }

        self.state.alert_seq += 1;
        let id = format!(
            "{}_{}_{}",
            draft.category.as_str(),
            draft.subject,
            self.state.alert_seq
        );
        let alert = Alert::from_draft(id, draft, now);
        match alert.alert_type {
            AlertType::Error => tracing::warn!(id = %alert.id, "{}", alert.message),
            _ => tracing::info!(id = %alert.id, "{}", alert.message),
        }
        self.state.alerts.push(alert.clone());
        Some(alert)
    }

    /// Take a spot reading of one sensor outside the regular cycle.
    pub fn read_sensor(&mut self, sensor_id: &str) -> Result<f64> {
        self.read_sensor_at(sensor_id, Utc::now())
    }

    pub fn read_sensor_at(&mut self, sensor_id: &str, now: DateTime<Utc>) -> Result<f64> {
        let hour = now.with_timezone(&Local).hour();
        let value = self.simulator.read(sensor_id, hour, now, &mut self.rng)?;
        if let Some(sensor) = self.state.sensors.iter_mut().find(|s| s.id == sensor_id) {
            sensor.record(value, now);
        }
        tracing::debug!(sensor = sensor_id, value, "Spot reading");
        Ok(value)
    }

    /// Force a sensor to an extreme reading for the configured fault duration.
    pub fn inject_fault(&mut self, sensor_id: &str) -> Result<Fault> {
        self.inject_fault_at(sensor_id, Utc::now())
    }

    pub fn inject_fault_at(&mut self, sensor_id: &str, now: DateTime<Utc>) -> Result<Fault> {
        let fault =
            self.simulator
                .simulate_failure(sensor_id, self.fault_duration, now, &mut self.rng)?;
        self.raise_fault_alert(&fault, now);
        Ok(fault)
    }

    /// Hold a sensor at `value` for `duration`, for what-if testing.
    pub fn pin_value(&mut self, sensor_id: &str, value: f64, duration: Duration) -> Result<Fault> {
        self.pin_value_at(sensor_id, value, duration, Utc::now())
    }

    pub fn pin_value_at(
        &mut self,
        sensor_id: &str,
        value: f64,
        duration: Duration,
        now: DateTime<Utc>,
    ) -> Result<Fault> {
        let fault = self.simulator.pin_value(sensor_id, value, duration, now)?;
        self.raise_fault_alert(&fault, now);
        Ok(fault)
    }

    fn raise_fault_alert(&mut self, fault: &Fault, now: DateTime<Utc>) {
        let (name, unit) = self
            .state
            .sensors
            .iter()
            .find(|s| s.id == fault.sensor_id)
            .map(|s| (s.name.clone(), s.unit.clone()))
            .unwrap_or_else(|| (fault.sensor_id.clone(), String::new()));
        let until = fault.expires_at.with_timezone(&Local).format("%H:%M:%S");

        // A fresh fault replaces the previous one for the same sensor.
        for alert in self.state.alerts.iter_mut().filter(|a| {
            a.is_active() && a.category == AlertCategory::SensorFault && a.subject == fault.sensor_id
        }) {
            alert.resolved = true;
        }

        self.raise_alert(
            AlertDraft::new(
                AlertType::Warning,
                AlertCategory::SensorFault,
                fault.sensor_id.clone(),
                format!(
                    "{} {}: holding {}{} until {}",
                    name,
                    fault.kind.as_str(),
                    fault.value,
                    unit,
                    until
                ),
            ),
            now,
        );
    }

    /// Manual irrigation off switch. Also closes the open irrigation alert so
    /// the next activation is reported again.
    pub fn stop_irrigation(&mut self) {
        if !self.state.irrigation_active {
            return;
        }
        self.state.irrigation_active = false;
        for alert in self
            .state
            .alerts
            .iter_mut()
            .filter(|a| a.is_active() && a.category == AlertCategory::Irrigation)
        {
            alert.resolved = true;
        }
        tracing::info!("Irrigation stopped manually");
    }

    /// Train the yield model from `path`, or from the configured dataset.
    /// Failures are logged and leave the current model in place.
    pub fn train_predictor(&mut self, path: Option<&Path>) -> Result<TrainingSummary> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => self.dataset.clone().ok_or_else(|| {
                let err = FieldWatchError::Config("no training dataset configured".into());
                tracing::error!("Model training failed: {}", err);
                err
            })?,
        };
        self.predictor.train_from_path(&path)
    }

    pub fn resolve_alert(&mut self, alert_id: &str) -> bool {
        match self
            .state
            .alerts
            .iter_mut()
            .find(|a| a.id == alert_id && a.is_active())
        {
            Some(alert) => {
                alert.resolved = true;
                tracing::debug!(id = alert_id, "Alert resolved");
                true
            }
            None => false,
        }
    }

    pub fn generate_report(&self) -> SystemReport {
        let now = Utc::now();
        SystemReport {
            timestamp: now,
            farm: self.farm_name.clone(),
            system_status: self.state.status,
            cycles: self.state.cycles,
            sensors: self.state.sensors.len(),
            crops: self.state.crops.len(),
            active_alerts: self.active_alerts().len(),
            irrigation_active: self.state.irrigation_active,
            model_trained: self.predictor.is_trained(),
            sensor_data: self.state.sensors.iter().map(SensorSnapshot::from).collect(),
            crop_predictions: self
                .state
                .crops
                .iter()
                .map(|c| CropProjection::from_crop(c, now))
                .collect(),
        }
    }

    pub fn sensors(&self) -> &[Sensor] {
        &self.state.sensors
    }

    pub fn sensor(&self, sensor_id: &str) -> Option<&Sensor> {
        self.state.sensors.iter().find(|s| s.id == sensor_id)
    }

    pub fn crops(&self) -> &[Crop] {
        &self.state.crops
    }

    pub fn all_alerts(&self) -> &[Alert] {
        &self.state.alerts
    }

    pub fn active_alerts(&self) -> Vec<&Alert> {
        self.state.alerts.iter().filter(|a| a.is_active()).collect()
    }

    pub fn status(&self) -> SystemStatus {
        self.state.status
    }

    pub fn irrigation_active(&self) -> bool {
        self.state.irrigation_active
    }

    pub fn learning_history(&self) -> &VecDeque<LearningSample> {
        &self.state.learning_buffer
    }

    pub fn trend(&self, sensor_id: &str) -> Trend {
        self.state.trends.get(sensor_id).copied().unwrap_or_default()
    }

    pub fn cycles(&self) -> u64 {
        self.state.cycles
    }

    pub fn fault(&self, sensor_id: &str) -> Option<&Fault> {
        self.simulator.fault(sensor_id)
    }

    /// Random-walk state behind a sensor's readings.
    pub fn sim_state(&self, sensor_id: &str) -> Option<&SimState> {
        self.simulator.state(sensor_id)
    }

    pub fn active_faults(&self) -> impl Iterator<Item = &Fault> {
        self.simulator.active_faults()
    }

    /// How long injected faults and operator pins are held.
    pub fn fault_duration(&self) -> Duration {
        self.fault_duration
    }

    pub fn predictor(&self) -> &YieldPredictor {
        &self.predictor
    }

    /// `(id, name)` of every registered alert rule, in evaluation order.
    pub fn rules(&self) -> Vec<(&'static str, &'static str)> {
        self.rules.list_rules()
    }

    pub fn farm_name(&self) -> &str {
        &self.farm_name
    }

    pub fn moisture(&self) -> Option<f64> {
        self.sensor(MOISTURE_SENSOR_ID).map(|s| s.value)
    }

    pub fn weather(&self) -> Option<crate::simulation::Weather> {
        self.simulator.last_environment().map(|e| e.weather)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SensorStatus;
    use std::io::Write;

    fn system() -> AgricultureSystem {
        AgricultureSystem::with_seed(&Config::default(), 42).unwrap()
    }

    fn open_alerts<'a>(
        sys: &'a AgricultureSystem,
        category: AlertCategory,
        subject: &str,
    ) -> Vec<&'a Alert> {
        sys.active_alerts()
            .into_iter()
            .filter(|a| a.category == category && a.subject == subject)
            .collect()
    }

    #[test]
    fn cycle_reads_every_sensor_and_predicts_every_crop() {
        let mut sys = system();
        let summary = sys.update_cycle();

        assert_eq!(summary.cycle, 1);
        assert_eq!(summary.readings.len(), 7);
        assert_eq!(summary.yields.len(), 3);
        assert!(summary.yields.iter().all(|(_, y)| *y >= 0.0));
        for sensor in sys.sensors() {
            assert!(sensor.hard_range.contains(sensor.value));
        }
        assert_eq!(sys.learning_history().len(), 1);
        assert_eq!(sys.status(), SystemStatus::from_sensors(sys.sensors()));
    }

    #[test]
    fn low_moisture_turns_irrigation_on_once() {
        let mut sys = system();
        let now = Utc::now();
        sys.pin_value_at("soil_moisture", 25.0, Duration::minutes(10), now)
            .unwrap();

        sys.update_cycle_at(now);
        sys.update_cycle_at(now + Duration::seconds(5));

        assert!(sys.irrigation_active());
        let irrigation = open_alerts(&sys, AlertCategory::Irrigation, "field-1");
        assert_eq!(irrigation.len(), 1);
        assert_eq!(irrigation[0].alert_type, AlertType::Info);
        assert!(irrigation[0].message.contains("25"));
    }

    #[test]
    fn critical_sensor_alert_is_deduplicated() {
        let mut sys = system();
        let now = Utc::now();
        // 130% of the optimal maximum
        sys.pin_value_at("soil_ph", 7.5 * 1.3, Duration::minutes(10), now)
            .unwrap();

        sys.update_cycle_at(now);
        assert_eq!(
            sys.sensor("soil_ph").map(|s| s.status),
            Some(SensorStatus::Critical)
        );
        sys.update_cycle_at(now + Duration::seconds(5));

        let critical = open_alerts(&sys, AlertCategory::CriticalSensor, "soil_ph");
        assert_eq!(critical.len(), 1);
        assert_eq!(critical[0].alert_type, AlertType::Error);
        assert_eq!(sys.status(), SystemStatus::Critical);
    }

    #[test]
    fn resolved_alert_can_be_raised_again() {
        let mut sys = system();
        let now = Utc::now();
        sys.pin_value_at("soil_ph", 9.75, Duration::minutes(10), now)
            .unwrap();
        let first = sys.update_cycle_at(now);
        let id = first
            .alerts_raised
            .iter()
            .find(|a| a.category == AlertCategory::CriticalSensor && a.subject == "soil_ph")
            .map(|a| a.id.clone())
            .unwrap();

        assert!(sys.resolve_alert(&id));
        assert!(!sys.resolve_alert(&id));
        assert!(!sys.resolve_alert("no_such_alert"));

        sys.update_cycle_at(now + Duration::seconds(5));
        let critical = open_alerts(&sys, AlertCategory::CriticalSensor, "soil_ph");
        assert_eq!(critical.len(), 1);
        assert_ne!(critical[0].id, id);
    }

    #[test]
    fn irrigation_only_stops_manually() {
        let mut sys = system();
        let now = Utc::now();
        sys.pin_value_at("soil_moisture", 25.0, Duration::seconds(10), now)
            .unwrap();
        sys.update_cycle_at(now);
        assert!(sys.irrigation_active());

        // Pin a wet reading: irrigation stays on
        sys.pin_value_at("soil_moisture", 38.0, Duration::minutes(10), now)
            .unwrap();
        sys.update_cycle_at(now + Duration::seconds(5));
        assert!(sys.irrigation_active());

        sys.stop_irrigation();
        assert!(!sys.irrigation_active());
        assert!(open_alerts(&sys, AlertCategory::Irrigation, "field-1").is_empty());
    }

    #[test]
    fn learning_buffer_is_bounded() {
        let mut config = Config::default();
        config.alerts.learning_buffer_capacity = 12;
        let mut sys = AgricultureSystem::with_seed(&config, 7).unwrap();
        let start = Utc::now();
        for i in 0..30 {
            sys.update_cycle_at(start + Duration::seconds(i * 5));
        }
        assert_eq!(sys.learning_history().len(), 12);
        assert_eq!(sys.cycles(), 30);
        // Oldest entries were evicted
        assert_eq!(
            sys.learning_history().front().map(|s| s.timestamp),
            Some(start + Duration::seconds(18 * 5))
        );
    }

    #[test]
    fn trends_appear_after_a_full_window() {
        let mut sys = system();
        let now = Utc::now();
        for i in 0..9 {
            sys.update_cycle_at(now + Duration::seconds(i));
        }
        assert!(sys.state.trends.is_empty());
        sys.update_cycle_at(now + Duration::seconds(9));
        assert_eq!(sys.state.trends.len(), 7);
    }

    #[test]
    fn pinned_rising_series_reports_increasing_trend() {
        let mut sys = system();
        let now = Utc::now();
        for i in 0..10 {
            let t = now + Duration::seconds(i);
            sys.pin_value_at("humidity", 66.0 + i as f64 * 3.0, Duration::minutes(10), t)
                .unwrap();
            sys.update_cycle_at(t);
        }
        assert_eq!(sys.trend("humidity"), Trend::Increasing);
        // 93% humidity is in the warning band, so a predictive alert is open
        assert_eq!(
            sys.sensor("humidity").map(|s| s.status),
            Some(SensorStatus::Warning)
        );
        let predictive = open_alerts(&sys, AlertCategory::Predictive, "humidity");
        assert_eq!(predictive.len(), 1);
        assert!(predictive[0].message.contains("increasing"));
    }

    #[test]
    fn predictive_alert_is_not_repeated_while_trend_persists() {
        let mut sys = system();
        let now = Utc::now();
        // Ten rising readings fill the window, two more stay in the warning band
        let series: Vec<f64> = (0..10)
            .map(|i: i32| 66.0 + f64::from(i) * 3.0)
            .chain([94.0, 95.0])
            .collect();
        let mut raised = 0;
        for (i, value) in series.iter().enumerate() {
            let t = now + Duration::seconds(i as i64);
            sys.pin_value_at("humidity", *value, Duration::minutes(10), t)
                .unwrap();
            let summary = sys.update_cycle_at(t);
            raised += summary
                .alerts_raised
                .iter()
                .filter(|a| a.category == AlertCategory::Predictive && a.subject == "humidity")
                .count();
            if i >= 9 {
                assert_eq!(sys.trend("humidity"), Trend::Increasing);
                assert_eq!(
                    sys.sensor("humidity").map(|s| s.status),
                    Some(SensorStatus::Warning)
                );
            }
        }

        assert_eq!(raised, 1);
        assert_eq!(open_alerts(&sys, AlertCategory::Predictive, "humidity").len(), 1);
    }

    #[test]
    fn pinned_ph_above_band_is_critical() {
        let mut sys = system();
        let now = Utc::now();
        let fault = sys
            .pin_value_at("soil_ph", 9.75, Duration::minutes(1), now)
            .unwrap();
        assert_eq!(fault.value, 9.75);
        sys.update_cycle_at(now);
        assert_eq!(sys.sensor("soil_ph").map(|s| s.value), Some(9.75));
        assert_eq!(
            sys.sensor("soil_ph").map(|s| s.status),
            Some(SensorStatus::Critical)
        );
    }

    #[test]
    fn invalid_pins_raise_no_fault_alert() {
        let mut sys = system();
        let now = Utc::now();
        assert!(sys
            .pin_value_at("soil_moisture", f64::NAN, Duration::minutes(1), now)
            .is_err());
        assert!(sys
            .pin_value_at("soil_moisture", 25.0, Duration::MAX, now)
            .is_err());
        assert!(sys.fault("soil_moisture").is_none());
        assert!(sys.active_alerts().is_empty());

        sys.update_cycle_at(now);
        let sensor = sys.sensor("soil_moisture").unwrap();
        assert!(sensor.value.is_finite());
        assert!(sensor.hard_range.contains(sensor.value));
    }

    #[test]
    fn oversized_fault_duration_is_a_config_error() {
        let mut config = Config::default();
        config.simulation.fault_duration_secs = u64::MAX;
        assert!(matches!(
            AgricultureSystem::with_seed(&config, 1),
            Err(FieldWatchError::Config(_))
        ));

        let mut config = Config::default();
        config.crops[1].days_to_harvest = 1_000_000_000;
        assert!(matches!(
            AgricultureSystem::with_seed(&config, 1),
            Err(FieldWatchError::Config(_))
        ));
    }

    #[test]
    fn spot_reading_updates_one_sensor() {
        let mut sys = system();
        let now = Utc::now();
        let value = sys.read_sensor_at("rainfall", now).unwrap();

        let sensor = sys.sensor("rainfall").unwrap();
        assert_eq!(sensor.value, value);
        assert_eq!(sensor.last_updated, now);
        assert_eq!(sys.cycles(), 0);
        assert!(sys.learning_history().is_empty());
        assert!(matches!(
            sys.read_sensor_at("sonar", now),
            Err(FieldWatchError::UnknownSensor(_))
        ));
    }

    #[test]
    fn rules_are_listed_in_evaluation_order() {
        let ids: Vec<_> = system().rules().into_iter().map(|(id, _)| id).collect();
        assert_eq!(ids, ["predictive_trend", "critical_sensor", "irrigation"]);
    }

    #[test]
    fn injected_fault_expires_and_resolves_its_alert() {
        let mut sys = system();
        let now = Utc::now();
        let fault = sys.inject_fault_at("temperature", now).unwrap();
        assert!(fault.value == -10.0 || fault.value == 50.0);
        assert_eq!(open_alerts(&sys, AlertCategory::SensorFault, "temperature").len(), 1);

        sys.update_cycle_at(now + Duration::seconds(30));
        assert_eq!(sys.sensor("temperature").map(|s| s.value), Some(fault.value));

        // Default fault duration is 60 seconds
        let summary = sys.update_cycle_at(now + Duration::seconds(61));
        assert_eq!(summary.recovered, vec!["temperature".to_string()]);
        assert!(sys.fault("temperature").is_none());
        assert!(open_alerts(&sys, AlertCategory::SensorFault, "temperature").is_empty());
    }

    #[test]
    fn unknown_sensor_is_rejected_without_side_effects() {
        let mut sys = system();
        let err = sys.inject_fault("leaf_wetness").unwrap_err();
        assert!(matches!(err, FieldWatchError::UnknownSensor(_)));
        assert!(sys.all_alerts().is_empty());
        assert!(sys
            .pin_value("leaf_wetness", 1.0, Duration::seconds(5))
            .is_err());
    }

    #[test]
    fn seeded_systems_replay_identically() {
        let now = Utc::now();
        let mut a = system();
        let mut b = system();
        for i in 0..5 {
            let t = now + Duration::seconds(i);
            assert_eq!(a.update_cycle_at(t).readings, b.update_cycle_at(t).readings);
        }
    }

    #[test]
    fn training_without_dataset_fails_cleanly() {
        let mut sys = system();
        assert!(matches!(
            sys.train_predictor(None),
            Err(FieldWatchError::Config(_))
        ));
        assert!(!sys.predictor().is_trained());
        let summary = sys.update_cycle();
        assert!(summary.yields.iter().all(|(_, y)| *y >= 0.0));
    }

    #[test]
    fn bad_dataset_keeps_heuristic_mode() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "soil_moisture_%,soil_pH,crop_type").unwrap();
        writeln!(file, "30,6.5,Wheat").unwrap();

        let mut sys = system();
        assert!(sys.train_predictor(Some(file.path())).is_err());
        assert!(!sys.generate_report().model_trained);
    }

    #[test]
    fn report_reflects_state() {
        let mut sys = system();
        let now = Utc::now();
        sys.pin_value_at("soil_moisture", 25.0, Duration::minutes(10), now)
            .unwrap();
        sys.update_cycle_at(now);

        let report = sys.generate_report();
        assert_eq!(report.farm, "Demo Farm");
        assert_eq!(report.cycles, 1);
        assert_eq!(report.sensors, 7);
        assert_eq!(report.crops, 3);
        assert_eq!(report.active_alerts, sys.active_alerts().len());
        assert!(report.irrigation_active);
        assert_eq!(report.sensor_data.len(), 7);
        assert_eq!(report.crop_predictions[0].crop_type, "Wheat");

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["sensors"], 7);
        assert_eq!(json["irrigation_active"], true);
    }
}
