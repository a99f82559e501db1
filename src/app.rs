use crate::config::Config;
use crate::error::Result;
use crate::logic::{AgricultureSystem, CycleSummary};
use crate::models::Alert;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Cycles kept for the History screen. Independent of the learning buffer.
pub const DISPLAY_HISTORY_LEN: usize = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Dashboard,
    Sensors,
    Crops,
    Alerts,
    History,
}

impl Screen {
    pub fn from_key(c: char) -> Option<Self> {
        match c {
            '1' => Some(Screen::Dashboard),
            '2' => Some(Screen::Sensors),
            '3' => Some(Screen::Crops),
            '4' => Some(Screen::Alerts),
            '5' => Some(Screen::History),
            _ => None,
        }
    }
}

/// Cursor over a list whose length can change between frames.
#[derive(Debug, Default)]
pub struct SelectionState {
    pub selected_index: usize,
}

impl SelectionState {
    pub fn new() -> Self {
        Self { selected_index: 0 }
    }

    pub fn next(&mut self, max: usize) {
        if max > 0 && self.selected_index < max - 1 {
            self.selected_index += 1;
        }
    }

    pub fn prev(&mut self) {
        if self.selected_index > 0 {
            self.selected_index -= 1;
        }
    }

    /// Pull the cursor back inside a list that shrank.
    pub fn clamp(&mut self, len: usize) {
        if len == 0 {
            self.selected_index = 0;
        } else if self.selected_index >= len {
            self.selected_index = len - 1;
        }
    }
}

/// Text entry for pinning the selected sensor to a reading.
#[derive(Debug, Default)]
pub struct PinEntry {
    pub editing: bool,
    pub buffer: String,
}

impl PinEntry {
    pub fn start(&mut self, current_value: f64) {
        self.editing = true;
        self.buffer = format!("{:.2}", current_value);
    }

    pub fn cancel(&mut self) {
        self.editing = false;
        self.buffer.clear();
    }

    pub fn finish(&mut self) -> String {
        self.editing = false;
        std::mem::take(&mut self.buffer)
    }

    /// Only characters that can appear in a decimal reading are kept.
    pub fn push(&mut self, c: char) {
        if c.is_ascii_digit() || c == '.' || c == '-' {
            self.buffer.push(c);
        }
    }

    pub fn pop(&mut self) {
        self.buffer.pop();
    }
}

pub struct App {
    pub screen: Screen,
    pub should_quit: bool,
    pub system: AgricultureSystem,

    /// Most recent cycle last.
    pub history: VecDeque<CycleSummary>,

    // Screen states
    pub sensors_state: SelectionState,
    pub crops_state: SelectionState,
    pub alerts_state: SelectionState,
    pub pin_entry: PinEntry,

    // UI state
    pub status_message: Option<String>,
    cycle_interval: Duration,
    last_cycle: Option<Instant>,
}

impl App {
    pub fn new(config: &Config) -> Result<Self> {
        let system = AgricultureSystem::new(config)?;
        Ok(Self::with_system(config, system))
    }

    pub fn with_system(config: &Config, system: AgricultureSystem) -> Self {
        let cycle_interval = Duration::from_secs(config.simulation.cycle_interval_secs);
        Self {
            screen: Screen::Dashboard,
            should_quit: false,
            system,
            history: VecDeque::with_capacity(DISPLAY_HISTORY_LEN),
            sensors_state: SelectionState::new(),
            crops_state: SelectionState::new(),
            alerts_state: SelectionState::new(),
            pin_entry: PinEntry::default(),
            status_message: None,
            cycle_interval,
            last_cycle: None,
        }
    }

    pub fn switch_screen(&mut self, screen: Screen) {
        self.screen = screen;
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    pub fn set_status(&mut self, message: &str) {
        self.status_message = Some(message.to_string());
    }

    pub fn cycle_due(&self, now: Instant) -> bool {
        match self.last_cycle {
            Some(last) => now.duration_since(last) >= self.cycle_interval,
            None => true,
        }
    }

    pub fn run_cycle(&mut self) {
        let summary = self.system.update_cycle();
        self.last_cycle = Some(Instant::now());

        let mut status = format!(
            "Cycle {}: {}",
            summary.cycle,
            summary.status.as_str()
        );
        if !summary.alerts_raised.is_empty() {
            status.push_str(&format!(", {} new alert(s)", summary.alerts_raised.len()));
        }
        if !summary.recovered.is_empty() {
            status.push_str(&format!(", recovered {}", summary.recovered.join(", ")));
        }
        self.set_status(&status);

        self.history.push_back(summary);
        while self.history.len() > DISPLAY_HISTORY_LEN {
            self.history.pop_front();
        }
        self.alerts_state.clamp(self.system.active_alerts().len());
    }

    pub fn train(&mut self) {
        match self.system.train_predictor(None) {
            Ok(summary) => self.set_status(&format!(
                "Model trained on {} rows (R² {:.3})",
                summary.samples, summary.r2
            )),
            Err(e) => self.set_status(&format!("Training failed: {}", e)),
        }
    }

    pub fn selected_sensor_id(&self) -> Option<String> {
        self.system
            .sensors()
            .get(self.sensors_state.selected_index)
            .map(|s| s.id.clone())
    }

    pub fn inject_fault_on_selected(&mut self) {
        let Some(sensor_id) = self.selected_sensor_id() else {
            return;
        };
        match self.system.inject_fault(&sensor_id) {
            Ok(fault) => self.set_status(&format!(
                "{} fault on {} until {}",
                fault.kind.as_str(),
                sensor_id,
                fault
                    .expires_at
                    .with_timezone(&chrono::Local)
                    .format("%H:%M:%S")
            )),
            Err(e) => self.set_status(&format!("Fault injection failed: {}", e)),
        }
    }

    /// Open the pin prompt prefilled with the selected sensor's reading.
    pub fn start_pin(&mut self) {
        let value = self
            .system
            .sensors()
            .get(self.sensors_state.selected_index)
            .map(|s| s.value);
        if let Some(value) = value {
            self.pin_entry.start(value);
        }
    }

    pub fn confirm_pin(&mut self) {
        let text = self.pin_entry.finish();
        match text.trim().parse::<f64>() {
            Ok(value) => self.pin_selected(value),
            Err(_) => self.set_status(&format!("Invalid reading '{}'", text)),
        }
    }

    /// Hold the selected sensor at `value` for the configured fault duration.
    pub fn pin_selected(&mut self, value: f64) {
        let Some(sensor_id) = self.selected_sensor_id() else {
            return;
        };
        let duration = self.system.fault_duration();
        match self.system.pin_value(&sensor_id, value, duration) {
            Ok(fault) => self.set_status(&format!(
                "Pinned {} at {} until {}",
                sensor_id,
                fault.value,
                fault
                    .expires_at
                    .with_timezone(&chrono::Local)
                    .format("%H:%M:%S")
            )),
            Err(e) => self.set_status(&format!("Pin failed: {}", e)),
        }
    }

    /// Spot reading of the selected sensor without running a cycle.
    pub fn read_selected(&mut self) {
        let Some(sensor_id) = self.selected_sensor_id() else {
            return;
        };
        match self.system.read_sensor(&sensor_id) {
            Ok(value) => self.set_status(&format!("{} read {:.2}", sensor_id, value)),
            Err(e) => self.set_status(&format!("Read failed: {}", e)),
        }
    }

    pub fn stop_irrigation(&mut self) {
        if self.system.irrigation_active() {
            self.system.stop_irrigation();
            self.set_status("Irrigation stopped");
        } else {
            self.set_status("Irrigation is not running");
        }
        self.alerts_state.clamp(self.system.active_alerts().len());
    }

    pub fn active_alerts(&self) -> Vec<&Alert> {
        self.system.active_alerts()
    }

    pub fn resolve_selected_alert(&mut self) {
        let id = self
            .system
            .active_alerts()
            .get(self.alerts_state.selected_index)
            .map(|a| a.id.clone());
        if let Some(id) = id {
            if self.system.resolve_alert(&id) {
                self.set_status(&format!("Resolved {}", id));
            }
        }
        self.alerts_state.clamp(self.system.active_alerts().len());
    }

    /// Predicted yield of one crop across the display history, oldest first.
    pub fn yield_history(&self, crop_index: usize) -> Vec<f64> {
        self.history
            .iter()
            .filter_map(|summary| summary.yields.get(crop_index).map(|(_, y)| *y))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app() -> App {
        let config = Config::default();
        let system = AgricultureSystem::with_seed(&config, 11).unwrap();
        App::with_system(&config, system)
    }

    #[test]
    fn screen_keys() {
        assert_eq!(Screen::from_key('1'), Some(Screen::Dashboard));
        assert_eq!(Screen::from_key('5'), Some(Screen::History));
        assert_eq!(Screen::from_key('6'), None);
        assert_eq!(Screen::from_key('q'), None);
    }

    #[test]
    fn selection_stays_in_bounds() {
        let mut sel = SelectionState::new();
        sel.prev();
        assert_eq!(sel.selected_index, 0);
        sel.next(3);
        sel.next(3);
        sel.next(3);
        assert_eq!(sel.selected_index, 2);
        sel.clamp(1);
        assert_eq!(sel.selected_index, 0);
    }

    #[test]
    fn first_cycle_is_due_immediately() {
        let mut app = app();
        assert!(app.cycle_due(Instant::now()));
        app.run_cycle();
        assert!(!app.cycle_due(Instant::now()));
        assert_eq!(app.history.len(), 1);
        assert!(app.status_message.as_deref().unwrap().starts_with("Cycle 1"));
    }

    #[test]
    fn display_history_is_bounded() {
        let mut app = app();
        for _ in 0..DISPLAY_HISTORY_LEN + 5 {
            app.run_cycle();
        }
        assert_eq!(app.history.len(), DISPLAY_HISTORY_LEN);
        assert_eq!(app.history.front().unwrap().cycle, 6);
        assert_eq!(app.yield_history(0).len(), DISPLAY_HISTORY_LEN);
    }

    #[test]
    fn fault_targets_selected_sensor() {
        let mut app = app();
        app.sensors_state.next(app.system.sensors().len());
        let id = app.selected_sensor_id().unwrap();
        app.inject_fault_on_selected();
        assert!(app.system.fault(&id).is_some());
        assert!(app.status_message.as_deref().unwrap().contains(&id));
    }

    #[test]
    fn resolving_selected_alert() {
        let mut app = app();
        app.sensors_state.selected_index = 0;
        app.inject_fault_on_selected();
        let before = app.active_alerts().len();
        assert!(before >= 1);
        app.resolve_selected_alert();
        assert_eq!(app.active_alerts().len(), before - 1);
    }

    #[test]
    fn training_without_dataset_reports_failure() {
        let mut app = app();
        app.train();
        assert!(app
            .status_message
            .as_deref()
            .unwrap()
            .starts_with("Training failed"));
    }

    #[test]
    fn pin_prompt_pins_selected_sensor() {
        let mut app = app();
        app.sensors_state.selected_index = 0;
        let id = app.selected_sensor_id().unwrap();

        app.start_pin();
        assert!(app.pin_entry.editing);
        app.pin_entry.buffer.clear();
        for c in "2x5".chars() {
            app.pin_entry.push(c);
        }
        assert_eq!(app.pin_entry.buffer, "25");
        app.confirm_pin();

        assert!(!app.pin_entry.editing);
        let fault = app.system.fault(&id).unwrap();
        assert_eq!(fault.kind, crate::simulation::simulator::FaultKind::Pinned);
        assert_eq!(fault.value, 25.0);
        assert!(app.status_message.as_deref().unwrap().starts_with("Pinned"));

        app.run_cycle();
        assert_eq!(app.system.sensor(&id).map(|s| s.value), Some(25.0));
        assert!(app.system.irrigation_active());
    }

    #[test]
    fn unparseable_pin_leaves_sensor_alone() {
        let mut app = app();
        app.start_pin();
        app.pin_entry.buffer = "--".into();
        app.confirm_pin();
        assert!(app.system.fault("soil_moisture").is_none());
        assert!(app
            .status_message
            .as_deref()
            .unwrap()
            .starts_with("Invalid reading"));

        app.start_pin();
        app.pin_entry.cancel();
        assert!(!app.pin_entry.editing);
        assert!(app.pin_entry.buffer.is_empty());
    }

    #[test]
    fn spot_reading_updates_selected_sensor() {
        let mut app = app();
        app.sensors_state.selected_index = 2;
        let id = app.selected_sensor_id().unwrap();
        app.read_selected();

        let sensor = app.system.sensor(&id).unwrap();
        assert!(sensor.hard_range.contains(sensor.value));
        assert!(app.status_message.as_deref().unwrap().starts_with(&id));
        assert_eq!(app.system.cycles(), 0);
    }
}
