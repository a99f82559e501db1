use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertType {
    Info,
    Warning,
    Error,
}

impl AlertType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertType::Info => "info",
            AlertType::Warning => "warning",
            AlertType::Error => "error",
        }
    }

    pub fn color(&self) -> ratatui::style::Color {
        use ratatui::style::Color;
        match self {
            AlertType::Info => Color::Blue,
            AlertType::Warning => Color::Yellow,
            AlertType::Error => Color::Red,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            AlertType::Info => "ℹ",
            AlertType::Warning => "⚠",
            AlertType::Error => "!",
        }
    }
}

impl std::fmt::Display for AlertType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which rule produced an alert. Together with the subject this is the
/// deduplication key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertCategory {
    CriticalSensor,
    Predictive,
    Irrigation,
    SensorFault,
}

impl AlertCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertCategory::CriticalSensor => "critical",
            AlertCategory::Predictive => "predictive",
            AlertCategory::Irrigation => "irrigation",
            AlertCategory::SensorFault => "fault",
        }
    }
}

impl std::fmt::Display for AlertCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An alert a rule wants to raise, before it is assigned an id and checked
/// against the open alerts.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertDraft {
    pub alert_type: AlertType,
    pub category: AlertCategory,
    pub subject: String,
    pub message: String,
}

impl AlertDraft {
    pub fn new(
        alert_type: AlertType,
        category: AlertCategory,
        subject: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            alert_type,
            category,
            subject: subject.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub id: String,
    pub alert_type: AlertType,
    pub category: AlertCategory,
    /// Sensor id (or field id for irrigation) the alert is about.
    pub subject: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub resolved: bool,
}

impl Alert {
    pub fn from_draft(id: String, draft: AlertDraft, timestamp: DateTime<Utc>) -> Self {
        Self {
            id,
            alert_type: draft.alert_type,
            category: draft.category,
            subject: draft.subject,
            message: draft.message,
            timestamp,
            resolved: false,
        }
    }

    pub fn is_active(&self) -> bool {
        !self.resolved
    }

    /// True when this alert is still open and covers the same rule and subject.
    pub fn duplicates(&self, draft: &AlertDraft) -> bool {
        self.is_active() && self.category == draft.category && self.subject == draft.subject
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> AlertDraft {
        AlertDraft::new(
            AlertType::Error,
            AlertCategory::CriticalSensor,
            "soil_ph",
            "Soil pH is at critical level: 3.9pH",
        )
    }

    #[test]
    fn open_alert_duplicates_matching_draft() {
        let alert = Alert::from_draft("critical_soil_ph_1".into(), draft(), Utc::now());
        assert!(alert.duplicates(&draft()));
    }

    #[test]
    fn resolved_alert_does_not_duplicate() {
        let mut alert = Alert::from_draft("critical_soil_ph_1".into(), draft(), Utc::now());
        alert.resolved = true;
        assert!(!alert.duplicates(&draft()));
    }

    #[test]
    fn different_subject_or_category_is_not_duplicate() {
        let alert = Alert::from_draft("critical_soil_ph_1".into(), draft(), Utc::now());

        let mut other_subject = draft();
        other_subject.subject = "humidity".into();
        assert!(!alert.duplicates(&other_subject));

        let mut other_category = draft();
        other_category.category = AlertCategory::Predictive;
        assert!(!alert.duplicates(&other_category));
    }

    #[test]
    fn alert_type_display() {
        assert_eq!(AlertType::Info.to_string(), "info");
        assert_eq!(AlertType::Warning.to_string(), "warning");
        assert_eq!(AlertType::Error.to_string(), "error");
    }
}
