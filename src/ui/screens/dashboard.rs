use crate::logic::AgricultureSystem;
use crate::ui::components::sensor_gauge;
use crate::ui::Theme;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph, Widget},
};

pub struct DashboardScreen<'a> {
    pub system: &'a AgricultureSystem,
    pub status_message: Option<&'a str>,
}

impl<'a> DashboardScreen<'a> {
    pub fn new(system: &'a AgricultureSystem) -> Self {
        Self {
            system,
            status_message: None,
        }
    }

    pub fn with_status(mut self, status: Option<&'a str>) -> Self {
        self.status_message = status;
        self
    }
}

impl Widget for DashboardScreen<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Header
                Constraint::Length(4), // Gauges, first row
                Constraint::Length(4), // Gauges, second row
                Constraint::Min(6),    // Crops and alerts
                Constraint::Length(1), // Irrigation
                Constraint::Length(1), // Status message
                Constraint::Length(1), // Nav bar
            ])
            .split(area);

        self.render_header(chunks[0], buf);
        self.render_gauges(chunks[1], chunks[2], buf);

        let middle = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
            .split(chunks[3]);
        self.render_crops(middle[0], buf);
        self.render_alerts(middle[1], buf);

        self.render_irrigation(chunks[4], buf);
        if let Some(msg) = self.status_message {
            Paragraph::new(Span::styled(msg, Theme::message(msg))).render(chunks[5], buf);
        }
        nav_bar().render(chunks[6], buf);
    }
}

impl DashboardScreen<'_> {
    fn render_header(&self, area: Rect, buf: &mut Buffer) {
        let status = self.system.status();
        let title = Line::from(vec![
            Span::styled(format!("FieldWatch - {}", self.system.farm_name()), Theme::title()),
            Span::raw("  "),
            Span::styled(status.as_str(), Style::default().fg(status.color())),
        ]);

        let block = Block::default()
            .title(title)
            .borders(Borders::BOTTOM)
            .border_style(Theme::border());

        let weather = self
            .system
            .weather()
            .map(|w| w.as_str())
            .unwrap_or("-");
        let model = if self.system.predictor().is_trained() {
            "trained"
        } else {
            "heuristic"
        };
        let info = Line::from(vec![
            Span::styled("Cycles: ", Theme::dim()),
            Span::styled(self.system.cycles().to_string(), Theme::normal()),
            Span::styled("  Weather: ", Theme::dim()),
            Span::styled(weather, Theme::normal()),
            Span::styled("  Model: ", Theme::dim()),
            Span::styled(model, Theme::normal()),
        ]);
        Paragraph::new(info).block(block).render(area, buf);
    }

    fn render_gauges(&self, top: Rect, bottom: Rect, buf: &mut Buffer) {
        let sensors = self.system.sensors();
        let per_row = sensors.len().div_ceil(2).max(1);

        for (row_area, chunk) in [top, bottom].into_iter().zip(sensors.chunks(per_row)) {
            let cells = Layout::default()
                .direction(Direction::Horizontal)
                .constraints(vec![Constraint::Ratio(1, per_row as u32); per_row])
                .split(row_area);
            for (sensor, cell) in chunk.iter().zip(cells.iter()) {
                let faulted = self.system.fault(&sensor.id).is_some();
                sensor_gauge(sensor, faulted).render(*cell, buf);
            }
        }
    }

    fn render_crops(&self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .title(Span::styled("Predicted Yields", Theme::header()))
            .borders(Borders::ALL)
            .border_style(Theme::border());

        let inner = block.inner(area);
        block.render(area, buf);

        let items: Vec<ListItem> = self
            .system
            .crops()
            .iter()
            .map(|crop| {
                ListItem::new(Line::from(vec![
                    Span::styled(format!("{:<10}", crop.crop_type.as_str()), Theme::normal()),
                    Span::styled(
                        format!("{:>9.1} kg/ha", crop.predicted_yield),
                        Style::default().fg(Theme::YIELD),
                    ),
                    Span::styled(format!("  {}", crop.growth_stage), Theme::dim()),
                ]))
            })
            .collect();

        List::new(items).render(inner, buf);
    }

    fn render_alerts(&self, area: Rect, buf: &mut Buffer) {
        let active = self.system.active_alerts();
        let block = Block::default()
            .title(Span::styled(
                format!("Active Alerts ({})", active.len()),
                Theme::header(),
            ))
            .borders(Borders::ALL)
            .border_style(Theme::border());

        let inner = block.inner(area);
        block.render(area, buf);

        if active.is_empty() {
            Paragraph::new(Span::styled("No active alerts", Theme::dim())).render(inner, buf);
            return;
        }

        // Newest first
        let items: Vec<ListItem> = active
            .iter()
            .rev()
            .take(inner.height as usize)
            .map(|alert| {
                let style = Style::default().fg(alert.alert_type.color());
                ListItem::new(Line::from(vec![
                    Span::styled(format!("{} ", alert.alert_type.symbol()), style),
                    Span::styled(&alert.message, style),
                ]))
            })
            .collect();

        List::new(items).render(inner, buf);
    }

    fn render_irrigation(&self, area: Rect, buf: &mut Buffer) {
        let active = self.system.irrigation_active();
        let moisture = self
            .system
            .moisture()
            .map(|m| format!("{:.1}%", m))
            .unwrap_or_else(|| "N/A".to_string());
        let line = Line::from(vec![
            Span::styled("Irrigation: ", Theme::dim()),
            Span::styled(if active { "ON" } else { "off" }, Theme::irrigation(active)),
            Span::styled("  Soil moisture: ", Theme::dim()),
            Span::styled(moisture, Theme::normal()),
        ]);
        Paragraph::new(line).render(area, buf);
    }
}

/// Key legend shared by every screen.
pub fn nav_bar() -> Paragraph<'static> {
    Paragraph::new(Line::from(vec![
        Span::styled("[1]", Theme::nav_key()),
        Span::styled("Dashboard ", Theme::nav_label()),
        Span::styled("[2]", Theme::nav_key()),
        Span::styled("Sensors ", Theme::nav_label()),
        Span::styled("[3]", Theme::nav_key()),
        Span::styled("Crops ", Theme::nav_label()),
        Span::styled("[4]", Theme::nav_key()),
        Span::styled("Alerts ", Theme::nav_label()),
        Span::styled("[5]", Theme::nav_key()),
        Span::styled("History ", Theme::nav_label()),
        Span::styled("[u]", Theme::nav_key()),
        Span::styled("Cycle ", Theme::nav_label()),
        Span::styled("[t]", Theme::nav_key()),
        Span::styled("Train ", Theme::nav_label()),
        Span::styled("[x]", Theme::nav_key()),
        Span::styled("Stop irrigation ", Theme::nav_label()),
        Span::styled("[q]", Theme::nav_key()),
        Span::styled("Quit", Theme::nav_label()),
    ]))
}
