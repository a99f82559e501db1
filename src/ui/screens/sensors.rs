use crate::logic::AgricultureSystem;
use crate::ui::Theme;
use chrono::{Local, Utc};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{
        Block, Borders, Cell, Paragraph, Row, StatefulWidget, Table, TableState, Widget,
    },
};

pub struct SensorsScreen<'a> {
    pub system: &'a AgricultureSystem,
    pub selected_index: usize,
    /// Pin prompt text while the operator is typing a reading.
    pub pin_buffer: Option<&'a str>,
}

impl<'a> SensorsScreen<'a> {
    pub fn new(system: &'a AgricultureSystem) -> Self {
        Self {
            system,
            selected_index: 0,
            pin_buffer: None,
        }
    }

    pub fn with_selection(mut self, index: usize) -> Self {
        self.selected_index = index;
        self
    }

    pub fn editing_pin(mut self, editing: bool, buffer: &'a str) -> Self {
        self.pin_buffer = editing.then_some(buffer);
        self
    }
}

impl Widget for SensorsScreen<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // Title
                Constraint::Min(8),    // Table
                Constraint::Length(5), // Selected sensor
                Constraint::Length(1), // Nav
            ])
            .split(area);

        let faults = self.system.active_faults().count();
        let title = Line::from(vec![
            Span::styled("Sensors", Theme::title()),
            Span::styled(
                format!(" ({} channels, {} faulted)", self.system.sensors().len(), faults),
                Theme::dim(),
            ),
        ]);
        Paragraph::new(title).render(chunks[0], buf);

        self.render_table(chunks[1], buf);
        self.render_selected(chunks[2], buf);

        let nav = if self.pin_buffer.is_some() {
            Line::from(vec![
                Span::styled("[Enter]", Theme::nav_key()),
                Span::styled("Pin ", Theme::nav_label()),
                Span::styled("[Esc]", Theme::nav_key()),
                Span::styled("Cancel", Theme::nav_label()),
            ])
        } else {
            Line::from(vec![
                Span::styled("[↑↓]", Theme::nav_key()),
                Span::styled("Select ", Theme::nav_label()),
                Span::styled("[f]", Theme::nav_key()),
                Span::styled("Inject fault ", Theme::nav_label()),
                Span::styled("[p]", Theme::nav_key()),
                Span::styled("Pin value ", Theme::nav_label()),
                Span::styled("[r]", Theme::nav_key()),
                Span::styled("Read now ", Theme::nav_label()),
                Span::styled("[u]", Theme::nav_key()),
                Span::styled("Cycle ", Theme::nav_label()),
                Span::styled("[Esc]", Theme::nav_key()),
                Span::styled("Back", Theme::nav_label()),
            ])
        };
        Paragraph::new(nav).render(chunks[3], buf);
    }
}

impl SensorsScreen<'_> {
    fn render_table(&self, area: Rect, buf: &mut Buffer) {
        let header_cells = ["Sensor", "Value", "Status", "Trend", "Optimal", "Range", "Fault"]
            .iter()
            .map(|h| Cell::from(*h).style(Theme::header()));
        let header = Row::new(header_cells).height(1);

        let rows: Vec<Row> = self
            .system
            .sensors()
            .iter()
            .enumerate()
            .map(|(i, sensor)| {
                let style = if i == self.selected_index {
                    Theme::selected()
                } else {
                    Theme::normal()
                };
                let trend = self.system.trend(&sensor.id);
                let fault = self
                    .system
                    .fault(&sensor.id)
                    .map(|f| f.kind.as_str())
                    .unwrap_or("-");

                Row::new(vec![
                    Cell::from(sensor.name.as_str()),
                    Cell::from(format!("{:.2} {}", sensor.value, sensor.unit)),
                    Cell::from(format!("{} {}", sensor.status.symbol(), sensor.status))
                        .style(Style::default().fg(sensor.status.color())),
                    Cell::from(format!("{} {}", trend.arrow(), trend)),
                    Cell::from(sensor.optimal_range.to_string()),
                    Cell::from(sensor.hard_range.to_string()).style(Theme::dim()),
                    Cell::from(fault).style(if fault == "-" {
                        Theme::dim()
                    } else {
                        Theme::fault()
                    }),
                ])
                .style(style)
            })
            .collect();

        let widths = [
            Constraint::Length(16),
            Constraint::Length(14),
            Constraint::Length(12),
            Constraint::Length(14),
            Constraint::Length(12),
            Constraint::Length(10),
            Constraint::Min(8),
        ];

        let table = Table::new(rows, widths)
            .header(header)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Theme::border()),
            )
            .row_highlight_style(Theme::selected());

        let mut state = TableState::default();
        state.select(Some(self.selected_index));
        StatefulWidget::render(table, area, buf, &mut state);
    }

    fn render_selected(&self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .title("Selected")
            .borders(Borders::ALL)
            .border_style(Theme::border());
        let inner = block.inner(area);
        block.render(area, buf);

        let Some(sensor) = self.system.sensors().get(self.selected_index) else {
            return;
        };

        let updated = sensor
            .last_updated
            .with_timezone(&Local)
            .format("%H:%M:%S")
            .to_string();
        let mut lines = vec![Line::from(vec![
            Span::styled(format!("{} ", sensor.name), Theme::highlight()),
            Span::styled(format!("({}, {}) ", sensor.id, sensor.kind.as_str()), Theme::dim()),
            Span::styled("updated ", Theme::dim()),
            Span::styled(updated, Theme::normal()),
        ])];

        if let Some(walk) = self.system.sim_state(&sensor.id) {
            let last = walk
                .last_reading
                .map(|t| t.with_timezone(&Local).format("%H:%M:%S").to_string())
                .unwrap_or_else(|| "-".to_string());
            lines.push(Line::from(Span::styled(
                format!(
                    "Walk {:.2} drifting {}, noise {:.1}%, last read {}",
                    walk.value,
                    if walk.drift_direction > 0.0 { "up" } else { "down" },
                    walk.noise_level * 100.0,
                    last
                ),
                Theme::dim(),
            )));
        }

        if let Some(buffer) = self.pin_buffer {
            lines.push(Line::from(vec![
                Span::styled("Pin at: ", Theme::dim()),
                Span::styled(format!("{}_", buffer), Theme::highlight()),
                Span::styled(format!(" {} (hard range {})", sensor.unit, sensor.hard_range), Theme::dim()),
            ]));
        } else if let Some(fault) = self.system.fault(&sensor.id) {
            lines.push(Line::from(vec![Span::styled(
                format!(
                    "{} since {}, holding {:.2}{} for {}s",
                    fault.kind.as_str(),
                    fault.started_at.with_timezone(&Local).format("%H:%M:%S"),
                    fault.value,
                    sensor.unit,
                    fault.remaining(Utc::now()).num_seconds()
                ),
                Theme::fault(),
            )]));
        }

        Paragraph::new(lines).render(inner, buf);
    }
}
