use crate::logic::CycleSummary;
use crate::ui::Theme;
use chrono::Local;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Sparkline, Table, Widget},
};
use std::collections::VecDeque;

pub struct HistoryScreen<'a> {
    pub history: &'a VecDeque<CycleSummary>,
    pub crop_name: &'a str,
    pub yields: &'a [f64],
    pub buffered: usize,
}

impl<'a> HistoryScreen<'a> {
    pub fn new(history: &'a VecDeque<CycleSummary>) -> Self {
        Self {
            history,
            crop_name: "",
            yields: &[],
            buffered: 0,
        }
    }

    /// Yield series for the crop selected on the Crops screen.
    pub fn with_yields(mut self, crop_name: &'a str, yields: &'a [f64]) -> Self {
        self.crop_name = crop_name;
        self.yields = yields;
        self
    }

    pub fn with_buffered(mut self, buffered: usize) -> Self {
        self.buffered = buffered;
        self
    }
}

impl Widget for HistoryScreen<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // Title
                Constraint::Length(7), // Yield sparkline
                Constraint::Min(6),    // Cycle table
                Constraint::Length(1), // Nav
            ])
            .split(area);

        let title = Line::from(vec![
            Span::styled("History", Theme::title()),
            Span::styled(
                format!(
                    " ({} cycles shown, {} in learning buffer)",
                    self.history.len(),
                    self.buffered
                ),
                Theme::dim(),
            ),
        ]);
        Paragraph::new(title).render(chunks[0], buf);

        self.render_yields(chunks[1], buf);
        self.render_cycles(chunks[2], buf);

        let nav = Line::from(vec![
            Span::styled("[↑↓]", Theme::nav_key()),
            Span::styled("Crop ", Theme::nav_label()),
            Span::styled("[u]", Theme::nav_key()),
            Span::styled("Cycle ", Theme::nav_label()),
            Span::styled("[Esc]", Theme::nav_key()),
            Span::styled("Back", Theme::nav_label()),
        ]);
        Paragraph::new(nav).render(chunks[3], buf);
    }
}

impl HistoryScreen<'_> {
    fn render_yields(&self, area: Rect, buf: &mut Buffer) {
        let (lo, hi) = self
            .yields
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), y| {
                (lo.min(*y), hi.max(*y))
            });
        let label = if self.yields.is_empty() {
            format!("{} yield", self.crop_name)
        } else {
            format!("{} yield ({:.0} - {:.0} kg/ha)", self.crop_name, lo, hi)
        };

        let block = Block::default()
            .title(label)
            .borders(Borders::ALL)
            .border_style(Theme::border());

        // Shift to the window minimum so small swings stay visible.
        let data: Vec<u64> = self
            .yields
            .iter()
            .map(|y| ((y - lo) * 10.0).round().max(0.0) as u64 + 1)
            .collect();

        let inner_width = block.inner(area).width as usize;
        let start = data.len().saturating_sub(inner_width);

        Sparkline::default()
            .block(block)
            .data(data[start..].iter().copied())
            .style(Style::default().fg(Theme::YIELD))
            .render(area, buf);
    }

    fn render_cycles(&self, area: Rect, buf: &mut Buffer) {
        let header_cells = ["Cycle", "Time", "Status", "New alerts", "Recovered", "Irrigation"]
            .iter()
            .map(|h| Cell::from(*h).style(Theme::header()));
        let header = Row::new(header_cells).height(1);

        let rows: Vec<Row> = self
            .history
            .iter()
            .rev()
            .map(|summary| {
                Row::new(vec![
                    Cell::from(summary.cycle.to_string()),
                    Cell::from(
                        summary
                            .timestamp
                            .with_timezone(&Local)
                            .format("%H:%M:%S")
                            .to_string(),
                    ),
                    Cell::from(summary.status.as_str())
                        .style(Style::default().fg(summary.status.color())),
                    Cell::from(summary.alerts_raised.len().to_string()),
                    Cell::from(if summary.recovered.is_empty() {
                        "-".to_string()
                    } else {
                        summary.recovered.join(", ")
                    }),
                    Cell::from(if summary.irrigation_active { "on" } else { "off" })
                        .style(Theme::irrigation(summary.irrigation_active)),
                ])
            })
            .collect();

        let widths = [
            Constraint::Length(7),
            Constraint::Length(10),
            Constraint::Length(10),
            Constraint::Length(11),
            Constraint::Length(20),
            Constraint::Min(10),
        ];

        Table::new(rows, widths)
            .header(header)
            .block(
                Block::default()
                    .title("Cycles")
                    .borders(Borders::ALL)
                    .border_style(Theme::border()),
            )
            .render(area, buf);
    }
}
