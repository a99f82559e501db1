use crate::logic::AgricultureSystem;
use crate::prediction::FeatureChannel;
use crate::ui::Theme;
use chrono::Utc;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{
        Block, Borders, Cell, Paragraph, Row, StatefulWidget, Table, TableState, Widget, Wrap,
    },
};

/// Feature importances shown when the model is trained.
const TOP_IMPORTANCES: usize = 8;

pub struct CropsScreen<'a> {
    pub system: &'a AgricultureSystem,
    pub selected_index: usize,
}

impl<'a> CropsScreen<'a> {
    pub fn new(system: &'a AgricultureSystem) -> Self {
        Self {
            system,
            selected_index: 0,
        }
    }

    pub fn with_selection(mut self, index: usize) -> Self {
        self.selected_index = index;
        self
    }
}

impl Widget for CropsScreen<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // Title
                Constraint::Min(6),    // Crops table
                Constraint::Length(12), // Model panel
                Constraint::Length(1), // Nav
            ])
            .split(area);

        let title = Line::from(vec![
            Span::styled("Crops", Theme::title()),
            Span::styled(
                format!(" ({} planted)", self.system.crops().len()),
                Theme::dim(),
            ),
        ]);
        Paragraph::new(title).render(chunks[0], buf);

        self.render_table(chunks[1], buf);
        self.render_model(chunks[2], buf);

        let nav = Line::from(vec![
            Span::styled("[↑↓]", Theme::nav_key()),
            Span::styled("Select ", Theme::nav_label()),
            Span::styled("[t]", Theme::nav_key()),
            Span::styled("Train model ", Theme::nav_label()),
            Span::styled("[Esc]", Theme::nav_key()),
            Span::styled("Back", Theme::nav_label()),
        ]);
        Paragraph::new(nav).render(chunks[3], buf);
    }
}

impl CropsScreen<'_> {
    fn render_table(&self, area: Rect, buf: &mut Buffer) {
        let now = Utc::now();
        let header_cells = ["Crop", "Stage", "Health", "Disease", "Harvest in", "Yield kg/ha"]
            .iter()
            .map(|h| Cell::from(*h).style(Theme::header()));
        let header = Row::new(header_cells).height(1);

        let rows: Vec<Row> = self
            .system
            .crops()
            .iter()
            .map(|crop| {
                let health_style = if crop.health_score >= 80.0 {
                    Theme::success()
                } else if crop.health_score >= 60.0 {
                    Theme::warning()
                } else {
                    Theme::error()
                };
                Row::new(vec![
                    Cell::from(crop.crop_type.as_str().to_string()),
                    Cell::from(crop.growth_stage.as_str()),
                    Cell::from(format!("{:.0}", crop.health_score)).style(health_style),
                    Cell::from(crop.disease_status.as_str()),
                    Cell::from(format!("{} days", crop.days_to_harvest(now))),
                    Cell::from(format!("{:.1}", crop.predicted_yield))
                        .style(Style::default().fg(Theme::YIELD)),
                ])
            })
            .collect();

        let widths = [
            Constraint::Length(12),
            Constraint::Length(14),
            Constraint::Length(8),
            Constraint::Length(10),
            Constraint::Length(12),
            Constraint::Min(12),
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

    fn render_model(&self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .title("Yield Model")
            .borders(Borders::ALL)
            .border_style(Theme::border());
        let inner = block.inner(area);
        block.render(area, buf);

        let predictor = self.system.predictor();
        let mut lines = Vec::new();

        match predictor.summary() {
            Some(summary) => {
                lines.push(Line::from(vec![
                    Span::styled("Random forest ", Theme::highlight()),
                    Span::styled(
                        format!(
                            "trained {} on {} rows ({} dropped), R² {:.3}",
                            summary.trained_at.format("%Y-%m-%d %H:%M"),
                            summary.samples,
                            summary.dropped_rows,
                            summary.r2
                        ),
                        Theme::dim(),
                    ),
                ]));
                lines.push(Line::from(Span::styled(
                    format!(
                        "  {} trees, {} nodes; crops: {}",
                        summary.trees,
                        summary.nodes,
                        summary.crop_types.join(", ")
                    ),
                    Theme::dim(),
                )));
                let mut ranked = summary.feature_importances.clone();
                ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
                for (name, importance) in ranked.into_iter().take(TOP_IMPORTANCES) {
                    lines.push(weight_line(&name, importance));
                }
            }
            None => {
                lines.push(Line::from(vec![
                    Span::styled("Heuristic ", Theme::highlight()),
                    Span::styled("(press t to train from the configured dataset)", Theme::dim()),
                ]));
                for channel in FeatureChannel::all() {
                    lines.push(weight_line(channel.sensor_id(), predictor.weight(*channel)));
                }
            }
        }

        Paragraph::new(lines)
            .wrap(Wrap { trim: true })
            .render(inner, buf);
    }
}

fn weight_line(name: &str, weight: f64) -> Line<'static> {
    let bar = "■".repeat((weight * 40.0).round() as usize);
    Line::from(vec![
        Span::styled(format!("  {:<24}", name), Theme::normal()),
        Span::styled(format!("{:>6.3} ", weight), Theme::dim()),
        Span::styled(bar, Style::default().fg(Theme::ACCENT)),
    ])
}
