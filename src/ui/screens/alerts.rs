use crate::models::Alert;
use crate::ui::Theme;
use chrono::Local;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph, Widget, Wrap},
};

pub struct AlertsScreen<'a> {
    pub active: &'a [&'a Alert],
    pub total: usize,
    pub selected_index: usize,
    /// `(id, name)` of the rules evaluated each cycle.
    pub rules: &'a [(&'static str, &'static str)],
}

impl<'a> AlertsScreen<'a> {
    pub fn new(active: &'a [&'a Alert]) -> Self {
        Self {
            active,
            total: active.len(),
            selected_index: 0,
            rules: &[],
        }
    }

    /// Number of alerts ever raised, resolved ones included.
    pub fn with_total(mut self, total: usize) -> Self {
        self.total = total;
        self
    }

    pub fn with_selection(mut self, index: usize) -> Self {
        self.selected_index = index;
        self
    }

    pub fn with_rules(mut self, rules: &'a [(&'static str, &'static str)]) -> Self {
        self.rules = rules;
        self
    }
}

impl Widget for AlertsScreen<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // Title
                Constraint::Min(10),   // Content
                Constraint::Length(3), // Rules
                Constraint::Length(1), // Nav
            ])
            .split(area);

        let title = Line::from(vec![
            Span::styled("Alerts", Theme::title()),
            Span::styled(
                format!(
                    " ({} active, {} resolved)",
                    self.active.len(),
                    self.total.saturating_sub(self.active.len())
                ),
                Theme::dim(),
            ),
        ]);
        Paragraph::new(title).render(chunks[0], buf);

        let content = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
            .split(chunks[1]);

        self.render_list(content[0], buf);
        self.render_details(content[1], buf);
        self.render_rules(chunks[2], buf);

        let nav = Line::from(vec![
            Span::styled("[↑↓]", Theme::nav_key()),
            Span::styled("Navigate ", Theme::nav_label()),
            Span::styled("[Enter]", Theme::nav_key()),
            Span::styled("Resolve ", Theme::nav_label()),
            Span::styled("[x]", Theme::nav_key()),
            Span::styled("Stop irrigation ", Theme::nav_label()),
            Span::styled("[Esc]", Theme::nav_key()),
            Span::styled("Back", Theme::nav_label()),
        ]);
        Paragraph::new(nav).render(chunks[3], buf);
    }
}

impl AlertsScreen<'_> {
    fn render_rules(&self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .title("Rules")
            .borders(Borders::ALL)
            .border_style(Theme::border());

        let mut spans = Vec::new();
        for (i, (id, name)) in self.rules.iter().enumerate() {
            if i > 0 {
                spans.push(Span::styled("  ", Theme::dim()));
            }
            spans.push(Span::styled(format!("{}. ", i + 1), Theme::dim()));
            spans.push(Span::styled(*name, Theme::normal()));
            spans.push(Span::styled(format!(" ({})", id), Theme::dim()));
        }

        Paragraph::new(Line::from(spans)).block(block).render(area, buf);
    }

    fn render_list(&self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .title("Active")
            .borders(Borders::ALL)
            .border_style(Theme::border());

        let inner = block.inner(area);
        block.render(area, buf);

        if self.active.is_empty() {
            Paragraph::new(Span::styled("No active alerts", Theme::dim())).render(inner, buf);
            return;
        }

        let items: Vec<ListItem> = self
            .active
            .iter()
            .enumerate()
            .map(|(i, alert)| {
                let style = if i == self.selected_index {
                    Theme::selected()
                } else {
                    Style::default()
                };
                let type_style = Style::default().fg(alert.alert_type.color());

                let line = Line::from(vec![
                    Span::styled(format!("{} ", alert.alert_type.symbol()), type_style),
                    Span::styled(format!("{:<11}", alert.category.as_str()), type_style),
                    Span::styled(alert.subject.as_str(), Theme::normal()),
                ]);

                ListItem::new(line).style(style)
            })
            .collect();

        List::new(items).render(inner, buf);
    }

    fn render_details(&self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .title("Details")
            .borders(Borders::ALL)
            .border_style(Theme::border());

        let inner = block.inner(area);
        block.render(area, buf);

        let Some(alert) = self.active.get(self.selected_index) else {
            Paragraph::new(Span::styled("Select an alert to view details", Theme::dim()))
                .render(inner, buf);
            return;
        };

        let type_style = Style::default().fg(alert.alert_type.color());
        let lines = vec![
            Line::from(vec![Span::styled(alert.id.as_str(), Theme::header())]),
            Line::from(vec![]),
            Line::from(vec![
                Span::styled("Type: ", Theme::dim()),
                Span::styled(alert.alert_type.as_str(), type_style),
                Span::styled("  Category: ", Theme::dim()),
                Span::styled(alert.category.as_str(), type_style),
            ]),
            Line::from(vec![
                Span::styled("Subject: ", Theme::dim()),
                Span::styled(alert.subject.as_str(), Theme::highlight()),
            ]),
            Line::from(vec![
                Span::styled("Raised: ", Theme::dim()),
                Span::styled(
                    alert
                        .timestamp
                        .with_timezone(&Local)
                        .format("%Y-%m-%d %H:%M:%S")
                        .to_string(),
                    Theme::normal(),
                ),
            ]),
            Line::from(vec![]),
            Line::from(vec![Span::styled(alert.message.as_str(), Theme::normal())]),
        ];

        Paragraph::new(lines)
            .wrap(Wrap { trim: true })
            .render(inner, buf);
    }
}
