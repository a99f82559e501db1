use crate::models::{Sensor, ValueRange};
use crate::ui::Theme;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

/// Boxed reading with a fill bar over the sensor's hard range. The optimal
/// band is drawn in a lighter shade under the bar.
pub struct SensorGauge<'a> {
    title: &'a str,
    value: Option<f64>,
    unit: &'a str,
    range: ValueRange,
    optimal: Option<ValueRange>,
    color: Color,
    precision: usize,
    fault: bool,
}

impl<'a> SensorGauge<'a> {
    pub fn new(title: &'a str, value: Option<f64>, unit: &'a str) -> Self {
        Self {
            title,
            value,
            unit,
            range: ValueRange::new(0.0, 100.0),
            optimal: None,
            color: Theme::FG,
            precision: 1,
            fault: false,
        }
    }

    pub fn range(mut self, range: ValueRange) -> Self {
        self.range = range;
        self
    }

    pub fn optimal(mut self, optimal: ValueRange) -> Self {
        self.optimal = Some(optimal);
        self
    }

    pub fn color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn precision(mut self, precision: usize) -> Self {
        self.precision = precision;
        self
    }

    pub fn fault(mut self, fault: bool) -> Self {
        self.fault = fault;
        self
    }

    fn ratio(&self, value: f64) -> f64 {
        let span = self.range.max - self.range.min;
        if span <= 0.0 {
            return 0.0;
        }
        ((value - self.range.min) / span).clamp(0.0, 1.0)
    }
}

impl Widget for SensorGauge<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height < 3 || area.width < 10 {
            return;
        }

        let block = Block::default()
            .title(self.title)
            .borders(Borders::ALL)
            .border_style(if self.fault {
                Theme::fault()
            } else {
                Theme::border()
            });

        let inner = block.inner(area);
        block.render(area, buf);

        let Some(value) = self.value else {
            Paragraph::new(Line::from(Span::styled("N/A", Theme::dim()))).render(inner, buf);
            return;
        };

        let mut spans = vec![Span::styled(
            format!("{:.prec$}{}", value, self.unit, prec = self.precision),
            Style::default().fg(self.color),
        )];
        if self.fault {
            spans.push(Span::styled(" FAULT", Theme::fault()));
        }
        Paragraph::new(Line::from(spans)).render(inner, buf);

        if inner.height < 2 {
            return;
        }
        let bar = Rect {
            x: inner.x,
            y: inner.y + 1,
            width: inner.width,
            height: 1,
        };
        let width = bar.width as f64;
        let filled = (width * self.ratio(value)) as u16;
        let band = self
            .optimal
            .map(|o| ((width * self.ratio(o.min)) as u16, (width * self.ratio(o.max)) as u16));

        for offset in 0..bar.width {
            let in_band = band.is_some_and(|(lo, hi)| offset >= lo && offset <= hi);
            let (ch, fg) = if offset < filled {
                ('█', self.color)
            } else if in_band {
                ('▒', Theme::DIM)
            } else {
                ('░', Theme::DIM)
            };
            buf[(bar.x + offset, bar.y)].set_char(ch).set_fg(fg);
        }
    }
}

/// Gauge for a live sensor, colored by its status.
pub fn sensor_gauge(sensor: &Sensor, fault: bool) -> SensorGauge<'_> {
    let precision = if sensor.hard_range.max - sensor.hard_range.min <= 10.0 {
        2
    } else {
        1
    };
    SensorGauge::new(&sensor.name, Some(sensor.value), &sensor.unit)
        .range(sensor.hard_range)
        .optimal(sensor.optimal_range)
        .color(sensor.status.color())
        .precision(precision)
        .fault(fault)
}
