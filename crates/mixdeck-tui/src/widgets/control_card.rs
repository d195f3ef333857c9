//! Control card — one control rendered as slider, toggle, or selector.
//!
//! Pure rendering of a [`ControlView`]; the card holds no state of its own.

use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Gauge, Paragraph, Widget};

use mixdeck_core::{Control, ControlView, SliderView, WidgetView};

use crate::theme;

/// Height of a card including borders.
pub const CARD_HEIGHT: u16 = 7;

/// A single control card.
pub struct ControlCard<'a> {
    control: &'a Control,
    selected: bool,
}

impl<'a> ControlCard<'a> {
    pub fn new(control: &'a Control) -> Self {
        Self {
            control,
            selected: false,
        }
    }

    pub fn selected(mut self, selected: bool) -> Self {
        self.selected = selected;
        self
    }
}

impl Widget for ControlCard<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let view = ControlView::of(self.control);
        let muted = view.is_muted();

        let (glyph, accent) = theme::icon(self.control.icon);
        let name_style = if muted {
            theme::muted_name()
        } else {
            theme::title_style()
        };
        let border_style = match (muted, self.selected) {
            (true, _) => theme::border_muted(),
            (false, true) => theme::border_focused(),
            (false, false) => theme::border_default(),
        };

        let block = Block::default()
            .title(Line::from(vec![
                Span::raw(" "),
                Span::styled(glyph, Style::default().fg(accent)),
                Span::raw(" "),
                Span::styled(self.control.name.as_str(), name_style),
                Span::raw(" "),
            ]))
            .borders(Borders::ALL)
            .border_type(if self.selected {
                BorderType::Thick
            } else {
                BorderType::Rounded
            })
            .border_style(border_style);

        let inner = block.inner(area);
        block.render(area, buf);

        let [body, mute_row] =
            Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).areas(inner);

        match &view.widget {
            WidgetView::Slider(slider) => render_slider(slider, muted, body, buf),
            WidgetView::Toggle { on } => render_toggle(*on, body, buf),
            WidgetView::Selector {
                options,
                selected,
                value,
            } => render_selector(options, *selected, value, body, buf),
        }

        // Switches have no mute control at all.
        if let Some(is_muted) = view.mute {
            let line = if is_muted {
                Line::from(vec![
                    Span::styled(" m ", theme::key_hint_key()),
                    Span::styled(
                        "Muted",
                        Style::default()
                            .fg(theme::ERROR_RED)
                            .add_modifier(Modifier::BOLD),
                    ),
                ])
            } else {
                Line::from(vec![
                    Span::styled(" m ", theme::key_hint_key()),
                    Span::styled("Mute", theme::key_hint()),
                ])
            };
            Paragraph::new(line).render(mute_row, buf);
        }
    }
}

fn render_slider(slider: &SliderView, muted: bool, area: Rect, buf: &mut Buffer) {
    let [gauge_row, detail_row] =
        Layout::vertical([Constraint::Length(1), Constraint::Length(1)]).areas(area);
    let [gauge_row] = Layout::horizontal([Constraint::Min(1)])
        .horizontal_margin(1)
        .areas(gauge_row);

    Gauge::default()
        .gauge_style(theme::level_fill(muted))
        .percent(slider.fill())
        .label(format!("{:.0}%", slider.percent()))
        .render(gauge_row, buf);

    let detail = Line::from(vec![
        Span::styled(format!(" {}", slider.value), theme::body()),
        Span::styled(
            format!("  range {}–{}", slider.min, slider.max),
            theme::key_hint(),
        ),
    ]);
    Paragraph::new(detail).render(detail_row, buf);
}

fn render_toggle(on: bool, area: Rect, buf: &mut Buffer) {
    let line = if on {
        Line::from(vec![
            Span::styled(" ● ", Style::default().fg(theme::SUCCESS_GREEN)),
            Span::styled(
                "ON",
                Style::default()
                    .fg(theme::SUCCESS_GREEN)
                    .add_modifier(Modifier::BOLD),
            ),
        ])
    } else {
        Line::from(vec![
            Span::styled(" ○ ", theme::key_hint()),
            Span::styled("OFF", theme::body()),
        ])
    };
    Paragraph::new(line).render(area, buf);
}

fn render_selector(
    options: &[String],
    selected: Option<usize>,
    value: &str,
    area: Rect,
    buf: &mut Buffer,
) {
    let mut lines: Vec<Line> = options
        .iter()
        .enumerate()
        .map(|(i, option)| {
            if Some(i) == selected {
                Line::from(Span::styled(format!(" ▸ {option}"), theme::option_selected()))
            } else {
                Line::from(Span::styled(format!("   {option}"), theme::body()))
            }
        })
        .collect();

    // A value the backend reports but does not list is still shown.
    if selected.is_none() {
        lines.insert(
            0,
            Line::from(Span::styled(format!(" ▸ {value}"), theme::option_selected())),
        );
    }

    // Keep the active option visible when the list is taller than the card.
    let height = usize::from(area.height).max(1);
    let active = selected.unwrap_or(0);
    let skip = active.saturating_sub(height - 1);
    let visible: Vec<Line> = lines.into_iter().skip(skip).take(height).collect();
    Paragraph::new(visible).render(area, buf);
}
