//! Connectivity indicator — ●/◐/○ with color mapping.

use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};

use mixdeck_core::ConnectivityState;

use crate::theme;

/// Returns a styled `Span` with the appropriate status dot and color.
pub fn status_span(state: ConnectivityState) -> Span<'static> {
    let (symbol, color) = match state {
        ConnectivityState::Connected => ("●", theme::SUCCESS_GREEN),
        ConnectivityState::Loading => ("◐", theme::ELECTRIC_YELLOW),
        ConnectivityState::Simulated => ("○", theme::CORAL),
    };
    Span::styled(symbol, Style::default().fg(color))
}

/// Header text: `Connected: <host>`, `Loading` or `Simulation Mode`.
pub fn status_label(state: ConnectivityState, host: &str) -> String {
    match state {
        ConnectivityState::Connected => format!("Connected: {host}"),
        other => other.to_string(),
    }
}

/// Full header line with a retry hint whenever the panel is not live.
pub fn header_line(state: ConnectivityState, host: &str) -> Line<'static> {
    let mut spans = vec![
        Span::styled(" mixdeck ", theme::title_style()),
        Span::styled("│ ", theme::key_hint()),
        status_span(state),
        Span::raw(" "),
        Span::styled(
            status_label(state, host),
            Style::default()
                .fg(theme::DIM_WHITE)
                .add_modifier(Modifier::BOLD),
        ),
    ];
    if state == ConnectivityState::Simulated {
        spans.push(Span::styled("   r ", theme::key_hint_key()));
        spans.push(Span::styled("retry connection", theme::key_hint()));
    }
    Line::from(spans)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn text(line: &Line<'_>) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn header_names_host_when_connected() {
        assert_eq!(
            text(&header_line(ConnectivityState::Connected, "pipedal.local")),
            " mixdeck │ ● Connected: pipedal.local"
        );
    }

    #[test]
    fn header_offers_retry_in_simulation() {
        assert_eq!(
            text(&header_line(ConnectivityState::Simulated, "pipedal.local")),
            " mixdeck │ ○ Simulation Mode   r retry connection"
        );
    }

    #[test]
    fn header_while_loading() {
        assert_eq!(
            text(&header_line(ConnectivityState::Loading, "x")),
            " mixdeck │ ◐ Loading"
        );
    }
}
