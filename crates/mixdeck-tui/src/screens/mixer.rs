//! Mixer screen — responsive grid of control cards with keyboard editing.
//!
//! The screen never mutates controls itself. Every edit is translated by
//! [`mixdeck_core::intent`] into a change set and dispatched as
//! [`Action::UpdateControl`]; the store echoes the result back through
//! [`Action::ControlsUpdated`].

use std::cell::Cell;
use std::sync::Arc;

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Paragraph, Wrap};

use mixdeck_core::{
    ConnectivityState, Control, ControlKind, Interaction, SliderView, intent,
};

use crate::action::Action;
use crate::component::Component;
use crate::theme;
use crate::widgets::control_card::{CARD_HEIGHT, ControlCard};

/// Narrowest card before the grid drops a column.
const MIN_CARD_WIDTH: u16 = 30;
const MAX_COLUMNS: u16 = 4;
/// Placeholder cards shown while the first load is in flight.
const SKELETON_CARDS: usize = 4;

pub struct MixerScreen {
    controls: Arc<Vec<Arc<Control>>>,
    connectivity: ConnectivityState,
    selected: usize,
    /// Address the panel tried to load from; shown in the simulation banner.
    endpoint: String,
    /// Grid columns at the last render, for row-wise navigation.
    columns: Cell<usize>,
}

impl MixerScreen {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            controls: Arc::new(Vec::new()),
            connectivity: ConnectivityState::Loading,
            selected: 0,
            endpoint: endpoint.into(),
            columns: Cell::new(1),
        }
    }

    fn selected_control(&self) -> Option<&Arc<Control>> {
        self.controls.get(self.selected)
    }

    fn move_selection(&mut self, delta: isize) {
        let len = self.controls.len();
        if len == 0 {
            return;
        }
        let target = self.selected.saturating_add_signed(delta);
        self.selected = target.min(len - 1);
    }

    fn cycle_selection(&mut self, forward: bool) {
        let len = self.controls.len();
        if len == 0 {
            return;
        }
        self.selected = if forward {
            (self.selected + 1) % len
        } else {
            (self.selected + len - 1) % len
        };
    }

    /// Map a key to a gesture on the selected control.
    fn interaction_for(control: &Control, key: KeyEvent) -> Option<Interaction> {
        let coarse = key.modifiers.contains(KeyModifiers::SHIFT);
        let step = match &control.kind {
            ControlKind::Int { value, min, max } => {
                let slider = SliderView {
                    value: *value,
                    min: *min,
                    max: *max,
                };
                if coarse { slider.coarse_step() } else { 1 }
            }
            _ => 1,
        };

        match (&control.kind, key.code) {
            (ControlKind::Int { .. }, KeyCode::Right | KeyCode::Char('l' | 'L')) => {
                Some(Interaction::StepLevel(step))
            }
            (ControlKind::Int { .. }, KeyCode::Left | KeyCode::Char('h' | 'H')) => {
                Some(Interaction::StepLevel(-step))
            }
            (ControlKind::Int { value, min, max }, KeyCode::Char(digit @ '0'..='9')) => {
                let slider = SliderView {
                    value: *value,
                    min: *min,
                    max: *max,
                };
                Some(Interaction::SetLevel(slider.level_at(tenths(digit))))
            }
            (ControlKind::Int { .. }, KeyCode::Home) => Some(Interaction::LevelToMin),
            (ControlKind::Int { .. }, KeyCode::End) => Some(Interaction::LevelToMax),
            (ControlKind::Bool { .. }, KeyCode::Char(' ') | KeyCode::Enter) => {
                Some(Interaction::Toggle)
            }
            (
                ControlKind::Enum { .. },
                KeyCode::Char(' ') | KeyCode::Enter | KeyCode::Right | KeyCode::Char('l'),
            ) => Some(Interaction::StepOption(1)),
            (ControlKind::Enum { .. }, KeyCode::Left | KeyCode::Char('h')) => {
                Some(Interaction::StepOption(-1))
            }
            (ControlKind::Enum { options, .. }, KeyCode::Char(digit @ '1'..='9')) => {
                let index = usize::from(tenths(digit)).saturating_sub(1);
                options.get(index).cloned().map(Interaction::Select)
            }
            (_, KeyCode::Char('m')) => Some(Interaction::ToggleMute),
            _ => None,
        }
    }

    fn render_banner(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(theme::ELECTRIC_YELLOW));
        let text = vec![
            Line::from(vec![
                Span::styled(
                    " ⚠ Simulation mode ",
                    Style::default()
                        .fg(theme::ELECTRIC_YELLOW)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled(
                    format!("could not reach {}", self.endpoint),
                    theme::body(),
                ),
            ]),
            Line::from(vec![
                Span::styled(
                    " Showing demo controls; changes stay local.  ",
                    theme::key_hint(),
                ),
                Span::styled("r", theme::key_hint_key()),
                Span::styled(" retry", theme::key_hint()),
            ]),
        ];
        frame.render_widget(
            Paragraph::new(text).block(block).wrap(Wrap { trim: false }),
            area,
        );
    }

    /// Split `area` into a grid of card slots, one row per `CARD_HEIGHT`.
    fn grid(&self, area: Rect, count: usize) -> (Vec<Rect>, usize) {
        let columns = (area.width / MIN_CARD_WIDTH).clamp(1, MAX_COLUMNS);
        let columns = usize::from(columns);
        self.columns.set(columns);

        let visible_rows = usize::from((area.height / CARD_HEIGHT).max(1));
        let selected_row = self.selected / columns;
        let first_row = selected_row.saturating_sub(visible_rows - 1);
        let total_rows = count.div_ceil(columns);

        let mut slots = Vec::new();
        let rows = Layout::vertical(vec![Constraint::Length(CARD_HEIGHT); visible_rows]).split(area);
        let column_constraints = vec![Constraint::Ratio(1, u32::try_from(columns).unwrap_or(1)); columns];
        for (row_area, row) in rows.iter().zip(first_row..total_rows) {
            let cells = Layout::horizontal(column_constraints.clone()).split(*row_area);
            for (cell, col) in cells.iter().zip(0..columns) {
                if row * columns + col < count {
                    slots.push(*cell);
                }
            }
        }
        (slots, first_row * columns)
    }

    fn render_skeleton(&self, frame: &mut Frame, area: Rect) {
        let (slots, _) = self.grid(area, SKELETON_CARDS);
        for slot in slots {
            let block = Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(theme::border_default());
            let inner = block.inner(slot);
            frame.render_widget(block, slot);
            let bars = vec![
                Line::from(Span::styled("░".repeat(usize::from(inner.width / 2)), theme::skeleton())),
                Line::from(""),
                Line::from(Span::styled("░".repeat(usize::from(inner.width)), theme::skeleton())),
                Line::from(Span::styled("Loading…", theme::key_hint())),
            ];
            frame.render_widget(Paragraph::new(bars), inner);
        }
    }

    fn render_empty(frame: &mut Frame, area: Rect) {
        let text = vec![
            Line::from(Span::styled("No Controls Found", theme::title_style())),
            Line::from(""),
            Line::from(Span::styled(
                "The mixer reported no controls. Press r to reload.",
                theme::key_hint(),
            )),
        ];
        let [middle] = Layout::vertical([Constraint::Length(3)])
            .flex(ratatui::layout::Flex::Center)
            .areas(area);
        frame.render_widget(Paragraph::new(text).alignment(Alignment::Center), middle);
    }

    fn render_cards(&self, frame: &mut Frame, area: Rect) {
        let (slots, offset) = self.grid(area, self.controls.len());
        for (i, slot) in slots.into_iter().enumerate() {
            let index = offset + i;
            if let Some(control) = self.controls.get(index) {
                frame.render_widget(
                    ControlCard::new(control).selected(index == self.selected),
                    slot,
                );
            }
        }
    }
}

impl Component for MixerScreen {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if self.connectivity.is_loading() {
            return Ok(None);
        }

        let columns = isize::try_from(self.columns.get()).unwrap_or(1);
        match key.code {
            KeyCode::Down | KeyCode::Char('j') => {
                self.move_selection(columns);
                return Ok(None);
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.move_selection(-columns);
                return Ok(None);
            }
            KeyCode::Tab => {
                self.cycle_selection(true);
                return Ok(None);
            }
            KeyCode::BackTab => {
                self.cycle_selection(false);
                return Ok(None);
            }
            _ => {}
        }

        let Some(control) = self.selected_control() else {
            return Ok(None);
        };
        let action = Self::interaction_for(control, key)
            .and_then(|interaction| intent(control, interaction))
            .map(|changes| Action::UpdateControl {
                id: control.id.clone(),
                changes,
            });
        Ok(action)
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        match action {
            Action::ControlsUpdated(controls) => {
                // Keep the cursor on the same control across list reloads.
                let current = self.selected_control().map(|c| c.id.clone());
                self.controls = Arc::clone(controls);
                self.selected = current
                    .and_then(|id| self.controls.iter().position(|c| c.id == id))
                    .unwrap_or(0)
                    .min(self.controls.len().saturating_sub(1));
            }
            Action::ConnectivityChanged(state) => {
                self.connectivity = *state;
            }
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let area = area.inner(ratatui::layout::Margin::new(1, 0));
        match self.connectivity {
            ConnectivityState::Loading => self.render_skeleton(frame, area),
            ConnectivityState::Simulated => {
                let [banner, body] =
                    Layout::vertical([Constraint::Length(4), Constraint::Min(0)]).areas(area);
                self.render_banner(frame, banner);
                self.render_cards(frame, body);
            }
            ConnectivityState::Connected if self.controls.is_empty() => {
                Self::render_empty(frame, area);
            }
            ConnectivityState::Connected => self.render_cards(frame, area),
        }
    }
}

/// Digit key as tenths of a slider's range: `1`..`9` → 10%..90%, `0` → 100%.
fn tenths(digit: char) -> u8 {
    match digit.to_digit(10) {
        Some(0) => 10,
        Some(d) => u8::try_from(d).unwrap_or(10),
        None => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mixdeck_core::{ControlChanges, Icon, fallback_controls};
    use pretty_assertions::assert_eq;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    use crate::widgets::testing::buffer_text;

    fn screen_with(controls: Vec<Control>, state: ConnectivityState) -> MixerScreen {
        let mut screen = MixerScreen::new("http://pipedal.local:5000");
        let controls = Arc::new(controls.into_iter().map(Arc::new).collect::<Vec<_>>());
        screen.update(&Action::ControlsUpdated(controls)).ok();
        screen.update(&Action::ConnectivityChanged(state)).ok();
        screen
    }

    fn render(screen: &MixerScreen, width: u16, height: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).expect("terminal");
        terminal
            .draw(|frame| screen.render(frame, frame.area()))
            .expect("draw");
        buffer_text(terminal.backend().buffer())
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn switch() -> Control {
        Control {
            id: "loopback".into(),
            name: "Loopback".into(),
            kind: ControlKind::Bool { on: false },
            is_muted: false,
            icon: Icon::Settings,
        }
    }

    fn source() -> Control {
        Control {
            id: "source".into(),
            name: "Input Source".into(),
            kind: ControlKind::Enum {
                value: "Line In".into(),
                options: vec!["Line In".into(), "Mic In".into()],
            },
            is_muted: false,
            icon: Icon::Settings,
        }
    }

    #[test]
    fn loading_shows_placeholder_cards() {
        let screen = screen_with(Vec::new(), ConnectivityState::Loading);
        let text = render(&screen, 80, 20);
        assert_eq!(text.matches("Loading…").count(), SKELETON_CARDS);
    }

    #[test]
    fn simulation_shows_banner_with_endpoint() {
        let screen = screen_with(fallback_controls(), ConnectivityState::Simulated);
        let text = render(&screen, 100, 30);
        assert!(text.contains("Simulation mode"), "{text}");
        assert!(text.contains("http://pipedal.local:5000"), "{text}");
        assert!(text.contains("Master"), "{text}");
    }

    #[test]
    fn empty_connected_list_shows_empty_state() {
        let screen = screen_with(Vec::new(), ConnectivityState::Connected);
        let text = render(&screen, 80, 20);
        assert!(text.contains("No Controls Found"), "{text}");
    }

    #[test]
    fn arrow_keys_step_the_selected_slider() {
        let mut screen = screen_with(fallback_controls(), ConnectivityState::Connected);
        let action = screen.handle_key_event(key(KeyCode::Right)).expect("key");
        assert_eq!(
            action,
            Some(Action::UpdateControl {
                id: "master".into(),
                changes: ControlChanges::level(76),
            })
        );

        let action = screen.handle_key_event(key(KeyCode::End)).expect("key");
        assert_eq!(
            action,
            Some(Action::UpdateControl {
                id: "master".into(),
                changes: ControlChanges::level(100),
            })
        );
    }

    #[test]
    fn shift_steps_coarsely() {
        let mut screen = screen_with(fallback_controls(), ConnectivityState::Connected);
        let action = screen
            .handle_key_event(KeyEvent::new(KeyCode::Left, KeyModifiers::SHIFT))
            .expect("key");
        assert_eq!(
            action,
            Some(Action::UpdateControl {
                id: "master".into(),
                changes: ControlChanges::level(70),
            })
        );
    }

    #[test]
    fn switch_toggles_but_ignores_mute() {
        let mut screen = screen_with(vec![switch()], ConnectivityState::Connected);
        assert_eq!(screen.handle_key_event(key(KeyCode::Char('m'))).expect("key"), None);
        assert_eq!(
            screen.handle_key_event(key(KeyCode::Char(' '))).expect("key"),
            Some(Action::UpdateControl {
                id: "loopback".into(),
                changes: ControlChanges::level(1),
            })
        );
    }

    #[test]
    fn selector_steps_to_next_option() {
        let mut screen = screen_with(vec![source()], ConnectivityState::Connected);
        assert_eq!(
            screen.handle_key_event(key(KeyCode::Enter)).expect("key"),
            Some(Action::UpdateControl {
                id: "source".into(),
                changes: ControlChanges::text("Mic In"),
            })
        );
    }

    #[test]
    fn tab_moves_selection_and_mute_targets_it() {
        let mut screen = screen_with(fallback_controls(), ConnectivityState::Connected);
        screen.handle_key_event(key(KeyCode::Tab)).expect("key");
        assert_eq!(
            screen.handle_key_event(key(KeyCode::Char('m'))).expect("key"),
            Some(Action::UpdateControl {
                id: "headphone".into(),
                changes: ControlChanges::muted(true),
            })
        );
    }

    #[test]
    fn edits_are_ignored_while_loading() {
        let mut screen = screen_with(fallback_controls(), ConnectivityState::Loading);
        assert_eq!(screen.handle_key_event(key(KeyCode::Right)).expect("key"), None);
    }

    #[test]
    fn selection_follows_control_across_reloads() {
        let mut screen = screen_with(fallback_controls(), ConnectivityState::Connected);
        screen.handle_key_event(key(KeyCode::Tab)).expect("key");
        screen.handle_key_event(key(KeyCode::Tab)).expect("key");

        let mut reordered = fallback_controls();
        reordered.reverse();
        let reordered = Arc::new(reordered.into_iter().map(Arc::new).collect::<Vec<_>>());
        screen.update(&Action::ControlsUpdated(reordered)).expect("update");

        assert_eq!(screen.selected_control().map(|c| c.id.as_str()), Some("pcm"));
    }

    #[test]
    fn digit_keys_jump_to_level_or_option() {
        let mut screen = screen_with(fallback_controls(), ConnectivityState::Connected);
        assert_eq!(
            screen.handle_key_event(key(KeyCode::Char('3'))).expect("key"),
            Some(Action::UpdateControl {
                id: "master".into(),
                changes: ControlChanges::level(30),
            })
        );
        assert_eq!(
            screen.handle_key_event(key(KeyCode::Char('0'))).expect("key"),
            Some(Action::UpdateControl {
                id: "master".into(),
                changes: ControlChanges::level(100),
            })
        );

        let mut screen = screen_with(vec![source()], ConnectivityState::Connected);
        assert_eq!(
            screen.handle_key_event(key(KeyCode::Char('2'))).expect("key"),
            Some(Action::UpdateControl {
                id: "source".into(),
                changes: ControlChanges::text("Mic In"),
            })
        );
        assert_eq!(screen.handle_key_event(key(KeyCode::Char('9'))).expect("key"), None);
    }
}
