//! Application core — event loop, action dispatch, chrome rendering.

use std::time::{Duration, Instant};

use chrono::Local;
use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph},
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use mixdeck_core::{
    ConnectivityState, Controller, ControllerConfig, UpdateSink,
};

use crate::action::{Action, Notification, NotificationLevel};
use crate::component::Component;
use crate::data_bridge::spawn_data_bridge;
use crate::event::{Event, EventReader};
use crate::screens::mixer::MixerScreen;
use crate::theme;
use crate::tui::Tui;
use crate::widgets::status_indicator;

/// How long a toast stays on screen.
const NOTIFICATION_TTL: Duration = Duration::from_secs(4);

/// Top-level application state and event loop.
pub struct App {
    controller: Controller,
    mixer: MixerScreen,
    /// Whether the app should keep running.
    running: bool,
    connectivity: ConnectivityState,
    /// Help overlay visibility.
    help_visible: bool,
    /// Active notification toast with display timestamp.
    notification: Option<(Notification, Instant)>,
    /// Action sender — components and the controller dispatch through this.
    action_tx: mpsc::UnboundedSender<Action>,
    /// Action receiver — main loop drains this.
    action_rx: mpsc::UnboundedReceiver<Action>,
}

impl App {
    /// Build the app and its controller. Nothing is fetched until [`App::run`].
    pub fn new(config: ControllerConfig) -> Result<Self> {
        let (action_tx, action_rx) = mpsc::unbounded_channel();

        // Failed writes are only logged; the panel keeps showing the local value.
        let controller = Controller::new(config)?;

        let mixer = MixerScreen::new(controller.base_url().as_str());

        Ok(Self {
            controller,
            mixer,
            running: true,
            connectivity: ConnectivityState::Loading,
            help_visible: false,
            notification: None,
            action_tx,
            action_rx,
        })
    }

    /// Run the main event loop until the user quits.
    pub async fn run(&mut self) -> Result<()> {
        let mut tui = Tui::new()?;
        tui.enter()?;
        self.mixer.init(self.action_tx.clone())?;

        let cancel = CancellationToken::new();
        let bridge = tokio::spawn(spawn_data_bridge(
            self.controller.clone(),
            self.action_tx.clone(),
            cancel.clone(),
        ));

        let mut events = EventReader::new(
            Duration::from_millis(250), // 4 Hz tick
            Duration::from_millis(33),  // ~30 FPS render
        );

        info!(url = %self.controller.base_url(), "TUI event loop started");

        while self.running {
            // 1. Wait for the next event
            let Some(event) = events.next().await else {
                break;
            };

            // 2. Map event → action
            match event {
                Event::Key(key) => {
                    if let Some(action) = self.handle_key_event(key)? {
                        self.action_tx.send(action)?;
                    }
                }
                Event::Resize(w, h) => self.action_tx.send(Action::Resize(w, h))?,
                Event::Tick => self.action_tx.send(Action::Tick)?,
                Event::Render => self.action_tx.send(Action::Render)?,
            }

            // 3. Drain and process all queued actions
            while let Ok(action) = self.action_rx.try_recv() {
                self.process_action(&action)?;

                if let Action::Render = action {
                    tui.draw(|frame| self.render(frame))?;
                }
            }
        }

        events.stop();
        cancel.cancel();
        let _ = bridge.await;
        info!("TUI event loop ended");
        Ok(())
    }

    /// Map a key event to an action. Global keys first, then the mixer.
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if self.help_visible {
            return match key.code {
                KeyCode::Esc | KeyCode::Char('?') => Ok(Some(Action::ToggleHelp)),
                KeyCode::Char('q') => Ok(Some(Action::Quit)),
                _ => Ok(None),
            };
        }

        match (key.modifiers, key.code) {
            (KeyModifiers::CONTROL, KeyCode::Char('c'))
            | (KeyModifiers::NONE, KeyCode::Char('q')) => return Ok(Some(Action::Quit)),
            (KeyModifiers::NONE, KeyCode::Char('?')) => return Ok(Some(Action::ToggleHelp)),
            (KeyModifiers::NONE, KeyCode::Char('r')) => return Ok(Some(Action::Retry)),
            (KeyModifiers::NONE, KeyCode::Esc) if self.notification.is_some() => {
                self.notification = None;
                return Ok(None);
            }
            _ => {}
        }

        self.mixer.handle_key_event(key)
    }

    /// Process a single action — update app state and propagate to the mixer.
    fn process_action(&mut self, action: &Action) -> Result<()> {
        match action {
            Action::Quit => self.running = false,

            Action::ToggleHelp => self.help_visible = !self.help_visible,

            Action::Tick => {
                if self
                    .notification
                    .as_ref()
                    .is_some_and(|(_, shown)| shown.elapsed() >= NOTIFICATION_TTL)
                {
                    self.notification = None;
                }
            }

            Action::Notify(notification) => {
                self.notification = Some((notification.clone(), Instant::now()));
            }

            Action::Retry => {
                if self.connectivity.is_loading() {
                    debug!("retry ignored while a load is in flight");
                    self.action_tx.send(Action::Notify(Notification::warning(
                        "Still loading, try again in a moment",
                    )))?;
                } else {
                    self.controller.retry();
                    self.action_tx.send(Action::Notify(Notification::info(format!(
                        "Reconnecting to {}",
                        self.controller.config().host()
                    ))))?;
                }
            }

            Action::UpdateControl { id, changes } => {
                let outcome = UpdateSink::apply_update(&self.controller, id, changes.clone());
                debug!(%id, ?outcome, "control edited");
            }

            Action::ConnectivityChanged(state) => {
                self.connectivity = *state;
                if let Some(follow_up) = self.mixer.update(action)? {
                    self.action_tx.send(follow_up)?;
                }
            }

            Action::ControlsUpdated(_) => {
                if let Some(follow_up) = self.mixer.update(action)? {
                    self.action_tx.send(follow_up)?;
                }
            }

            // Layout is recomputed on every draw; render happens in the main loop
            Action::Resize(..) | Action::Render => {}
        }

        Ok(())
    }

    /// Render the full application frame.
    fn render(&self, frame: &mut Frame) {
        let area = frame.area();

        let [header_area, content_area, status_area] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .areas(area);

        frame.render_widget(
            Paragraph::new(status_indicator::header_line(
                self.connectivity,
                self.controller.config().host(),
            )),
            header_area,
        );

        self.mixer.render(frame, content_area);
        self.render_status_bar(frame, status_area);

        if self.help_visible {
            Self::render_help_overlay(frame, area);
        }

        if let Some((ref notification, _)) = self.notification {
            Self::render_notification(frame, area, notification);
        }
    }

    /// Key hints plus last load time and in-flight update count.
    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        let mut spans = vec![Span::styled(
            " ←/→ adjust  ␣ toggle  m mute  ↑/↓ select  r retry  ? help  q quit",
            theme::key_hint(),
        )];

        if let Some(loaded) = self.controller.store().last_load() {
            spans.push(Span::styled(
                format!("  │ loaded {}", loaded.with_timezone(&Local).format("%H:%M:%S")),
                theme::status_bar(),
            ));
        }

        let pending = self.controller.pending_updates();
        if pending > 0 {
            spans.push(Span::styled(
                format!("  │ {pending} syncing"),
                Style::default().fg(theme::ELECTRIC_YELLOW),
            ));
        }

        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    /// Render the help overlay centered on screen.
    fn render_help_overlay(frame: &mut Frame, area: Rect) {
        let help_width = 52u16.min(area.width.saturating_sub(4));
        let help_height = 18u16.min(area.height.saturating_sub(2));

        let x = (area.width.saturating_sub(help_width)) / 2;
        let y = (area.height.saturating_sub(help_height)) / 2;
        let help_area = Rect::new(area.x + x, area.y + y, help_width, help_height);

        frame.render_widget(Clear, help_area);
        frame.render_widget(
            Block::default().style(Style::default().bg(theme::BG_DARK)),
            help_area,
        );

        let block = Block::default()
            .title(" Keyboard Shortcuts ")
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_focused());

        let inner = block.inner(help_area);
        frame.render_widget(block, help_area);

        let entry = |key: &'static str, what: &'static str| {
            Line::from(vec![
                Span::styled(format!("  {key:<12}"), theme::key_hint_key()),
                Span::styled(what, theme::key_hint()),
            ])
        };

        let help_text = vec![
            Line::from(""),
            entry("←/→ h/l", "Adjust level / previous, next option"),
            entry("Shift+←/→", "Adjust level in 5% steps"),
            entry("Home/End", "Level to minimum / maximum"),
            entry("1-9 0", "Level to 10–90% / 100%, or pick option"),
            entry("Space/Enter", "Toggle switch / next option"),
            entry("m", "Mute / unmute"),
            entry("↑/↓ j/k", "Move between rows"),
            entry("Tab", "Next control"),
            Line::from(""),
            entry("r", "Retry connection"),
            entry("?", "This help"),
            entry("q", "Quit"),
            Line::from(""),
            Line::from(Span::styled("  Esc or ? to close", theme::key_hint())),
        ];

        frame.render_widget(Paragraph::new(help_text), inner);
    }

    /// Render a notification toast in the bottom-right corner.
    fn render_notification(frame: &mut Frame, area: Rect, notif: &Notification) {
        let msg_len = u16::try_from(notif.message.chars().count()).unwrap_or(u16::MAX);
        let width = msg_len.saturating_add(6).clamp(20, 60).min(area.width);
        let height = 3u16;

        let x = area.width.saturating_sub(width + 1);
        let y = area.height.saturating_sub(height + 1); // above status bar
        let toast_area = Rect::new(area.x + x, area.y + y, width, height);

        let (border_color, icon) = match notif.level {
            NotificationLevel::Warning => (theme::ELECTRIC_YELLOW, "!"),
            NotificationLevel::Info => (theme::NEON_CYAN, "·"),
        };

        frame.render_widget(Clear, toast_area);
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(border_color))
            .style(Style::default().bg(theme::BG_DARK));

        let inner = block.inner(toast_area);
        frame.render_widget(block, toast_area);

        let line = Line::from(vec![
            Span::styled(format!(" {icon} "), Style::default().fg(border_color)),
            Span::styled(notif.message.as_str(), Style::default().fg(theme::DIM_WHITE)),
        ]);
        frame.render_widget(Paragraph::new(line), inner);
    }
}
