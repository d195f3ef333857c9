//! Neon palette and semantic styling for the panel.

use ratatui::style::{Color, Modifier, Style};

use mixdeck_core::Icon;

// ── Core Palette ──────────────────────────────────────────────────────

pub const ELECTRIC_PURPLE: Color = Color::Rgb(225, 53, 255); // #e135ff
pub const NEON_CYAN: Color = Color::Rgb(128, 255, 234); // #80ffea
pub const CORAL: Color = Color::Rgb(255, 106, 193); // #ff6ac1
pub const ELECTRIC_YELLOW: Color = Color::Rgb(241, 250, 140); // #f1fa8c
pub const SUCCESS_GREEN: Color = Color::Rgb(80, 250, 123); // #50fa7b
pub const ERROR_RED: Color = Color::Rgb(255, 99, 99); // #ff6363

// ── Extended Palette ──────────────────────────────────────────────────

pub const DIM_WHITE: Color = Color::Rgb(189, 193, 207); // #bdc1cf
pub const BORDER_GRAY: Color = Color::Rgb(98, 114, 164); // #6272a4
pub const BG_HIGHLIGHT: Color = Color::Rgb(40, 42, 54); // #282a36
pub const BG_DARK: Color = Color::Rgb(30, 31, 41); // #1e1f29
pub const LIGHT_BLUE: Color = Color::Rgb(139, 233, 253); // #8be9fd

// ── Semantic Styles ───────────────────────────────────────────────────

/// Title text for blocks/panels.
pub fn title_style() -> Style {
    Style::default().fg(NEON_CYAN).add_modifier(Modifier::BOLD)
}

/// Border for the selected card.
pub fn border_focused() -> Style {
    Style::default().fg(ELECTRIC_PURPLE)
}

/// Border for an unselected card.
pub fn border_default() -> Style {
    Style::default().fg(BORDER_GRAY)
}

/// Border for a muted card.
pub fn border_muted() -> Style {
    Style::default().fg(ERROR_RED)
}

/// Control name on a muted card: dimmed and struck through.
pub fn muted_name() -> Style {
    Style::default()
        .fg(BORDER_GRAY)
        .add_modifier(Modifier::CROSSED_OUT | Modifier::DIM)
}

/// Normal body text.
pub fn body() -> Style {
    Style::default().fg(DIM_WHITE)
}

/// Filled part of a level bar.
pub fn level_fill(muted: bool) -> Style {
    if muted {
        Style::default().fg(BORDER_GRAY).bg(BG_HIGHLIGHT)
    } else {
        Style::default().fg(NEON_CYAN).bg(BG_HIGHLIGHT)
    }
}

/// The active option in a selector.
pub fn option_selected() -> Style {
    Style::default()
        .fg(ELECTRIC_PURPLE)
        .bg(BG_HIGHLIGHT)
        .add_modifier(Modifier::BOLD)
}

/// Placeholder skeleton while loading.
pub fn skeleton() -> Style {
    Style::default().fg(BG_HIGHLIGHT)
}

/// Status bar text.
pub fn status_bar() -> Style {
    Style::default().fg(DIM_WHITE)
}

/// Key hint text (e.g., "q quit  ? help").
pub fn key_hint() -> Style {
    Style::default().fg(BORDER_GRAY)
}

/// Key hint key character.
pub fn key_hint_key() -> Style {
    Style::default().fg(NEON_CYAN).add_modifier(Modifier::BOLD)
}

// ── Icons ─────────────────────────────────────────────────────────────

/// Glyph and accent color for a control icon.
pub fn icon(icon: Icon) -> (&'static str, Color) {
    match icon {
        Icon::Speaker => ("🔊", NEON_CYAN),
        Icon::Headphone => ("🎧", LIGHT_BLUE),
        Icon::Chip => ("▣", ELECTRIC_YELLOW),
        Icon::Mic => ("🎤", CORAL),
        Icon::Settings => ("⚙", DIM_WHITE),
    }
}
