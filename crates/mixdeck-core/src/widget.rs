// ── Control widget contract ──
//
// Pure functions from a control's state to what its widget shows, and from
// a raw interaction to the change set handed to `UpdateSink`. Renderers hold
// nothing beyond the interaction in progress.

use crate::model::{clamp_level, Control, ControlChanges, ControlKind};

// ── View model ───────────────────────────────────────────────────────

/// Slider state for a level control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SliderView {
    pub value: i64,
    pub min: i64,
    pub max: i64,
}

impl SliderView {
    /// Position of `value` within the range, in percent. Not clamped: a
    /// backend value outside its range yields a figure outside `0..=100`.
    #[allow(clippy::cast_precision_loss, clippy::as_conversions)]
    pub fn percent(&self) -> f64 {
        // Backend bounds may span the whole i64 range.
        let range = i128::from(self.max) - i128::from(self.min);
        if range == 0 {
            return 0.0;
        }
        let offset = i128::from(self.value) - i128::from(self.min);
        offset as f64 / range as f64 * 100.0
    }

    /// The level `tenths`/10 of the way from `min` to `max`.
    pub fn level_at(&self, tenths: u8) -> i64 {
        let range = i128::from(self.max) - i128::from(self.min);
        let level = i128::from(self.min) + range * i128::from(tenths.min(10)) / 10;
        i64::try_from(level).unwrap_or(self.max)
    }

    /// Bar fill in whole percent, always within `0..=100`.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::as_conversions
    )]
    pub fn fill(&self) -> u16 {
        self.percent().clamp(0.0, 100.0).round() as u16
    }

    /// Coarse step: 5% of the range, at least 1.
    pub fn coarse_step(&self) -> i64 {
        i64::try_from(self.max.abs_diff(self.min) / 20)
            .unwrap_or(i64::MAX)
            .max(1)
    }
}

/// Which widget a control gets, and what it shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WidgetView {
    Slider(SliderView),
    Toggle { on: bool },
    Selector {
        options: Vec<String>,
        /// Index of the current value in `options`; `None` when the backend
        /// reported a value that is not one of them.
        selected: Option<usize>,
        value: String,
    },
}

/// Everything a renderer needs for one control card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlView {
    pub widget: WidgetView,
    /// Mute affordance: `Some(is_muted)` for levels and selections, `None`
    /// for switches, which never offer one.
    pub mute: Option<bool>,
}

impl ControlView {
    pub fn of(control: &Control) -> Self {
        let (widget, mute) = match &control.kind {
            ControlKind::Enum { value, options } => (
                WidgetView::Selector {
                    options: options.clone(),
                    selected: options.iter().position(|o| o == value),
                    value: value.clone(),
                },
                Some(control.is_muted),
            ),
            ControlKind::Bool { on } => (WidgetView::Toggle { on: *on }, None),
            ControlKind::Int { value, min, max } => (
                WidgetView::Slider(SliderView {
                    value: *value,
                    min: *min,
                    max: *max,
                }),
                Some(control.is_muted),
            ),
        };
        Self { widget, mute }
    }

    /// Whether the card should render in its muted style.
    pub fn is_muted(&self) -> bool {
        self.mute.unwrap_or(false)
    }
}

// ── Interactions ─────────────────────────────────────────────────────

/// A raw user gesture on a control widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interaction {
    /// Drag the slider to an absolute value.
    SetLevel(i64),
    /// Nudge the slider by a signed amount.
    StepLevel(i64),
    LevelToMin,
    LevelToMax,
    /// Flip a switch.
    Toggle,
    /// Pick an option by name.
    Select(String),
    /// Move the selection by a signed number of options, wrapping.
    StepOption(isize),
    ToggleMute,
}

/// Translate `interaction` on `control` into a change set.
///
/// Returns `None` when the gesture does not apply to the control's kind
/// (e.g. mute on a switch). Level changes are always within `[min, max]`.
pub fn intent(control: &Control, interaction: Interaction) -> Option<ControlChanges> {
    match (&control.kind, interaction) {
        (ControlKind::Int { min, max, .. }, Interaction::SetLevel(v)) => {
            Some(ControlChanges::level(clamp_level(v, *min, *max)))
        }
        (ControlKind::Int { value, min, max }, Interaction::StepLevel(delta)) => Some(
            ControlChanges::level(clamp_level(value.saturating_add(delta), *min, *max)),
        ),
        (ControlKind::Int { min, max, .. }, Interaction::LevelToMin) => {
            Some(ControlChanges::level(*min.min(max)))
        }
        (ControlKind::Int { min, max, .. }, Interaction::LevelToMax) => {
            Some(ControlChanges::level(*min.max(max)))
        }
        (ControlKind::Bool { on }, Interaction::Toggle) => {
            Some(ControlChanges::level(if *on { 0 } else { 1 }))
        }
        (ControlKind::Enum { options, .. }, Interaction::Select(option)) => options
            .contains(&option)
            .then(|| ControlChanges::text(option)),
        (ControlKind::Enum { value, options }, Interaction::StepOption(delta)) => {
            step_option(options, value, delta).map(ControlChanges::text)
        }
        (ControlKind::Int { .. } | ControlKind::Enum { .. }, Interaction::ToggleMute) => {
            Some(ControlChanges::muted(!control.is_muted))
        }
        _ => None,
    }
}

/// The option `delta` places away from `current`, wrapping at both ends.
/// From an unlisted value, stepping forward lands on the first option.
fn step_option(options: &[String], current: &str, delta: isize) -> Option<String> {
    let len = isize::try_from(options.len()).ok().filter(|&n| n > 0)?;
    let next = match options.iter().position(|o| o == current) {
        Some(pos) => (isize::try_from(pos).ok()? + delta).rem_euclid(len),
        None if delta >= 0 => 0,
        None => len - 1,
    };
    let next = usize::try_from(next).ok()?;
    options.get(next).cloned()
}
