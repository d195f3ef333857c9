// ── Control domain types ──

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// The closed set of control kinds. Determines which attributes of a
/// [`Control`] are meaningful and which widget renders it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum ControlType {
    Int,
    Bool,
    Enum,
}

/// Kind-specific state of a control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ControlKind {
    /// Continuous level bounded by inclusive `[min, max]`.
    Int { value: i64, min: i64, max: i64 },
    /// Binary switch (`0`/`1` on the wire).
    Bool { on: bool },
    /// One-of selection over an ordered option list.
    Enum { value: String, options: Vec<String> },
}

impl ControlKind {
    pub fn control_type(&self) -> ControlType {
        match self {
            Self::Int { .. } => ControlType::Int,
            Self::Bool { .. } => ControlType::Bool,
            Self::Enum { .. } => ControlType::Enum,
        }
    }

    /// Current value in wire form.
    pub fn value(&self) -> ControlValue {
        match self {
            Self::Int { value, .. } => ControlValue::Int(*value),
            Self::Bool { on } => ControlValue::Int(i64::from(*on)),
            Self::Enum { value, .. } => ControlValue::Text(value.clone()),
        }
    }
}

/// Presentation hint for a control. Has no behavioral meaning.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Icon {
    #[default]
    Speaker,
    Headphone,
    Chip,
    Mic,
    Settings,
}

impl Icon {
    /// Guess an icon from a control name, for backends that send none.
    pub fn for_name(name: &str) -> Self {
        let lower = name.to_lowercase();
        if lower.contains("mic") || lower.contains("capture") {
            Self::Mic
        } else if lower.contains("headphone") {
            Self::Headphone
        } else if lower.contains("pcm") {
            Self::Chip
        } else {
            Self::Speaker
        }
    }
}

/// A value as carried by an update: numeric for `Int`/`Bool`, text for `Enum`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ControlValue {
    Int(i64),
    Text(String),
}

/// A partial update: any subset of `{value, is_muted}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlChanges {
    pub value: Option<ControlValue>,
    pub is_muted: Option<bool>,
}

impl ControlChanges {
    pub fn value(value: ControlValue) -> Self {
        Self {
            value: Some(value),
            is_muted: None,
        }
    }

    pub fn level(value: i64) -> Self {
        Self::value(ControlValue::Int(value))
    }

    pub fn text(value: impl Into<String>) -> Self {
        Self::value(ControlValue::Text(value.into()))
    }

    pub fn muted(is_muted: bool) -> Self {
        Self {
            value: None,
            is_muted: Some(is_muted),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_none() && self.is_muted.is_none()
    }

    /// Fold a newer change set into this one. Fields present in `newer` win.
    pub fn merge(&mut self, newer: ControlChanges) {
        if newer.value.is_some() {
            self.value = newer.value;
        }
        if newer.is_muted.is_some() {
            self.is_muted = newer.is_muted;
        }
    }
}

/// One named, typed, mutable mixer parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Control {
    pub id: String,
    pub name: String,
    pub kind: ControlKind,
    pub is_muted: bool,
    pub icon: Icon,
}

impl Control {
    pub fn control_type(&self) -> ControlType {
        self.kind.control_type()
    }

    /// Merge `changes` into this control and return what was actually applied.
    ///
    /// - `Int` values are clamped into `[min, max]`.
    /// - A value of the wrong kind (text for a level, a number for a
    ///   selection) is dropped, as is an `Enum` value outside `options`.
    /// - `is_muted` is dropped for `Bool` controls.
    ///
    /// The returned set is empty when nothing applied.
    pub fn apply(&mut self, changes: &ControlChanges) -> ControlChanges {
        let mut applied = ControlChanges::default();

        if let Some(ref requested) = changes.value {
            applied.value = match (&mut self.kind, requested) {
                (ControlKind::Int { value, min, max }, ControlValue::Int(v)) => {
                    *value = clamp_level(*v, *min, *max);
                    Some(ControlValue::Int(*value))
                }
                (ControlKind::Bool { on }, ControlValue::Int(v)) => {
                    *on = *v != 0;
                    Some(ControlValue::Int(i64::from(*on)))
                }
                (ControlKind::Enum { value, options }, ControlValue::Text(s))
                    if options.is_empty() || options.contains(s) =>
                {
                    value.clone_from(s);
                    Some(ControlValue::Text(s.clone()))
                }
                _ => None,
            };
        }

        if let Some(muted) = changes.is_muted {
            if !matches!(self.kind, ControlKind::Bool { .. }) {
                self.is_muted = muted;
                applied.is_muted = Some(muted);
            }
        }

        applied
    }
}

/// Clamp `value` into the inclusive range spanned by `a` and `b`, whichever
/// order they come in.
pub fn clamp_level(value: i64, a: i64, b: i64) -> i64 {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    value.clamp(lo, hi)
}
