// ── Domain model ──
//
// Canonical control types. Wire records from `mixdeck-api` are converted
// into these in `crate::convert`.

mod control;

pub use control::{
    clamp_level, Control, ControlChanges, ControlKind, ControlType, ControlValue, Icon,
};
