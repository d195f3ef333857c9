// ── Demonstration dataset ──
//
// Served whenever the backend cannot be read, so the panel stays explorable
// without a device. Values are served verbatim, including `mic`, whose value
// deliberately lies outside its range.

use crate::model::{Control, ControlKind, Icon};

fn level(id: &str, name: &str, value: i64, max: i64, is_muted: bool, icon: Icon) -> Control {
    Control {
        id: id.into(),
        name: name.into(),
        kind: ControlKind::Int { value, min: 0, max },
        is_muted,
        icon,
    }
}

/// The fixed simulation-mode control list.
pub fn fallback_controls() -> Vec<Control> {
    vec![
        level("master", "Master", 75, 100, false, Icon::Speaker),
        level("headphone", "Headphone", 40, 100, false, Icon::Headphone),
        level("pcm", "PCM", 90, 100, false, Icon::Chip),
        level("mic", "Mic Boost", 20, 3, true, Icon::Mic),
    ]
}
