// ── API-to-domain type conversions ──
//
// Bridges raw `mixdeck_api` wire types into canonical `mixdeck_core::model`
// types. The backend is loose about field presence and value types, so each
// conversion fills sensible defaults rather than failing the whole list.

use std::collections::HashSet;

use serde_json::Value;
use tracing::warn;

use mixdeck_api::{ControlPatch, ControlRecord, PatchValue};

use crate::config::RangePolicy;
use crate::model::{clamp_level, Control, ControlChanges, ControlKind, ControlType, ControlValue, Icon};

const DEFAULT_MIN: i64 = 0;
const DEFAULT_MAX: i64 = 100;

// ── Helpers ────────────────────────────────────────────────────────

/// Read an integer out of a loosely-typed JSON value.
#[allow(clippy::cast_possible_truncation, clippy::as_conversions)]
fn value_as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.round() as i64)),
        Value::Bool(b) => Some(i64::from(*b)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn value_as_switch(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => matches!(s.trim().to_lowercase().as_str(), "1" | "on" | "true"),
        other => value_as_i64(other).is_some_and(|v| v != 0),
    }
}

fn value_as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Map the wire `type` tag. Anything unrecognized renders as a level.
fn control_type(tag: &str) -> ControlType {
    tag.trim().parse().unwrap_or(ControlType::Int)
}

// ── Control ────────────────────────────────────────────────────────

impl From<ControlRecord> for Control {
    fn from(record: ControlRecord) -> Self {
        let kind = match control_type(&record.kind) {
            ControlType::Enum => ControlKind::Enum {
                value: value_as_text(&record.value)
                    .or_else(|| record.options.first().cloned())
                    .unwrap_or_default(),
                options: record.options,
            },
            ControlType::Bool => ControlKind::Bool {
                on: value_as_switch(&record.value),
            },
            ControlType::Int => {
                let a = record.min.unwrap_or(DEFAULT_MIN);
                let b = record.max.unwrap_or(DEFAULT_MAX);
                let (min, max) = if a <= b { (a, b) } else { (b, a) };
                ControlKind::Int {
                    value: value_as_i64(&record.value).unwrap_or(min),
                    min,
                    max,
                }
            }
        };

        let name = record
            .name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| record.id.clone());
        let icon = record
            .icon
            .as_deref()
            .and_then(|i| i.parse().ok())
            .unwrap_or_else(|| Icon::for_name(&name));

        Control {
            id: record.id,
            name,
            kind,
            is_muted: record.is_muted.unwrap_or(false),
            icon,
        }
    }
}

/// Convert a backend control list, keeping ids unique and applying the
/// ingress range policy to out-of-range levels.
///
/// Records with an empty id, or an id already seen earlier in the list, are
/// dropped. With [`RangePolicy::Reject`] an out-of-range level drops the
/// record as well.
pub fn controls_from_records(records: Vec<ControlRecord>, policy: RangePolicy) -> Vec<Control> {
    let mut seen = HashSet::with_capacity(records.len());
    let mut controls = Vec::with_capacity(records.len());

    for record in records {
        if record.id.is_empty() {
            warn!("dropping control record without an id");
            continue;
        }
        if !seen.insert(record.id.clone()) {
            warn!(id = %record.id, "dropping control record with duplicate id");
            continue;
        }

        let mut control = Control::from(record);
        if let ControlKind::Int { value, min, max } = &mut control.kind {
            if *value < *min || *value > *max {
                match policy {
                    RangePolicy::PassThrough => {}
                    RangePolicy::Clamp => *value = clamp_level(*value, *min, *max),
                    RangePolicy::Reject => {
                        warn!(
                            id = %control.id,
                            value = *value,
                            min = *min,
                            max = *max,
                            "dropping control with out-of-range value"
                        );
                        continue;
                    }
                }
            }
        }
        controls.push(control);
    }

    controls
}

// ── Update body ────────────────────────────────────────────────────

impl From<ControlValue> for PatchValue {
    fn from(value: ControlValue) -> Self {
        match value {
            ControlValue::Int(v) => PatchValue::Int(v),
            ControlValue::Text(s) => PatchValue::Text(s),
        }
    }
}

impl From<ControlChanges> for ControlPatch {
    fn from(changes: ControlChanges) -> Self {
        ControlPatch {
            value: changes.value.map(PatchValue::from),
            is_muted: changes.is_muted,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(v: Value) -> ControlRecord {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn int_record_maps_to_level() {
        let c = Control::from(record(json!({
            "id": "Master", "name": "Master", "type": "INT",
            "value": 80, "min": 0, "max": 100, "isMuted": true, "icon": "speaker"
        })));

        assert_eq!(c.kind, ControlKind::Int { value: 80, min: 0, max: 100 });
        assert!(c.is_muted);
        assert_eq!(c.icon, Icon::Speaker);
    }

    #[test]
    fn unknown_type_defaults_to_level_with_default_bounds() {
        let c = Control::from(record(json!({ "id": "Tone", "type": "FLOAT", "value": 3 })));
        assert_eq!(c.kind, ControlKind::Int { value: 3, min: 0, max: 100 });
        assert_eq!(c.name, "Tone");
    }

    #[test]
    fn swapped_bounds_are_normalized() {
        let c = Control::from(record(json!({
            "id": "x", "type": "INT", "value": 2, "min": 10, "max": 0
        })));
        assert_eq!(c.kind, ControlKind::Int { value: 2, min: 0, max: 10 });
    }

    #[test]
    fn bool_record_accepts_number_bool_and_string() {
        for value in [json!(1), json!(true), json!("on")] {
            let c = Control::from(record(json!({ "id": "sw", "type": "BOOL", "value": value })));
            assert_eq!(c.kind, ControlKind::Bool { on: true });
        }
        let c = Control::from(record(json!({ "id": "sw", "type": "BOOL", "value": 0 })));
        assert_eq!(c.kind, ControlKind::Bool { on: false });
    }

    #[test]
    fn enum_record_keeps_options_in_order() {
        let c = Control::from(record(json!({
            "id": "mic", "type": "ENUM", "value": "Line In",
            "options": ["Line In", "Mic In"]
        })));
        assert_eq!(
            c.kind,
            ControlKind::Enum {
                value: "Line In".into(),
                options: vec!["Line In".into(), "Mic In".into()],
            }
        );
        assert_eq!(c.icon, Icon::Mic);
    }

    #[test]
    fn missing_icon_is_derived_from_name() {
        let c = Control::from(record(json!({ "id": "PCM", "type": "INT", "value": 1 })));
        assert_eq!(c.icon, Icon::Chip);
    }

    #[test]
    fn duplicate_and_empty_ids_are_dropped() {
        let records = vec![
            record(json!({ "id": "a", "type": "INT", "value": 1 })),
            record(json!({ "id": "", "type": "INT", "value": 2 })),
            record(json!({ "id": "a", "type": "INT", "value": 3 })),
            record(json!({ "id": "b", "type": "BOOL", "value": 1 })),
        ];
        let controls = controls_from_records(records, RangePolicy::PassThrough);
        let ids: Vec<_> = controls.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(controls[0].kind.value(), ControlValue::Int(1));
    }

    fn out_of_range() -> Vec<ControlRecord> {
        vec![
            record(json!({ "id": "mic", "type": "INT", "value": 20, "min": 0, "max": 3 })),
            record(json!({ "id": "pcm", "type": "INT", "value": 90, "min": 0, "max": 100 })),
        ]
    }

    #[test]
    fn range_policy_pass_through_keeps_value() {
        let controls = controls_from_records(out_of_range(), RangePolicy::PassThrough);
        assert_eq!(controls[0].kind.value(), ControlValue::Int(20));
    }

    #[test]
    fn range_policy_clamp_clamps_value() {
        let controls = controls_from_records(out_of_range(), RangePolicy::Clamp);
        assert_eq!(controls[0].kind.value(), ControlValue::Int(3));
        assert_eq!(controls[1].kind.value(), ControlValue::Int(90));
    }

    #[test]
    fn range_policy_reject_drops_record() {
        let controls = controls_from_records(out_of_range(), RangePolicy::Reject);
        assert_eq!(controls.len(), 1);
        assert_eq!(controls[0].id, "pcm");
    }

    #[test]
    fn changes_convert_to_patch() {
        let patch = ControlPatch::from(ControlChanges::text("Mic In"));
        assert_eq!(patch.value, Some(PatchValue::Text("Mic In".into())));
        assert_eq!(patch.is_muted, None);
    }
}
