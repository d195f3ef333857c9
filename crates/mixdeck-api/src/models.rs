// Mixer backend wire types
//
// The backend speaks a flat JSON shape for every control regardless of its
// kind: `{ id, name, type, value, min, max, options, isMuted, icon }`.
// Which fields are meaningful depends on `type`, so everything except `id`
// is defaulted here and interpreted by `mixdeck-core`'s conversion layer.

use serde::{Deserialize, Serialize};

// ── Control ──────────────────────────────────────────────────────────

/// One control as returned by `GET /api/controls`.
///
/// `value` stays untyped: it is an integer for `INT`/`BOOL` controls and a
/// string for `ENUM` controls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlRecord {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    /// `"INT"`, `"BOOL"` or `"ENUM"`; anything else is treated as `INT`.
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub value: serde_json::Value,
    #[serde(default)]
    pub min: Option<i64>,
    #[serde(default)]
    pub max: Option<i64>,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub is_muted: Option<bool>,
    #[serde(default)]
    pub icon: Option<String>,
}

// ── Update body ──────────────────────────────────────────────────────

/// Value carried by an update: numeric for levels and switches, text for
/// enumerated selections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PatchValue {
    Int(i64),
    Text(String),
}

/// Body of `POST /api/controls/{id}`. Absent fields are left out of the
/// JSON entirely so the backend only touches what changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<PatchValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_muted: Option<bool>,
}
