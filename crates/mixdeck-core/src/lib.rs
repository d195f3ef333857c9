// mixdeck-core: Control store between mixdeck-api and the panel.
//
// Owns the mirrored control list, the Loading/Connected/Simulated state
// machine, optimistic updates with per-control propagation, and the widget
// contract renderers build on.

pub mod config;
pub mod controller;
pub mod convert;
pub mod error;
pub mod fallback;
pub mod model;
pub mod propagate;
pub mod store;
pub mod stream;
pub mod widget;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{ControllerConfig, RangePolicy};
pub use controller::{ConnectivityState, Controller, UpdateOutcome, UpdateSink};
pub use error::CoreError;
pub use fallback::fallback_controls;
pub use propagate::{FailureHook, UpdateFailure};
pub use store::ControlStore;
pub use stream::ControlStream;
pub use widget::{intent, ControlView, Interaction, SliderView, WidgetView};

// Re-export model types at the crate root for ergonomics.
pub use model::{Control, ControlChanges, ControlKind, ControlType, ControlValue, Icon};
