//! Expression resolution and the expression control panel.
//!
//! Inbound expression names are resolved against the active model's catalog
//! mapping before they reach the rendering engine:
//!
//! ```text
//!   "happy" ──▶ ExpressionMapping {"happy": "f04"} ──▶ engine.set_expression("f04")
//!   "wink"  ──▶ (not mapped)                       ──▶ engine.set_expression("wink")
//! ```
//!
//! Unmapped values pass through untouched. The backend is trusted to send ids
//! the engine understands, and an unknown id is simply ignored by the engine.
//!
//! The panel lists one control per expression. It is built from the catalog
//! mapping when the model has one, otherwise from the expression definitions
//! embedded in the loaded model. The two sources are never merged.

mod mapping;
mod panel;

pub use mapping::{ExpressionDefinition, ExpressionMapping};
pub use panel::{ExpressionControl, ExpressionPanel, NO_EXPRESSIONS_LABEL};
