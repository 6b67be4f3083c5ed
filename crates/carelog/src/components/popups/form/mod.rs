//! Dynamic medical form system.
//!
//! A form is assembled from three declarative inputs: an ordered list of
//! [`FieldDescriptor`]s (from the [`registry`]), the caller-owned runtime
//! option state ([`DynamicOptions`], [`LoadingStates`], [`SpecialtyCache`]),
//! and an optional record to edit. The pieces:
//!
//! - `field.rs`    : `FieldKind`, `FieldDescriptor` (declarative config)
//! - `value.rs`    : `FieldValue`, `FieldChange` (the normalized change event)
//! - `date.rs`     : strict `YYYY-MM-DD` handling + the end/start minimum rule
//! - `options.rs`  : option lists, filtering, the specialty cache
//! - `registry.rs` : per-entity field tables
//! - `layout.rs`   : row packing, breakpoints, modal sizing hints
//! - `state.rs`    : mutable per-modal `FormState`
//! - `popup.rs`    : `FormModal` (interaction, focus, submit)
//! - `render.rs`   : drawing, one arm per field kind

pub mod date;
pub mod field;
pub mod layout;
pub mod options;
pub mod popup;
pub mod registry;
pub mod render;
pub mod state;
pub mod value;

pub use field::{FieldDescriptor, FieldKind, TAG_LIMIT_DEFAULT};
pub use options::{DynamicOptions, LoadingStates, OptionItem, OptionsSource, SpecialtyCache};
pub use popup::FormModal;
pub use state::FormState;
pub use value::{FieldChange, FieldValue};
