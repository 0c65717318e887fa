//! The sell wizard: field schema, validation, navigation and rendering.
//!
//! Everything here is synchronous and free of I/O. Transport, session
//! storage and ad persistence live in `channels`, `store` and `bot`.

pub mod choice;
pub mod engine;
pub mod event;
pub mod field;
pub mod keyboard;
pub mod navigation;
pub mod photos;
pub mod render;
pub mod session;
pub mod submission;
pub mod validate;
pub mod value;

pub use choice::{AdKind, Currency, TagCategory};
pub use engine::{Outcome, Screen, Wizard};
pub use event::{Action, InboundEvent, MediaContent};
pub use field::FieldName;
pub use keyboard::{Button, Keyboard};
pub use navigation::NavAction;
pub use render::DisplayText;
pub use session::FormSession;
pub use submission::AdSubmission;
pub use validate::{ValidationError, ValidationReason, Validators};
pub use value::{Money, Phone, PhotoRef, Value};
