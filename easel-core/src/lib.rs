//! # Easel Core
//!
//! Core canvas logic for the Easel drawing backend: the typed element
//! model, the validation/sanitation layer applied to every creation
//! request, the stroke geometry encoder shared by all renderers, and
//! the in-memory session store.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                 easel-core                  │
//! ├──────────────────────┬──────────────────────┤
//! │  Element Model       │  Validator           │
//! │  - tagged kinds      │  - coercion          │
//! │  - z-order           │  - per-type checks   │
//! ├──────────────────────┼──────────────────────┤
//! │  Path Encoder        │  Session Store       │
//! │  - midpoint quads    │  - add/merge/remove  │
//! │  - padded bounds     │  - clear             │
//! └──────────────────────┴──────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod canvas;
pub mod element;
pub mod error;
pub mod path;
pub mod store;
pub mod validate;

pub use canvas::CanvasState;
pub use element::{DrawTool, Element, ElementId, ElementKind, FontWeight, ImageSource, Point};
pub use error::{CanvasError, CanvasResult};
pub use path::{PathCommand, StrokePath};
pub use store::SessionStore;
