//! Live map engine for the agricultural robot fleet dashboard.
//!
//! This crate is compiled to WebAssembly and runs in the browser. It owns the
//! map view end to end: projecting robot, mission and field coordinates onto
//! a 2D canvas, drawing the layered scene, resolving pointer clicks back into
//! robots, and tracking the selection/popup lifecycle. The host page supplies
//! fleet snapshots and reacts to the [`engine::Action`]s the engine emits.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Top-level engine and testable [`engine::EngineCore`] |
//! | [`web`] | Browser wrapper owning the canvas handle and click listener |
//! | [`fleet`] | Robot, mission and field snapshot types |
//! | [`geo`] | Geographic points, viewport, and the local projection |
//! | [`render`] | Layered scene rendering |
//! | [`surface`] | Drawing surface trait, canvas and recording backends |
//! | [`hit`] | Hit-testing pointer positions against robot markers |
//! | [`selection`] | Selection and popup state machine |
//! | [`scheduler`] | Redraw decisions and coalescing |
//! | [`config`] | Map settings parsed from the environment |
//! | [`error`] | Error type shared by every module |
//! | [`consts`] | Visual constants (radii, colors, tolerances) |

pub mod config;
pub mod consts;
pub mod engine;
pub mod error;
pub mod fleet;
pub mod geo;
pub mod hit;
pub mod render;
pub mod scheduler;
pub mod selection;
pub mod surface;
pub mod web;

pub use error::MapError;
