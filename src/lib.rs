//! Sketch-to-realistic-image service
//!
//! Serves a drawing page; each submitted sketch is described by a vision model
//! and then re-rendered by an image model in the chosen style.

pub mod ai;
pub mod app;
pub mod error;
pub mod models;
pub mod prompts;
pub mod sketch;
pub mod web;

pub use error::{Error, Result};
