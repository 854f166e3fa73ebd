pub mod client;
pub mod control;

pub use control::StabilitySketchClient;

pub(crate) const CONTROL_SKETCH_PATH: &str = "/v2beta/stable-image/control/sketch";
