//! CLI command implementations

pub mod generate;
pub mod json_output;
pub mod offset;
pub mod pose;
pub mod sample;
pub mod validate;
pub mod weights;
