//! Manifest model, file formats, and lint validation.
pub mod manifest;
pub mod module;
pub mod validation;

pub use manifest::Manifest;
pub use module::Module;
