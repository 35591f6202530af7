//! Configuration module.
//!
//! Handles connection descriptors, environment variables, and settings.

mod descriptor;
mod settings;

pub use descriptor::{Descriptor, DescriptorError, DescriptorResult};
pub use settings::{expand_env_vars, Settings, SettingsError};
