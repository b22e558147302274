//! Stable matchings with ties and incomplete lists.
//!
//! An [`Instance`] holds two sides of [`Agent`]s with tied, possibly partial
//! preference lists. [`preprocess`] shrinks those lists without changing the
//! set of maximum stable matchings, and [`StabilityModel`] finds or enumerates
//! maximum stable matchings through an integer program.

pub mod encode;
pub mod instance;
pub mod io;
pub mod matching;
pub mod model;
pub mod preferences;
pub mod preprocess;

/// Agent identifier, unique within one side
pub type AgentId = u32;

pub use instance::{GeneratorConfig, Instance, InstanceError};
pub use matching::Matching;
pub use model::{ModelConfig, ModelError, StabilityFormulation, StabilityModel};
pub use preferences::{Agent, PreferenceError};
pub use preprocess::{PreprocessMode, PreprocessReport, preprocess};
