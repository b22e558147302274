//! Preference lists with ties

mod agent;

pub use agent::{Agent, PreferenceError};
