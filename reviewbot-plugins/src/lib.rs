//! Checker plugin registry: the capability set, the three built-in
//! checkers, and a manifest-driven host that selects and configures them.

pub mod builtin;
pub mod checker;
pub mod errors;
pub mod host;
pub mod types;

pub use checker::Checker;
pub use errors::{Error, PluginResult};
pub use host::PluginHost;
pub use types::{Comment, Passback, ReviewView};
