mod compiler;
mod constants;
mod intent;
mod try_from_js_value;

pub use intent::IntentNamespace;

// Re-export constants functions
pub use constants::*;
