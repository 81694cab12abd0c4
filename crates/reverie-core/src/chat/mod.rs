//! The prompt-assembly and streaming-completion pipeline.

pub mod composer;
pub mod keywords;
pub mod retrieval;
pub mod session;
pub mod settings;

pub use composer::compose;
pub use session::{ChatEngine, PreparedGeneration, SessionEvent};
pub use settings::load_generation_settings;
