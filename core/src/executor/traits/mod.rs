pub mod executor;
pub mod provider;
pub mod publisher;
pub mod sink;
pub mod synthesizer;

pub use executor::*;
pub use provider::*;
pub use publisher::*;
pub use sink::*;
pub use synthesizer::*;
