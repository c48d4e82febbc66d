pub mod executor;
pub mod factory;
pub mod provider;
pub mod publisher;
pub mod sink;
