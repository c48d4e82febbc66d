pub mod command;
pub mod echo;

pub use command::CommandExecutor;
pub use echo::EchoExecutor;
