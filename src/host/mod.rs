//! Tool invocation surface and the JSON stdio command channel.

pub mod contract;
pub mod handler;
pub mod stdio;
pub mod tool;

pub use contract::{CommandEnvelope, CommandName, ResponseEnvelope};
pub use handler::HostHandler;
pub use tool::{GatherContextTool, Tool, ToolOutcome, ToolRegistry};
