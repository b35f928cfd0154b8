pub mod server;
pub mod tools;

pub use server::{start_mcp_server, TrackerServer};
