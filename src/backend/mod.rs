/// Everything that talks to the generator backend
///
/// - `client.rs` - async REST client, one method per endpoint
/// - `types.rs` - JSON request/response bodies
/// - `frames.rs` - spin-frame population of view caches
/// - `process.rs` - launching and stopping the backend executable

pub mod client;
pub mod frames;
pub mod process;
pub mod types;

pub use client::BackendClient;
pub use process::BackendProcess;
