//! MCP module — exposes the save operation to AI clients over stdio.
//!
//! ```text
//! ┌──────────────────────┐   JSON-RPC lines   ┌──────────────────────┐
//! │  MCP client (host)   │ ─────────────────▶ │  text-saver-mcp      │
//! │                      │ ◀───────────────── │  tools/call save_text│
//! └──────────────────────┘      stdout        └──────────┬───────────┘
//!                                                        │
//!                                                        ▼
//!                                              storage root / *.txt
//! ```

pub mod protocol;
pub mod server;
pub mod tools;
pub mod types;

pub use server::{shutdown_signal, McpServer, SERVER_NAME};
pub use tools::{call_tool, list_tools, SAVE_TEXT_TOOL};
pub use types::{ToolDefinition, ToolsCallResult};
