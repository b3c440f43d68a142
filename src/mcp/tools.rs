//! MCP tool implementations — maps tool calls to the save operation.

use serde_json::{json, Value};

use super::types::{ToolDefinition, ToolsCallResult};
use crate::config::SaverConfig;
use crate::save::{save, SaveRequest, SaveResult};

/// Name the save tool is registered under.
pub const SAVE_TEXT_TOOL: &str = "save_text";

/// Return the list of all available tools with their JSON schemas.
pub fn list_tools() -> Vec<ToolDefinition> {
    vec![ToolDefinition {
        name: SAVE_TEXT_TOOL.to_string(),
        description: "Save text to a local .txt file. If no filename is given, a \
            timestamped name (YYYY-MM-DD-HH-MM-SS.txt) is used. Unsafe filenames \
            are sanitized, and files are always written inside the configured \
            storage directory. Existing files with the same name are overwritten."
            .to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "text": {
                    "type": "string",
                    "description": "Text content to save (UTF-8, at most 10 MiB)"
                },
                "filename": {
                    "type": "string",
                    "description": "Optional file name (e.g., 'notes' or 'notes.txt'). \
                        '.txt' is appended if missing."
                }
            },
            "required": ["text"]
        }),
    }]
}

/// Dispatch a tool call to the appropriate handler.
pub fn call_tool(config: &SaverConfig, name: &str, arguments: &Value) -> ToolsCallResult {
    match name {
        SAVE_TEXT_TOOL => handle_save_text(config, arguments),
        _ => ToolsCallResult::error(format!("Unknown tool: {}", name)),
    }
}

fn handle_save_text(config: &SaverConfig, args: &Value) -> ToolsCallResult {
    let result = match SaveRequest::from_arguments(args) {
        Ok(request) => save(config, &request),
        Err(e) => {
            tracing::warn!(error = %e, "invalid save_text arguments");
            SaveResult::from(&e)
        }
    };
    to_call_result(&result)
}

fn to_call_result(result: &SaveResult) -> ToolsCallResult {
    let json = serde_json::to_string_pretty(result).unwrap_or_default();
    if result.is_success() {
        ToolsCallResult::text(json)
    } else {
        ToolsCallResult::error(json)
    }
}
