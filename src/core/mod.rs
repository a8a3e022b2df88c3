pub mod realtime;
pub mod tools;

// Re-export commonly used types for convenience
pub use realtime::{
    ClientEvent, OpenAIConnectConfig, OpenAIRealtimeChannel, RealtimeError, RealtimeResult,
    ServerEvent, UpstreamChannel,
};

pub use tools::{CanvasTool, ToolCatalog, load_tool_schema};
