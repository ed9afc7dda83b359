pub mod app;
pub mod chat;
pub mod config;
pub mod handler;
pub mod sidebar;
pub mod tui;
pub mod ui;

// Re-export main types for convenience
pub use app::{App, ChatMessage, ChatRole};
pub use chat::ChatClient;
pub use config::Config;
pub use sidebar::{course_sidebar, SidebarItem};
