// Presentation layer - HTTP surface over dashboard sessions
pub mod app_state;
pub mod dto;
pub mod handlers;
