pub mod api;
pub mod client;

pub use client::JellyfinServer;
