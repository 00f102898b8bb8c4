//! HTTP request handlers for the PersonaChat proxy

pub mod chat;
pub mod health;
