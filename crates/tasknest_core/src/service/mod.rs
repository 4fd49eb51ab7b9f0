//! Use-case orchestration over the domain model.
//!
//! # Responsibility
//! - Mediate every state change between callers and the entity layer.
//! - Keep rendering layers decoupled from storage details.

pub mod app_controller;
