//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate store access into use-case level task operations.
//! - Keep interface layers decoupled from storage details.

pub mod task_service;
