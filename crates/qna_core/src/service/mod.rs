//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate domain rules and repository calls into use-case level APIs.
//! - Keep callers decoupled from storage details.

pub mod question_service;
pub mod user_service;
