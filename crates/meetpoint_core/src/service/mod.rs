//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate schedule and repository calls into lifecycle APIs.
//! - Keep presentation layers decoupled from storage details.

pub mod meeting_service;
