//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate engine, API client and preference store into session-level
//!   use cases.
//! - Keep the CLI decoupled from transport and storage details.

pub mod checklist_service;
