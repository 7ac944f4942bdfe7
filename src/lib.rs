//! Lead Validation API Library
//!
//! This library provides the core functionality for the lead validation
//! service: transcribing recorded insurance sales calls, verifying caller
//! identity against the Melissa contact-verification service, extracting
//! structured lead data with an LLM, reconciling the two sources, and
//! classifying the lead for downstream review.
//!
//! # Modules
//!
//! - `config`: Configuration management.
//! - `db`: Database connection and pool management.
//! - `db_storage`: Validation result storage operations.
//! - `errors`: Error handling types.
//! - `handlers`: HTTP request handlers and shared state.
//! - `models`: Core data models.
//! - `prompts`: LLM prompt contract.
//! - `reconcile`: Reconciliation and classification pipeline.
//! - `services`: External service clients (Deepgram, Melissa, OpenAI).
//! - `transcript`: Spelled-name normalization and rule-based extraction.
//! - `validation`: Per-recording orchestration workflow.

pub mod config;
pub mod db;
pub mod db_storage;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod prompts;
pub mod reconcile;
pub mod services;
pub mod transcript;
pub mod validation;
