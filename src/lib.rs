//! Market intelligence document pipeline.
//!
//! Ingests financial and technology reports, extracts structured metrics,
//! evaluates alerting rules and generates narrative analyses through an
//! external analyzer, with idempotent persistence and per-report background
//! processing. The HTTP surface, authentication and presentation layers are
//! external collaborators and live outside this crate.

pub mod config;
pub mod db;
pub mod entity;
pub mod error;
pub mod migration;
pub mod models;
pub mod services;
