//! Paintbox - a session-authenticated backend for painting 3D models
//!
//! This library provides the core functionality of the Paintbox service:
//! account and session management, CRUD over the painting schema (models,
//! colors, painted model associations) and the composite save-model
//! workflow.

pub mod api;
pub mod config;
pub mod db;
pub mod models;
pub mod services;
