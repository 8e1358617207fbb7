//! event-forms: authoring model and backend client for event application
//! and review forms

pub mod app;
pub mod backend;
pub mod config;
pub mod error;
pub mod reconcile;
pub mod render;
pub mod state;
