//! Newsroom - a small news site with moderated comments
//!
//! This library provides the core functionality of the Newsroom site.

pub mod api;
pub mod config;
pub mod db;
pub mod forms;
pub mod models;
pub mod services;
pub mod templates;
