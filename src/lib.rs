//! Ingredient-aware dish recommendations
//!
//! Item-item collaborative filtering over a user × dish rating table,
//! filtered by the ingredients at hand and adapted after every selection.
//! Served over HTTP ([`api`]) or as a terminal session ([`cli`]).

pub mod api;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod services;
