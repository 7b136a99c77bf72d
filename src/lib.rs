//! Library crate for fourline-back, exposing modules for the binary and
//! integration tests.

pub mod config;
pub mod dao;
pub mod dto;
pub mod engine;
pub mod error;
pub mod events;
pub mod routes;
pub mod services;
pub mod state;
