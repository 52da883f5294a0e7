//! GPU priority server library.
//!
//! Researchers submit requests for temporary elevated scheduling priority on the GPU
//! cluster; administrators accept or refuse them and receive the SLURM commands that
//! grant the priority. This crate holds the request lifecycle, the command generator,
//! persistence and the HTTP API.

pub mod api;
pub mod auth;
pub mod clock;
pub mod config;
pub mod db;
pub mod entity;
pub mod error;
pub mod middleware;
pub mod migration;
pub mod models;
pub mod services;
pub mod store;
