//! Food inventory: compartment listings with expiry annotation and food/category writes.

pub mod dto;
pub mod expiry;
pub mod filter;
pub mod handlers;
pub mod repo;
pub mod repo_types;
pub mod services;

pub use handlers::router;
