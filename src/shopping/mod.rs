//! Shopping lists shared within families and their items.

pub mod dto;
pub mod handlers;
pub mod query;
pub mod repo;
pub mod repo_types;
pub mod services;

pub use handlers::router;
