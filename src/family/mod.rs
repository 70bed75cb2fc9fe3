//! Families and the directed relationship graph between their members.

pub mod dto;
pub mod handlers;
pub mod repo;
pub mod repo_types;
pub mod services;
