//! Adapters for external services

pub mod mandrill;
