pub mod auth;
pub mod interactions;
