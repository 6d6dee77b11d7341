// rest_api/src/handlers/mod.rs

pub mod chat;
pub mod doctor;
pub mod feeds;
pub mod patient;
pub mod session;
