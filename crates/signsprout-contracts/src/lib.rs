pub mod chat;
pub mod domain;
pub mod error;
pub mod events;
pub mod fallback;
pub mod models;
pub mod outcome;
pub mod schema;
