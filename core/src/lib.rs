pub mod datetime;
pub mod error;
pub mod message;
pub mod payload;
pub mod render;
pub mod session;
