pub mod backend;
pub mod commands;
pub mod config;
pub mod controller;
pub mod session;
pub mod store;
pub mod util;
pub mod view;
