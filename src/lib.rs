pub mod config;
pub mod fetch;
pub mod parse;
pub mod present;
pub mod server;
