pub mod client;
pub mod config;
pub mod error;
pub mod events;
pub mod layout;
pub mod logging;
pub mod models;
pub mod output;
pub mod polling;
pub mod state;
