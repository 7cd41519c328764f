pub mod app;
pub mod auth;
pub mod cache;
pub mod config;
pub mod state;
pub mod users;

#[cfg(test)]
mod testing;
