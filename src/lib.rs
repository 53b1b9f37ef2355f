//! This is the library of the GitHub to chat room reporting bot.
pub mod bot;
pub mod chat;
pub mod config;
pub mod github;
pub mod templates;
pub mod utils;

#[cfg(test)]
mod tests;
