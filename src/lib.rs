pub mod app;
pub mod autocomplete;
pub mod cli;
pub mod config;
pub mod i18n;
pub mod output;
pub mod service;
pub mod workflow;

#[cfg(test)]
mod tests;
