//! adpost: a Telegram classified-ads bot built around a multi-step form.

pub mod bot;
pub mod channels;
pub mod config;
pub mod error;
pub mod store;
pub mod wizard;
