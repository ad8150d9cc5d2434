//! Command handlers for the dqix CLI

pub mod configure;
pub mod grant;
pub mod inspect;
pub mod layout;
pub mod watch;
