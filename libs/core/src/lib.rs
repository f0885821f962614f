//! Core building blocks of the Frame.io → Slack relay.
//!
//! The crate owns everything the HTTP layer composes: typed configuration, the
//! OAuth access-token cache, the Frame.io project lookup, the inbound event
//! model, Slack message formatting and the outbound Slack webhook client.
pub mod clock;
pub mod config;
pub mod error;
pub mod event;
pub mod format;
pub mod frameio;
pub mod slack;
#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
pub mod token;

pub use clock::*;
pub use config::*;
pub use error::*;
pub use event::*;
pub use format::*;
pub use frameio::*;
pub use slack::*;
pub use token::*;
