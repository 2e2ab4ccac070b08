//! Review thread client for the rental listing marketplace.
//!
//! [`reviews::ReviewThreadStore`] keeps the review/reply forest of one
//! listing in memory and reconciles with the server by re-fetching the whole
//! forest after every successful mutation.

pub mod config;
pub mod error;
pub mod listings;
pub mod media;
pub mod reviews;
pub mod session;
pub mod validation;

pub use config::{ClientConfig, ConfigError};
pub use error::ReviewError;
pub use reviews::{HttpReviewApi, ReviewApi, ReviewThreadStore, ThreadState};
pub use session::{Session, SessionFile};
