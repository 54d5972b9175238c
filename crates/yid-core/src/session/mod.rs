//! Session domain module.
//!
//! # Module Structure
//!
//! - `model`: session state (`Session`) and the profile records it carries
//! - `store`: the single-writer `SessionStore`
//!
//! # Usage
//!
//! ```ignore
//! use yid_core::session::{Session, SessionStore, User, UserContract};
//! ```

mod model;
mod store;

// Re-export public API
pub use model::{Session, User, UserContract};
pub use store::SessionStore;
