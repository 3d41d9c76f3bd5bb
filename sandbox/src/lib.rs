//! Sandbox eKYC provider.
//!
//! Serves the two endpoints the handshake consumes, backed by an in-memory
//! session table, plus control endpoints that script a session's outcome:
//!
//! | method | path | |
//! |---|---|---|
//! | `POST` | `/ekyc/session` | create a session |
//! | `GET` | `/ekyc/session/{id}/status` | poll a session |
//! | `POST` | `/ekyc/session/{id}/verify` | complete with an identity |
//! | `POST` | `/ekyc/session/{id}/fail` | fail with a reason |
//! | `GET` | `/verify/{id}` | provider page opened in the popup |

pub mod config;
pub mod error;
pub mod server;
pub mod sessions;

pub use config::SandboxConfig;
pub use error::SandboxError;
pub use server::{router, SandboxServer};
pub use sessions::SessionTable;
