//! Authentication module for managing the user session.
//!
//! This module provides:
//! - `Session`: the token and username issued at login or signup
//! - `SessionManager`: the single owner of the session, responsible for
//!   persistence, header attachment and invalidation on 401
//!
//! There is no client-side expiry; a session ends on logout or when the
//! server rejects its token.

pub mod session;

pub use session::{Session, SessionManager, SessionState};
