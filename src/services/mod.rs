//! Business logic services
//!
//! Services sit between the HTTP handlers and the repositories:
//! - `password`: one-way credential hashing
//! - `auth`: signup, login, logout and session validation
//! - `paint`: the composite save-model workflows

pub mod auth;
pub mod paint;
pub mod password;

pub use auth::{AuthError, AuthService, LoginInput, SignupInput};
pub use paint::{PaintError, PaintService, PaintSpec, Repaint, SaveModelInput};
