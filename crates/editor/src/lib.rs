//! Client-side editing sessions for Atelier content.
//!
//! Each editor owns the working copy of one resource (a settings section,
//! an artwork gallery, the category registry), talks to the server through
//! a collaborator trait from [`backend`], and reports the outcome of every
//! persisted operation as exactly one [`notify::Notification`].
//!
//! [`http::HttpBackend`] implements all collaborator traits against the
//! `/api/v1` endpoints.

pub mod backend;
pub mod categories;
pub mod config;
pub mod error;
pub mod gallery;
pub mod http;
pub mod notify;
pub mod section;
