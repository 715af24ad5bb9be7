//! HTTP surface: server-rendered pages, HTMX partials, and the JSON API.

pub mod api;
pub mod error;
pub mod html;
pub mod pages;

pub use error::ApiError;
