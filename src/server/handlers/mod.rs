//! HTTP request handlers for the web server.

mod download;
mod pages;
mod socket;
mod static_files;

// Re-export handlers for use by the router
pub use download::download;
pub use pages::{index, upload};
pub use socket::ws_handler;
pub use static_files::{serve_css, serve_js};
