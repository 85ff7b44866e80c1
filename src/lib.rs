//! Framework-agnostic web context over a native HTTP exchange.
//!
//! Authentication frameworks need the same handful of things from every web
//! server: request parameters, headers and cookies, a place to write the
//! response, and a session. This crate provides:
//! - **[`WebContext`]**: the capability trait authentication code is written against
//! - **[`Exchange`]**: the native request/response state of one HTTP call
//! - **[`ExchangeWebContext`](web::ExchangeWebContext)**: the binding of one to the other
//! - **Sessions**: a cookie-keyed [`SessionManager`] with an in-memory implementation
//!
//! # Core Types
//!
//! - [`Cookie`]: Framework-agnostic cookie with all of its attributes
//! - [`ServerCookie`]: The exchange's native cookie
//! - [`FormData`]: Parsed form fields attached to an exchange
//! - [`SessionCookieConfig`]: Session cookie settings
//! - [`Error`]: Failure to represent an input on the exchange
//!
//! # Examples
//!
//! ```
//! use webcontext_core::web::ExchangeWebContext;
//! use webcontext_core::{Exchange, WebContext};
//!
//! let request = http::Request::get("https://example.com/login?force=true")
//!     .header("user-agent", "demo")
//!     .body("")
//!     .unwrap();
//! let mut exchange = Exchange::from_request(request, "127.0.0.1:5000".parse().unwrap());
//!
//! let mut ctx = ExchangeWebContext::new(&mut exchange);
//! assert_eq!(ctx.request_parameter("force").as_deref(), Some("true"));
//! assert_eq!(ctx.request_header("User-Agent").as_deref(), Some("demo"));
//! assert_eq!(ctx.full_request_url(), "https://example.com/login?force=true");
//!
//! ctx.set_response_content_type("text/html").unwrap();
//! ctx.write_response_content("<form>...</form>");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod context;
mod cookie;
mod error;
pub mod exchange;
mod logging;
pub mod serialization;
pub mod session;
pub mod web;

pub use context::WebContext;
pub use cookie::Cookie;
pub use error::{Error, ErrorKind};
pub use exchange::{Exchange, FormData, ServerCookie};
pub use logging::ExchangeLog;
pub use session::{
    attach_sessions, ExchangeSessionStore, InMemorySessionManager, Session, SessionCookieConfig,
    SessionManager, SessionStore,
};
