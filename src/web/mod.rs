//! Server binding for the web context.
//!
//! This module is the boundary between the native [`Exchange`](crate::Exchange)
//! and authentication code written against [`WebContext`](crate::WebContext).
//! It handles:
//! - Reading request data (parameters, headers, cookies, connection metadata)
//! - Applying response mutations (status, headers, cookies, body)
//! - Routing session operations to the session manager attached to the exchange
//! - Cookie conversion between [`Cookie`](crate::Cookie) and
//!   [`ServerCookie`](crate::ServerCookie)
//!
//! # Design Principles
//!
//! 1. **Borrowed Exchange**: The context holds `&mut Exchange` for one request.
//!    It never outlives the exchange and cannot be shared between threads
//!    handling different requests.
//!
//! 2. **Absent, Not Failed**: Missing request data comes back as `None`.
//!
//! 3. **No Session Semantics Here**: Session lifetime, ID generation and
//!    expiry belong to the [`SessionManager`](crate::SessionManager).
//!
//! # Integration Model
//!
//! A hosting server should, per request:
//! 1. Build an `Exchange` from the incoming `http::Request`
//! 2. Attach the shared session manager and config with
//!    [`attach_sessions`](crate::attach_sessions)
//! 3. Wrap the exchange in an [`ExchangeWebContext`] and hand it to
//!    authentication code
//! 4. Convert the exchange into an `http::Response` once handling completes
//!
//! # Example Flow
//!
//! ```
//! use std::sync::Arc;
//! use webcontext_core::web::ExchangeWebContext;
//! use webcontext_core::{
//!     attach_sessions, Cookie, Exchange, InMemorySessionManager, SessionCookieConfig,
//!     WebContext,
//! };
//!
//! let sessions = Arc::new(InMemorySessionManager::new());
//!
//! // 1. Build the exchange
//! let request = http::Request::get("/profile").body("").unwrap();
//! let mut exchange = Exchange::from_request(request, "127.0.0.1:8000".parse().unwrap());
//!
//! // 2. Attach sessions
//! attach_sessions(&mut exchange, sessions.clone(), SessionCookieConfig::default());
//!
//! // 3. Authentication code sees only the WebContext
//! {
//!     let mut ctx = ExchangeWebContext::new(&mut exchange);
//!     if ctx.session_attribute("profile").unwrap().is_none() {
//!         let requested = ctx.path().to_string();
//!         ctx.add_response_cookie(&Cookie::new("requested_url", requested));
//!         ctx.set_response_status(401).unwrap();
//!     }
//! }
//!
//! // 4. Produce the response
//! let response = exchange.into_response();
//! assert_eq!(response.status(), 401);
//! ```

mod adapter;

pub use adapter::ExchangeWebContext;
