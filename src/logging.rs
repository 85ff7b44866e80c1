use std::fmt;

use http::Method;
use tracing::Span;

/// Builds the span every event about one exchange is recorded under.
pub(crate) fn exchange_span(request_id: &str, method: &Method, path: &str) -> Span {
    tracing::info_span!(
        "exchange",
        request_id = %request_id,
        method = %method,
        path = %path,
    )
}

/// Request-scoped logging for an [`Exchange`](crate::Exchange).
///
/// Each exchange owns an `exchange` span holding its request ID, method and
/// path. Events logged here are emitted inside that span, so subscribers see
/// the request fields on every line without the call sites repeating them.
/// Hosts that want their own events tagged the same way can enter
/// [`Exchange::span`](crate::Exchange::span) directly.
///
/// ```
/// # use webcontext_core::Exchange;
/// # let exchange = Exchange::new(http::Method::GET, "/".parse().unwrap(), "127.0.0.1:5000".parse().unwrap());
/// let log = exchange.log();
/// log.info(format_args!("handling {}", exchange.request_path()));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ExchangeLog<'a> {
    request_id: &'a str,
    span: &'a Span,
}

impl<'a> ExchangeLog<'a> {
    pub(crate) fn new(request_id: &'a str, span: &'a Span) -> Self {
        Self { request_id, span }
    }

    /// Returns the request ID of the exchange.
    pub fn request_id(&self) -> &str {
        self.request_id
    }

    /// Returns the exchange span events are recorded under.
    pub fn span(&self) -> &Span {
        self.span
    }

    /// Emits an info-level event inside the exchange span.
    pub fn info(&self, args: fmt::Arguments<'_>) {
        self.span.in_scope(|| tracing::info!("{}", args));
    }

    /// Emits a warn-level event inside the exchange span.
    pub fn warn(&self, args: fmt::Arguments<'_>) {
        self.span.in_scope(|| tracing::warn!("{}", args));
    }

    /// Emits an error-level event inside the exchange span.
    pub fn error(&self, args: fmt::Arguments<'_>) {
        self.span.in_scope(|| tracing::error!("{}", args));
    }

    /// Emits a debug-level event inside the exchange span.
    pub fn debug(&self, args: fmt::Arguments<'_>) {
        self.span.in_scope(|| tracing::debug!("{}", args));
    }
}
