use std::sync::Arc;
use std::time::Duration;

use http::Method;
use serde_json::json;
use webcontext_core::web::ExchangeWebContext;
use webcontext_core::{
    attach_sessions, ErrorKind, Exchange, ExchangeSessionStore, InMemorySessionManager,
    ServerCookie, SessionCookieConfig, SessionStore, WebContext,
};

fn exchange() -> Exchange {
    Exchange::new(
        Method::GET,
        "/".parse().unwrap(),
        "127.0.0.1:7000".parse().unwrap(),
    )
}

#[test]
fn context_without_sessions_still_serves_request_data() {
    let mut exchange = exchange();
    let mut ctx = ExchangeWebContext::new(&mut exchange);

    assert!(!ctx.session_store().is_available());
    assert_eq!(ctx.path(), "/");
    assert_eq!(
        ctx.session_attribute("x").unwrap_err().kind(),
        ErrorKind::SessionUnavailable
    );
    ctx.write_response_content("ok");
    assert!(ctx.exchange().is_committed());
}

#[test]
fn custom_cookie_name_is_honoured() {
    let sessions = Arc::new(InMemorySessionManager::new());
    let config = SessionCookieConfig {
        cookie_name: "SID".to_string(),
        secure: true,
        ..SessionCookieConfig::default()
    };

    let mut exchange = exchange();
    attach_sessions(&mut exchange, sessions, config);
    let id = ExchangeWebContext::new(&mut exchange)
        .session_identifier()
        .unwrap();

    let cookie = &exchange.response_cookies()["SID"];
    assert_eq!(cookie.value, id);
    assert!(cookie.secure);
    assert!(!exchange.response_cookies().contains_key("JSESSIONID"));
}

#[test]
fn expired_session_is_replaced() {
    let sessions = Arc::new(InMemorySessionManager::with_timeout(Duration::ZERO));

    let mut first = exchange();
    attach_sessions(&mut first, sessions.clone(), SessionCookieConfig::default());
    let old_id = ExchangeWebContext::new(&mut first)
        .session_identifier()
        .unwrap();

    let mut second = exchange();
    second.add_request_cookie(ServerCookie::new("JSESSIONID", old_id.clone()));
    attach_sessions(&mut second, sessions.clone(), SessionCookieConfig::default());
    let mut ctx = ExchangeWebContext::new(&mut second);

    assert_eq!(ctx.session_attribute("anything").unwrap(), None);
    let new_id = ctx.session_identifier().unwrap();
    assert_ne!(new_id, old_id);
}

#[test]
fn logout_invalidates_session() {
    let sessions = Arc::new(InMemorySessionManager::new());
    let mut exchange = exchange();
    attach_sessions(&mut exchange, sessions.clone(), SessionCookieConfig::default());

    let mut ctx = ExchangeWebContext::new(&mut exchange);
    ctx.set_session_attribute("profile", json!({"id": "alice"}))
        .unwrap();
    let store: ExchangeSessionStore = ctx.session_store().clone();
    assert!(store.invalidate(ctx.exchange_mut()).unwrap());

    assert_eq!(ctx.session_attribute("profile").unwrap(), None);
    assert_eq!(sessions.active_sessions(), 0);
    assert_eq!(ctx.exchange().response_cookies()["JSESSIONID"].max_age, Some(0));
}

#[test]
fn store_attached_after_context_creation_is_not_seen() {
    let mut exchange = exchange();
    let mut ctx = ExchangeWebContext::new(&mut exchange);
    attach_sessions(
        ctx.exchange_mut(),
        Arc::new(InMemorySessionManager::new()),
        SessionCookieConfig::default(),
    );

    assert!(ctx.session_identifier().is_err());
    assert!(ExchangeSessionStore::from_exchange(ctx.exchange()).is_available());
}

#[test]
fn flows_are_logged_with_request_id() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();

    let sessions = Arc::new(InMemorySessionManager::new());
    let request = http::Request::get("/")
        .header("x-request-id", "req-logged")
        .body("")
        .unwrap();
    let mut exchange = Exchange::from_request(request, "127.0.0.1:7001".parse().unwrap());
    attach_sessions(&mut exchange, sessions, SessionCookieConfig::default());

    assert_eq!(exchange.log().request_id(), "req-logged");
    let mut ctx = ExchangeWebContext::new(&mut exchange);
    ctx.session_identifier().unwrap();
    ctx.write_response_content("done");
}
