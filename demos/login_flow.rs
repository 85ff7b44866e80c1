//! Login flow demonstration.
//!
//! This example drives a form login through the web context:
//! 1. An anonymous request to a protected page is redirected to the login form
//! 2. Posted credentials are checked and a profile is stored in the session
//! 3. A follow-up request carrying the session cookie is let through
//!
//! Run with: `cargo run --example login_flow`

use std::net::SocketAddr;
use std::sync::Arc;

use http::header::{CONTENT_TYPE, COOKIE, SET_COOKIE};
use http::{Request, Response};
use serde_json::json;
use webcontext_core::web::ExchangeWebContext;
use webcontext_core::{
    attach_sessions, Cookie, Exchange, InMemorySessionManager, SessionCookieConfig, WebContext,
};

const REQUESTED_URL: &str = "requested_url";

fn client() -> SocketAddr {
    SocketAddr::from(([192, 0, 2, 10], 49152))
}

/// Collects `name=value` pairs from a response so the next request can send them back
fn cookies_from(response: &Response<String>) -> String {
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| v.split(';').next())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Protected page: anonymous callers are sent to the login form
fn protected_page<C: WebContext>(ctx: &mut C) -> Result<(), Box<dyn std::error::Error>> {
    match ctx.session_attribute("profile")? {
        Some(profile) => {
            ctx.set_response_content_type("application/json")?;
            ctx.write_response_content(&profile.to_string());
        }
        None => {
            let requested = ctx.full_request_url();
            ctx.add_response_cookie(&Cookie::new(REQUESTED_URL, requested).with_path("/"));
            ctx.set_response_status(302)?;
            ctx.set_response_header("Location", "/login")?;
        }
    }
    Ok(())
}

/// Login callback: checks the posted form and redirects back
fn login_callback<C: WebContext>(ctx: &mut C) -> Result<(), Box<dyn std::error::Error>> {
    let username = ctx.request_parameter("username");
    let password = ctx.request_parameter("password");

    match (username, password) {
        (Some(username), Some(password)) if password == "correct horse" => {
            ctx.set_session_attribute("profile", json!({ "id": username, "roles": ["user"] }))?;
            let back_to = ctx
                .request_cookies()
                .into_iter()
                .find(|c| c.name() == REQUESTED_URL)
                .map(|c| c.value().to_string())
                .unwrap_or_else(|| "/".to_string());
            ctx.add_response_cookie(&Cookie::new(REQUESTED_URL, "").with_max_age(0));
            ctx.set_response_status(302)?;
            ctx.set_response_header("Location", &back_to)?;
        }
        _ => {
            ctx.set_response_status(401)?;
            ctx.set_response_content_type("text/plain")?;
            ctx.write_response_content("invalid credentials");
        }
    }
    Ok(())
}

fn serve<F>(
    request: Request<String>,
    sessions: &Arc<InMemorySessionManager>,
    handler: F,
) -> Result<Response<String>, Box<dyn std::error::Error>>
where
    F: FnOnce(&mut ExchangeWebContext<'_>) -> Result<(), Box<dyn std::error::Error>>,
{
    let mut exchange = Exchange::from_request(request, client());
    attach_sessions(&mut exchange, sessions.clone(), SessionCookieConfig::default());

    println!("\n=== {} {} ===", exchange.request_method(), exchange.request_url());
    println!("   Request ID: {}", exchange.request_id());

    handler(&mut ExchangeWebContext::new(&mut exchange))?;

    let response = exchange.into_response();
    println!("   Status: {}", response.status());
    for (name, value) in response.headers() {
        println!("   {}: {}", name, value.to_str().unwrap_or("<binary>"));
    }
    if !response.body().is_empty() {
        println!("   Body: {}", response.body());
    }
    Ok(response)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Login Flow Demonstration");
    println!("========================");

    let sessions = Arc::new(InMemorySessionManager::new());

    // Step 1: anonymous access
    let first = serve(
        Request::get("http://app.example.com/account?tab=keys").body(String::new())?,
        &sessions,
        |ctx| protected_page(ctx),
    )?;

    // Step 2: wrong password
    serve(
        Request::post("http://app.example.com/login")
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body("username=alice&password=hunter2".to_string())?,
        &sessions,
        |ctx| login_callback(ctx),
    )?;

    // Step 3: correct password
    let second = serve(
        Request::post("http://app.example.com/login")
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .header(COOKIE, cookies_from(&first))
            .body("username=alice&password=correct+horse".to_string())?,
        &sessions,
        |ctx| login_callback(ctx),
    )?;

    // Step 4: back to the protected page with the session cookie
    serve(
        Request::get("http://app.example.com/account?tab=keys")
            .header(COOKIE, cookies_from(&second))
            .body(String::new())?,
        &sessions,
        |ctx| protected_page(ctx),
    )?;

    println!("\nActive sessions: {}", sessions.active_sessions());
    Ok(())
}
