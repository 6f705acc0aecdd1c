//! HTML rendering for the protected page.
//!
//! The gateway serves a single page; everything else redirects. Claim
//! values come from the identity provider and are escaped before they
//! reach the markup.

use axum::response::Html;

use gatehouse_access::UserInfo;

/// Renders the protected page with the session's identity claims.
#[must_use]
pub fn protected_page(userinfo: &UserInfo) -> Html<String> {
    let greeting = userinfo
        .name()
        .unwrap_or_else(|| userinfo.subject_or_unknown());
    let pretty =
        serde_json::to_string_pretty(userinfo.claims()).unwrap_or_else(|_| "{}".to_string());

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
  <head>
    <meta charset="utf-8">
    <title>Protected</title>
  </head>
  <body>
    <h1>Welcome, {greeting}</h1>
    <p>Email: {email}</p>
    <pre>{claims}</pre>
    <a href="/logout">Log out</a>
  </body>
</html>
"#,
        greeting = escape(greeting),
        email = escape(userinfo.email_or_unknown()),
        claims = escape(&pretty),
    ))
}

/// Escapes text for interpolation into HTML.
fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
