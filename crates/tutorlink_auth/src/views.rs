//! Server-rendered pages: the index with its navbar and the login failure page.

use tutorlink_common::escape_html;

/// Navbar for the current login state. The email is the only user-supplied text.
pub fn render_navbar(email: Option<&str>) -> String {
    match email {
        Some(email) => format!(
            concat!(
                r#"<nav class="navbar">"#,
                r#"<a class="brand" href="/">Tutorlink</a>"#,
                r#"<span class="user">{}</span>"#,
                r#"<a href="/api/cart">Cart</a>"#,
                r#"<a href="/logout">Log out</a>"#,
                "</nav>"
            ),
            escape_html(email)
        ),
        None => concat!(
            r#"<nav class="navbar">"#,
            r#"<a class="brand" href="/">Tutorlink</a>"#,
            r#"<a href="/login">Log in</a>"#,
            "</nav>"
        )
        .to_string(),
    }
}

pub fn render_index(email: Option<&str>) -> String {
    page(
        "Tutorlink",
        &format!(
            "{}<main><h1>Find a tutor</h1><p>Browse open time slots and book a session.</p></main>",
            render_navbar(email)
        ),
    )
}

pub fn render_login_failed(reason: &str) -> String {
    page(
        "Login failed",
        &format!(
            r#"{}<main><h1>Login failed</h1><p>{}</p><p><a href="/login">Try again</a></p></main>"#,
            render_navbar(None),
            escape_html(reason)
        ),
    )
}

fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><title>{}</title></head><body>{}</body></html>",
        title, body
    )
}
