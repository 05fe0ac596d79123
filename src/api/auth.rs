//! OAuth login trigger
//!
//! The hosted auth provider handles the actual flow; this route only builds
//! the authorize URL and redirects, with the fixed callback path appended.

use crate::config::Config;
use axum::response::Redirect;
use di_axum::Inject;

const CALLBACK_PATH: &str = "/auth/callback";

pub async fn login(Inject(config): Inject<Config>) -> Redirect {
    let redirect_to = format!("{}{}", config.public_url, CALLBACK_PATH);
    Redirect::to(&format!(
        "{}?redirect_to={redirect_to}",
        config.auth_url
    ))
}
