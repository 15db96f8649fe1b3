//! One-time user feedback carried across a redirect in a short-lived
//! cookie. The cookie stores a message key; the next rendered page resolves
//! it to its text and clears the cookie.

use actix_web::http::{header, Cookie};
// HttpMessage provides `HttpRequest::cookie`.
use actix_web::{HttpMessage, HttpRequest, HttpResponse};

pub const COOKIE_NAME: &str = "flash";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flash {
    InvalidInput,
    ItemCreated,
    ItemUpdated,
    ItemDeleted,
    LoginSuccess,
    BadCredentials,
    Goodbye,
    SettingsUpdated,
}

impl Flash {
    fn key(self) -> &'static str {
        match self {
            Flash::InvalidInput => "invalid-input",
            Flash::ItemCreated => "item-created",
            Flash::ItemUpdated => "item-updated",
            Flash::ItemDeleted => "item-deleted",
            Flash::LoginSuccess => "login-success",
            Flash::BadCredentials => "bad-credentials",
            Flash::Goodbye => "goodbye",
            Flash::SettingsUpdated => "settings-updated",
        }
    }

    fn from_key(key: &str) -> Option<Flash> {
        match key {
            "invalid-input" => Some(Flash::InvalidInput),
            "item-created" => Some(Flash::ItemCreated),
            "item-updated" => Some(Flash::ItemUpdated),
            "item-deleted" => Some(Flash::ItemDeleted),
            "login-success" => Some(Flash::LoginSuccess),
            "bad-credentials" => Some(Flash::BadCredentials),
            "goodbye" => Some(Flash::Goodbye),
            "settings-updated" => Some(Flash::SettingsUpdated),
            _ => None,
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            Flash::InvalidInput => "Invalid input.",
            Flash::ItemCreated => "Item created.",
            Flash::ItemUpdated => "Item updated.",
            Flash::ItemDeleted => "Item deleted.",
            Flash::LoginSuccess => "Login success.",
            Flash::BadCredentials => "Invalid username or password.",
            Flash::Goodbye => "Goodbye.",
            Flash::SettingsUpdated => "Settings updated.",
        }
    }
}

/// Redirect carrying a flash message for the next page view.
pub fn redirect(location: &str, flash: Flash) -> HttpResponse {
    HttpResponse::Found()
        .header(header::LOCATION, location)
        .cookie(Cookie::build(COOKIE_NAME, flash.key()).path("/").finish())
        .finish()
}

/// Redirect without feedback, e.g. bouncing an unauthenticated caller.
pub fn redirect_silent(location: &str) -> HttpResponse {
    HttpResponse::Found()
        .header(header::LOCATION, location)
        .finish()
}

/// The pending flash message of the request, if any. The caller is expected
/// to clear the cookie on the response it renders, see `clear`.
pub fn peek(req: &HttpRequest) -> Option<Flash> {
    req.cookie(COOKIE_NAME)
        .and_then(|cookie| Flash::from_key(cookie.value()))
}

/// A removal cookie matching the one `redirect` sets.
pub fn clear() -> Cookie<'static> {
    Cookie::build(COOKIE_NAME, "").path("/").finish()
}
