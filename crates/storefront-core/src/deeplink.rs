//! # Deep Links
//!
//! Maps `jualpc://` URLs to in-app routes.
//!
//! ## Routing Table
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  URL                          Route                                     │
//! │  ───────────────────────────  ─────────────────────────────────────     │
//! │  jualpc://                    Home                                      │
//! │  jualpc://home                Home                                      │
//! │  jualpc://utama               Home                                      │
//! │  jualpc://produk/123          ProductDetail(123)                        │
//! │  jualpc://produk?id=123       ProductDetail(123)                        │
//! │  jualpc://anything-else       Home                                      │
//! │  not a jualpc:// URL          Login (safe fallback)                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Whether the user is logged in is not decided here; the application
//! context defers links until login.

use url::Url;

use crate::error::{CoreError, CoreResult};
use crate::types::ProductId;

/// URL scheme registered by the app.
pub const SCHEME: &str = "jualpc";

/// An in-app destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Product list.
    Home,

    /// Detail screen for one product.
    ProductDetail(ProductId),

    /// Login screen.
    Login,
}

impl Route {
    /// Screen path for the route.
    pub fn path(&self) -> String {
        match self {
            Route::Home => "/utama/home".to_string(),
            Route::ProductDetail(id) => format!("/utama/detail/{}", id),
            Route::Login => "/login".to_string(),
        }
    }
}

/// Parses a deep link into a route.
///
/// ## Errors
/// `CoreError::InvalidLink` if the URL does not parse or uses another
/// scheme.
pub fn parse_deep_link(link: &str) -> CoreResult<Route> {
    let url = Url::parse(link.trim()).map_err(|e| CoreError::InvalidLink {
        url: link.to_string(),
        reason: e.to_string(),
    })?;

    if url.scheme() != SCHEME {
        return Err(CoreError::InvalidLink {
            url: link.to_string(),
            reason: format!("expected {}:// scheme, got {}://", SCHEME, url.scheme()),
        });
    }

    // `jualpc://produk/123` puts "produk" in the host slot.
    let joined = format!("{}{}", url.host_str().unwrap_or(""), url.path());
    let path = joined.trim_matches('/');

    if path.is_empty() || path == "home" || path == "utama" || path == "utama/home" {
        return Ok(Route::Home);
    }

    if let Some(rest) = path.strip_prefix("produk/") {
        let id = rest.split('/').next().unwrap_or("");
        if !id.is_empty() {
            return Ok(Route::ProductDetail(parse_id(id)));
        }
    }

    if path == "produk" {
        if let Some((_, id)) = url.query_pairs().find(|(key, _)| key == "id") {
            if !id.trim().is_empty() {
                return Ok(Route::ProductDetail(parse_id(&id)));
            }
        }
    }

    Ok(Route::Home)
}

/// Like [`parse_deep_link`], but falls back to [`Route::Login`] on error.
pub fn resolve_deep_link(link: &str) -> Route {
    parse_deep_link(link).unwrap_or(Route::Login)
}

/// Builds a shareable deep link.
///
/// ```rust
/// use storefront_core::deeplink::create_deep_link;
///
/// assert_eq!(create_deep_link("home", &[]).unwrap(), "jualpc://home");
/// assert_eq!(
///     create_deep_link("produk", &[("id", "123")]).unwrap(),
///     "jualpc://produk?id=123"
/// );
/// ```
pub fn create_deep_link(path: &str, params: &[(&str, &str)]) -> CoreResult<String> {
    let raw = format!("{}://{}", SCHEME, path.trim_start_matches('/'));
    let mut url = Url::parse(&raw).map_err(|e| CoreError::InvalidLink {
        url: raw.clone(),
        reason: e.to_string(),
    })?;

    if !params.is_empty() {
        url.query_pairs_mut().extend_pairs(params);
    }

    Ok(url.to_string())
}

fn parse_id(raw: &str) -> ProductId {
    match raw.parse::<ProductId>() {
        Ok(id) => id,
        Err(never) => match never {},
    }
}
