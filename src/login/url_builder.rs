//! Links handed to the wallet.
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Path appended to the wallet base URL for cross-device logins.
pub const CALLBACK_PATH: &str = "/protocol/callback";

/// Scheme that launches an OpenID4VP wallet installed on the same device.
pub const DEEP_LINK_SCHEME: &str = "openid4vp://";

/// Characters escaped in a URI component: everything except `A-Z a-z 0-9 - _ . ! ~ * ' ( )`.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Build the URL that hands `auth_request` to a web wallet at `wallet_base_url`.
///
/// Returns an empty string when either input is empty. The request is carried verbatim as the
/// single `authorization_request` query parameter, whatever its own syntax.
pub fn build_callback_url(wallet_base_url: &str, auth_request: &str) -> String {
    if wallet_base_url.is_empty() || auth_request.is_empty() {
        return String::new();
    }

    format!(
        "{}{CALLBACK_PATH}?authorization_request={}",
        wallet_base_url.trim_end_matches('/'),
        utf8_percent_encode(auth_request, URI_COMPONENT)
    )
}

/// Rewrite an `http://` or `https://` authorization request into an `openid4vp://` deep link.
///
/// Anything without one of those exact prefixes is returned unchanged.
pub fn build_deep_link(auth_request: &str) -> String {
    ["https://", "http://"]
        .iter()
        .find_map(|prefix| auth_request.strip_prefix(prefix))
        .map(|rest| format!("{DEEP_LINK_SCHEME}{rest}"))
        .unwrap_or_else(|| auth_request.to_owned())
}
