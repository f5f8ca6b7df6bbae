//! This library drives the browser side of an [OID4VP 1.0] wallet login: it turns the
//! authorization request issued by a verifier into something a wallet can pick up, and waits
//! for the verifier to push the outcome.
//!
//! [OID4VP 1.0]: <https://openid.net/specs/openid-4-verifiable-presentations-1_0.html>
//!
//! # Usage
//!
//! The hosting application provides four capabilities, see the [`host`] module, and starts a
//! [`LoginSession`] with the parameters the login surface was opened with:
//!
//! ```ignore
//! use openid4vp_login::{config::ActivationParams, login::LoginSession};
//!
//! let params = ActivationParams::from_query(location.search())?;
//!
//! let mut session = LoginSession::builder()
//!     .with_push_channel(push_channel)
//!     .with_theme_source(theme_source)
//!     .with_navigator(navigator)
//!     .with_clipboard(clipboard)
//!     .start(params)?;
//!
//! // Render whatever the session currently calls for.
//! let view = session.view();
//!
//! // React to user input.
//! session.toggle_mode();
//! session.open_wallet();
//!
//! // Tear everything down when the login surface goes away.
//! session.dispose();
//! ```
//!
//! [`LoginSession`]: crate::login::LoginSession
//!
//! # Flows
//!
//! - *Cross-device*: the authorization request is shown as a QR code and scanned by a wallet
//!   on another device. When a web wallet is configured, the request can also be opened there
//!   through [`build_callback_url`].
//! - *Same-device*: the wallet installed on this device is launched through an
//!   `openid4vp://` deep link built by [`build_deep_link`].
//!
//! [`build_callback_url`]: crate::login::build_callback_url
//! [`build_deep_link`]: crate::login::build_deep_link
//!
//! # Outcome
//!
//! When the login surface is opened with a `state` parameter, the session subscribes to the
//! [`PushChannel`] for that correlation token. The first event decides: a redirect
//! destination is navigated to, an error fails the session. If nothing arrives within
//! two minutes the session times out and, when a `homeUri` was given, navigates there.
//!
//! [`PushChannel`]: crate::host::PushChannel

pub mod config;
pub mod error;
pub mod host;
pub mod login;
pub mod theme;
