//! Capabilities a login session borrows from its host environment.
//!
//! Each event source is handed out as a stream; dropping the stream is how a session
//! unsubscribes. Implementations are expected to be cheap to call and must not block.
use anyhow::Result;
use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::theme::Theme;

/// Server-pushed outcome of a login attempt.
pub trait PushChannel: Send + Sync {
    /// Subscribe to the outcome for `correlation_token`.
    ///
    /// The stream should yield a single redirect destination or a single error. Sessions do
    /// not rely on that and only ever act on the first item.
    fn connect(&self, correlation_token: &str) -> BoxStream<'static, Result<String>>;
}

/// Source of the current [Theme], re-emitting whenever it changes.
pub trait ThemeSource: Send + Sync {
    fn subscribe(&self) -> BoxStream<'static, Option<Theme>>;
}

/// Write-only access to the system clipboard.
#[async_trait]
pub trait Clipboard: Send + Sync {
    async fn write_text(&self, text: &str) -> Result<()>;
}

/// Page navigation.
pub trait Navigator: Send + Sync {
    /// Replace the current page with `url`.
    fn redirect(&self, url: &str);

    /// Open `url` in a new browsing context.
    ///
    /// Returns `None` when the host refused to open one, for example because of a popup
    /// blocker.
    fn open_in_new_context(&self, url: &str) -> Option<BrowsingContext>;
}

/// Opaque reference to a browsing context opened by a [Navigator].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BrowsingContext(pub u64);
