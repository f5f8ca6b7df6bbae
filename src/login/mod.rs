//! Lifecycle of a single wallet login attempt.
//!
//! A [LoginSession] is started when the login surface is shown and disposed when it goes
//! away. In between it:
//!
//! 1. keeps the latest [Theme] from a [ThemeSource],
//! 2. offers the authorization request as a QR payload, a wallet callback URL or a deep link
//!    depending on the selected [Mode],
//! 3. when a correlation token is present, waits for the pushed outcome through a
//!    [SessionWatcher] while a [TimeoutGuard] bounds the wait.
//!
//! A successful outcome navigates away immediately, so the only retained terminal states are
//! [State::TimedOut] and [State::Failed].
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use futures::{FutureExt, StreamExt};
use tokio::{
    runtime::Handle,
    sync::{watch, Notify},
    task::AbortHandle,
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    config::{ActivationParams, LoginConfig},
    error::{Error, Result},
    host::{Clipboard, Navigator, PushChannel, ThemeSource},
    theme::Theme,
};

mod copy_feedback;
mod timeout;
mod url_builder;
mod watcher;

pub use copy_feedback::CopyFeedbackTimer;
pub use timeout::{GuardHandle, TimeoutGuard};
pub use url_builder::{build_callback_url, build_deep_link, CALLBACK_PATH, DEEP_LINK_SCHEME};
pub use watcher::{SessionWatcher, WatchHandle};

/// How the wallet is reached.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mode {
    /// The request is shown as a QR code for a wallet on another device.
    #[default]
    CrossDevice,
    /// The wallet is launched on this device through a deep link.
    SameDevice,
}

impl Mode {
    pub fn toggled(self) -> Self {
        match self {
            Mode::CrossDevice => Mode::SameDevice,
            Mode::SameDevice => Mode::CrossDevice,
        }
    }
}

/// Lifecycle state of a [LoginSession].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum State {
    /// The session is being wired up.
    Initializing,
    /// Waiting for the wallet, or purely informational when there is no correlation token.
    Pending,
    /// No outcome arrived within the configured window.
    TimedOut,
    /// The push channel reported an error. `message` is a user-facing message key.
    Failed { message: String },
}

impl State {
    pub fn is_terminal(&self) -> bool {
        matches!(self, State::TimedOut | State::Failed { .. })
    }

    pub fn outcome(&self) -> Outcome {
        match self {
            State::Initializing | State::Pending => Outcome::Pending,
            State::TimedOut => Outcome::TimedOut,
            State::Failed { message } => Outcome::Failed(message.clone()),
        }
    }
}

/// Authentication outcome as seen by the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Pending,
    TimedOut,
    Failed(String),
}

/// What the presentation layer should currently display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginView {
    /// QR code for a second device.
    ///
    /// `wallet_link` is the wallet callback URL, present once the theme names a wallet.
    CrossDevice {
        qr_payload: String,
        copy_available: bool,
        wallet_link: Option<String>,
    },
    /// Button launching the wallet on this device through `deep_link`.
    SameDevice { deep_link: Option<String> },
    /// Terminal timeout notice, with a way home when one is configured.
    TimedOut { home_uri: Option<String> },
    Failed { message: String },
}

/// State shared between a session and the tasks reacting to its events.
///
/// `settled` is claimed by whichever of pushed outcome, channel error or timeout is delivered
/// first; the others become no-ops. `settled_signal` is notified when that happens.
pub(crate) struct SessionCore {
    pub(crate) id: Uuid,
    settled: AtomicBool,
    settled_signal: Notify,
    state: watch::Sender<State>,
    navigator: Arc<dyn Navigator>,
    error_key: String,
}

impl SessionCore {
    pub(crate) fn new(navigator: Arc<dyn Navigator>, error_key: impl Into<String>) -> Self {
        let (state, _) = watch::channel(State::Initializing);
        Self {
            id: Uuid::new_v4(),
            settled: AtomicBool::new(false),
            settled_signal: Notify::new(),
            state,
            navigator,
            error_key: error_key.into(),
        }
    }

    pub(crate) fn begin(&self) {
        self.state.send_if_modified(|state| {
            if *state != State::Initializing {
                return false;
            }
            *state = State::Pending;
            true
        });
    }

    pub(crate) fn state(&self) -> State {
        self.state.borrow().clone()
    }

    fn subscribe(&self) -> watch::Receiver<State> {
        self.state.subscribe()
    }

    fn settle(&self) -> bool {
        let claimed = self
            .settled
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if claimed {
            self.settled_signal.notify_one();
        }
        claimed
    }

    /// Resolves once the session has been settled by an outcome, an error or a timeout.
    pub(crate) async fn settled(&self) {
        self.settled_signal.notified().await
    }

    fn finish(&self, terminal: State) {
        self.state.send_if_modified(|state| {
            if *state != State::Pending {
                return false;
            }
            *state = terminal;
            true
        });
    }

    /// The wallet finished: leave for `destination`.
    pub(crate) fn complete(&self, destination: &str) {
        if !self.settle() {
            debug!(session = %self.id, "ignoring outcome of a settled session");
            return;
        }
        info!(session = %self.id, "login completed, redirecting");
        self.navigator.redirect(destination);
    }

    pub(crate) fn fail(&self, cause: &anyhow::Error) {
        if !self.settle() {
            debug!(session = %self.id, "ignoring error of a settled session: {cause:#}");
            return;
        }
        warn!(session = %self.id, "push channel failed: {cause:#}");
        self.finish(State::Failed {
            message: self.error_key.clone(),
        });
    }

    pub(crate) fn time_out(&self, watch: &WatchHandle, home_uri: &str) {
        if !self.settle() {
            debug!(session = %self.id, "ignoring timeout of a settled session");
            return;
        }
        info!(session = %self.id, "login timed out");
        self.finish(State::TimedOut);
        watch.cancel();
        if !home_uri.is_empty() {
            self.navigator.redirect(home_uri);
        }
    }

    /// Make every later outcome, error or timeout a no-op.
    fn close(&self) {
        self.settled.store(true, Ordering::Release);
    }
}

/// One wallet login attempt, from activation of the login surface to its teardown.
///
/// Must be started from within a tokio runtime. Dropping the session disposes it.
pub struct LoginSession {
    core: Arc<SessionCore>,
    params: ActivationParams,
    mode: Mode,
    theme: Arc<watch::Sender<Option<Theme>>>,
    theme_task: Option<AbortHandle>,
    navigator: Arc<dyn Navigator>,
    clipboard: Arc<dyn Clipboard>,
    runtime: Handle,
    copy_feedback: CopyFeedbackTimer,
    watcher: SessionWatcher,
    watch: WatchHandle,
    guard: TimeoutGuard,
    guard_handle: GuardHandle,
    disposed: bool,
}

impl LoginSession {
    pub fn builder() -> LoginSessionBuilder {
        LoginSessionBuilder::default()
    }

    /// Identifier used to correlate this session's log events.
    pub fn id(&self) -> Uuid {
        self.core.id
    }

    pub fn params(&self) -> &ActivationParams {
        &self.params
    }

    pub fn state(&self) -> State {
        self.core.state()
    }

    pub fn outcome(&self) -> Outcome {
        self.core.state().outcome()
    }

    /// Observe state transitions.
    pub fn subscribe_outcome(&self) -> watch::Receiver<State> {
        self.core.subscribe()
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn toggle_mode(&mut self) {
        self.mode = self.mode.toggled();
        debug!(session = %self.core.id, mode = ?self.mode, "login mode toggled");
    }

    /// Latest theme received from the [ThemeSource], if any.
    pub fn theme(&self) -> Option<Theme> {
        self.theme.borrow().clone()
    }

    /// Same-device logins are only offered when a wallet URL is configured.
    pub fn mode_toggle_available(&self) -> bool {
        self.theme
            .borrow()
            .as_ref()
            .and_then(Theme::wallet_url)
            .is_some()
    }

    /// Cross-device callback URL for the current theme, or `""` when it cannot be built.
    pub fn wallet_redirect_url(&self) -> String {
        let theme = self.theme.borrow();
        let wallet_url = theme.as_ref().and_then(Theme::wallet_url).unwrap_or_default();
        build_callback_url(wallet_url, &self.params.auth_request)
    }

    pub fn deep_link_url(&self) -> String {
        build_deep_link(&self.params.auth_request)
    }

    pub fn copy_feedback_active(&self) -> bool {
        self.copy_feedback.is_active()
    }

    pub fn subscribe_copy_feedback(&self) -> watch::Receiver<bool> {
        self.copy_feedback.subscribe()
    }

    /// Whether a pushed outcome is still being waited for.
    pub fn is_watching(&self) -> bool {
        self.watch.is_active()
    }

    /// Whether the countdown is still running. It stops as soon as the session settles.
    pub fn timeout_armed(&self) -> bool {
        self.guard_handle.is_armed()
    }

    /// Copy the authorization request to the clipboard and show the "copied" feedback.
    ///
    /// Clipboard failures are logged and otherwise ignored.
    pub fn copy_auth_request(&mut self) {
        if self.params.auth_request.is_empty() {
            return;
        }

        let clipboard = Arc::clone(&self.clipboard);
        let text = self.params.auth_request.clone();
        let session = self.core.id;
        self.runtime.spawn(async move {
            if let Err(e) = clipboard.write_text(&text).await {
                warn!(%session, "failed to copy authorization request: {e:#}");
            }
        });
        self.copy_feedback.trigger();
    }

    /// Hand the authorization request to the wallet in the way the current [Mode] calls for.
    pub fn open_wallet(&self) {
        match self.mode {
            Mode::CrossDevice => {
                let link = self.wallet_redirect_url();
                if link.is_empty() {
                    return;
                }
                if self.navigator.open_in_new_context(&link).is_none() {
                    debug!(session = %self.core.id, "wallet window was blocked");
                }
            }
            Mode::SameDevice => {
                let link = self.deep_link_url();
                if link.is_empty() {
                    return;
                }
                self.navigator.redirect(&link);
            }
        }
    }

    pub fn navigate_home(&self) {
        if !self.params.home_uri.is_empty() {
            self.navigator.redirect(&self.params.home_uri);
        }
    }

    pub fn navigate_onboarding(&self) {
        let onboarding_url = self
            .theme
            .borrow()
            .as_ref()
            .and_then(Theme::onboarding_url)
            .map(str::to_owned);
        if let Some(url) = onboarding_url {
            self.navigator.redirect(&url);
        }
    }

    pub fn view(&self) -> LoginView {
        match self.state() {
            State::TimedOut => LoginView::TimedOut {
                home_uri: Some(self.params.home_uri.clone()).filter(|uri| !uri.is_empty()),
            },
            State::Failed { message } => LoginView::Failed { message },
            State::Initializing | State::Pending => match self.mode {
                Mode::CrossDevice => LoginView::CrossDevice {
                    qr_payload: self.params.auth_request.clone(),
                    copy_available: !self.params.auth_request.is_empty(),
                    wallet_link: Some(self.wallet_redirect_url())
                        .filter(|link| !link.is_empty()),
                },
                Mode::SameDevice => LoginView::SameDevice {
                    deep_link: Some(self.deep_link_url()).filter(|link| !link.is_empty()),
                },
            },
        }
    }

    /// Release the timeout, the push channel, the copy feedback timer and the theme
    /// subscription. Later calls do nothing.
    pub fn dispose(&mut self) {
        if std::mem::replace(&mut self.disposed, true) {
            return;
        }

        self.core.close();
        self.guard.disarm(&self.guard_handle);
        self.watcher.cancel(&self.watch);
        self.copy_feedback.cancel();
        if let Some(theme_task) = self.theme_task.take() {
            theme_task.abort();
        }
        info!(session = %self.core.id, state = ?self.core.state(), "login session disposed");
    }
}

impl Drop for LoginSession {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// Builder for [LoginSession].
#[derive(Default)]
pub struct LoginSessionBuilder {
    config: LoginConfig,
    push_channel: Option<Arc<dyn PushChannel>>,
    theme_source: Option<Arc<dyn ThemeSource>>,
    navigator: Option<Arc<dyn Navigator>>,
    clipboard: Option<Arc<dyn Clipboard>>,
}

impl LoginSessionBuilder {
    /// Start the session for `params`.
    ///
    /// The theme is read right away; the watcher and the timeout are armed only when a
    /// correlation token is present.
    pub fn start(self, params: ActivationParams) -> Result<LoginSession> {
        let Self {
            config,
            push_channel,
            theme_source,
            navigator,
            clipboard,
        } = self;

        let Some(push_channel) = push_channel else {
            return Err(Error::MissingCollaborator("push channel", "with_push_channel"));
        };
        let Some(theme_source) = theme_source else {
            return Err(Error::MissingCollaborator("theme source", "with_theme_source"));
        };
        let Some(navigator) = navigator else {
            return Err(Error::MissingCollaborator("navigator", "with_navigator"));
        };
        let Some(clipboard) = clipboard else {
            return Err(Error::MissingCollaborator("clipboard", "with_clipboard"));
        };
        let runtime = Handle::try_current()?;

        let core = Arc::new(SessionCore::new(
            Arc::clone(&navigator),
            config.error_key.clone(),
        ));
        info!(
            session = %core.id,
            auth_request_len = params.auth_request.len(),
            watching = !params.correlation_token.is_empty(),
            "starting login session"
        );

        let (theme, _) = watch::channel(None);
        let theme = Arc::new(theme);
        let theme_task = subscribe_theme(&theme_source, &theme, &runtime, core.id);

        core.begin();
        let watcher = SessionWatcher::new(push_channel, Arc::clone(&core), runtime.clone());
        let guard = TimeoutGuard::new(Arc::clone(&core), config.timeout(), runtime.clone());
        let watch = watcher.start(&params.correlation_token);
        let guard_handle = guard.arm(&params.correlation_token, &params.home_uri, watch.clone());

        Ok(LoginSession {
            copy_feedback: CopyFeedbackTimer::new(runtime.clone(), config.copy_feedback()),
            core,
            params,
            mode: Mode::default(),
            theme,
            theme_task,
            navigator,
            clipboard,
            runtime,
            watcher,
            watch,
            guard,
            guard_handle,
            disposed: false,
        })
    }

    pub fn with_config(mut self, config: LoginConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the [PushChannel] delivering the outcome of the login.
    pub fn with_push_channel(mut self, push_channel: Arc<dyn PushChannel>) -> Self {
        self.push_channel = Some(push_channel);
        self
    }

    /// Set the [ThemeSource] the wallet and onboarding URLs are read from.
    pub fn with_theme_source(mut self, theme_source: Arc<dyn ThemeSource>) -> Self {
        self.theme_source = Some(theme_source);
        self
    }

    pub fn with_navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = Some(navigator);
        self
    }

    pub fn with_clipboard(mut self, clipboard: Arc<dyn Clipboard>) -> Self {
        self.clipboard = Some(clipboard);
        self
    }
}

/// Apply the theme the source already holds, if any, then follow the rest of the stream in
/// the background. Returns `None` when the stream ended on the first read.
///
/// At most one item is read synchronously: a source that is always ready must not keep
/// `start` from returning.
fn subscribe_theme(
    source: &Arc<dyn ThemeSource>,
    theme: &Arc<watch::Sender<Option<Theme>>>,
    runtime: &Handle,
    session: Uuid,
) -> Option<AbortHandle> {
    let mut themes = source.subscribe();
    match themes.next().now_or_never() {
        Some(Some(first)) => {
            theme.send_replace(first);
        }
        Some(None) => return None,
        None => {}
    }

    let theme = Arc::clone(theme);
    let task = runtime.spawn(async move {
        while let Some(next) = themes.next().await {
            debug!(%session, "theme updated");
            theme.send_replace(next);
            // the stream may never be pending; give the other session tasks a turn
            tokio::task::yield_now().await;
        }
    });
    Some(task.abort_handle())
}
