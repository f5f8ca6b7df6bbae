//! Scripted collaborators for driving a [LoginSession] in tests.
#![allow(dead_code)]

use std::{
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use anyhow::{bail, Result};
use async_trait::async_trait;
use futures::{
    channel::mpsc,
    stream::{BoxStream, Stream, StreamExt},
};
use openid4vp_login::{
    config::{ActivationParams, LoginConfig},
    host::{BrowsingContext, Clipboard, Navigator, PushChannel, ThemeSource},
    login::{LoginSession, LoginSessionBuilder},
    theme::Theme,
};
use serde_json::json;

pub const AUTH_REQUEST: &str = "https://verifier.example.com/oid4vp/auth?nonce=abc";
pub const WALLET_URL: &str = "https://wallet.example.com";

/// Let spawned tasks run until they are all waiting again.
pub async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}

/// Advance the paused clock and let the woken tasks run.
pub async fn elapse(millis: u64) {
    tokio::time::advance(Duration::from_millis(millis)).await;
    settle().await;
}

/// Keeps `counter` alive for as long as the returned stream, counting its drop.
fn tracked<T: Send + 'static>(
    stream: impl Stream<Item = T> + Send + 'static,
    counter: Arc<AtomicUsize>,
) -> BoxStream<'static, T> {
    let guard = DropGuard(counter);
    stream
        .map(move |item| {
            let _ = &guard;
            item
        })
        .boxed()
}

struct DropGuard(Arc<AtomicUsize>);

impl Drop for DropGuard {
    fn drop(&mut self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
pub struct FakePushChannel {
    tokens: Mutex<Vec<String>>,
    senders: Mutex<Vec<mpsc::UnboundedSender<Result<String>>>>,
    pub dropped: Arc<AtomicUsize>,
}

impl FakePushChannel {
    pub fn tokens(&self) -> Vec<String> {
        self.tokens.lock().unwrap().clone()
    }

    pub fn send_destination(&self, destination: &str) {
        for sender in self.senders.lock().unwrap().iter() {
            let _ = sender.unbounded_send(Ok(destination.to_owned()));
        }
    }

    pub fn send_error(&self, cause: &str) {
        for sender in self.senders.lock().unwrap().iter() {
            let _ = sender.unbounded_send(Err(anyhow::anyhow!("{cause}")));
        }
    }

    pub fn dropped(&self) -> usize {
        self.dropped.load(Ordering::SeqCst)
    }
}

impl PushChannel for FakePushChannel {
    fn connect(&self, correlation_token: &str) -> BoxStream<'static, Result<String>> {
        self.tokens.lock().unwrap().push(correlation_token.to_owned());
        let (sender, receiver) = mpsc::unbounded();
        self.senders.lock().unwrap().push(sender);
        tracked(receiver, Arc::clone(&self.dropped))
    }
}

pub struct FakeThemeSource {
    sender: mpsc::UnboundedSender<Option<Theme>>,
    receiver: Mutex<Option<mpsc::UnboundedReceiver<Option<Theme>>>>,
    pub dropped: Arc<AtomicUsize>,
}

impl FakeThemeSource {
    /// A source that already holds `initial`, like a replaying subject.
    pub fn new(initial: Option<Theme>) -> Self {
        let (sender, receiver) = mpsc::unbounded();
        sender.unbounded_send(initial).unwrap();
        Self {
            sender,
            receiver: Mutex::new(Some(receiver)),
            dropped: Default::default(),
        }
    }

    pub fn emit(&self, theme: Option<Theme>) {
        let _ = self.sender.unbounded_send(theme);
    }

    pub fn dropped(&self) -> usize {
        self.dropped.load(Ordering::SeqCst)
    }
}

impl ThemeSource for FakeThemeSource {
    fn subscribe(&self) -> BoxStream<'static, Option<Theme>> {
        match self.receiver.lock().unwrap().take() {
            Some(receiver) => tracked(receiver, Arc::clone(&self.dropped)),
            None => futures::stream::empty().boxed(),
        }
    }
}

/// A source whose stream is always ready, replaying `theme` forever.
pub struct ReadyThemeSource {
    theme: Option<Theme>,
    pub dropped: Arc<AtomicUsize>,
}

impl ReadyThemeSource {
    pub fn new(theme: Option<Theme>) -> Self {
        Self {
            theme,
            dropped: Default::default(),
        }
    }

    pub fn dropped(&self) -> usize {
        self.dropped.load(Ordering::SeqCst)
    }
}

impl ThemeSource for ReadyThemeSource {
    fn subscribe(&self) -> BoxStream<'static, Option<Theme>> {
        tracked(
            futures::stream::repeat(self.theme.clone()),
            Arc::clone(&self.dropped),
        )
    }
}

#[derive(Default)]
pub struct FakeClipboard {
    copied: Mutex<Vec<String>>,
    pub fail: AtomicBool,
}

impl FakeClipboard {
    pub fn copied(&self) -> Vec<String> {
        self.copied.lock().unwrap().clone()
    }
}

#[async_trait]
impl Clipboard for FakeClipboard {
    async fn write_text(&self, text: &str) -> Result<()> {
        self.copied.lock().unwrap().push(text.to_owned());
        if self.fail.load(Ordering::SeqCst) {
            bail!("clipboard permission denied")
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    Redirect(String),
    NewContext(String),
}

#[derive(Default)]
pub struct FakeNavigator {
    navigations: Mutex<Vec<Navigation>>,
    pub block_popups: AtomicBool,
}

impl FakeNavigator {
    pub fn navigations(&self) -> Vec<Navigation> {
        self.navigations.lock().unwrap().clone()
    }
}

impl Navigator for FakeNavigator {
    fn redirect(&self, url: &str) {
        self.navigations
            .lock()
            .unwrap()
            .push(Navigation::Redirect(url.to_owned()));
    }

    fn open_in_new_context(&self, url: &str) -> Option<BrowsingContext> {
        self.navigations
            .lock()
            .unwrap()
            .push(Navigation::NewContext(url.to_owned()));
        if self.block_popups.load(Ordering::SeqCst) {
            return None;
        }
        Some(BrowsingContext(7))
    }
}

pub fn theme(wallet_url: Option<&str>, onboarding_url: Option<&str>) -> Theme {
    serde_json::from_value(json!({
        "branding": {
            "name": "Test",
            "primaryColor": "#000",
            "primaryContrastColor": "#fff",
            "secondaryColor": "#111",
            "secondaryContrastColor": "#222",
            "logoUrl": null,
            "faviconUrl": null
        },
        "content": {
            "links": [],
            "footer": null,
            "onboardingUrl": onboarding_url,
            "supportUrl": null,
            "walletUrl": wallet_url
        },
        "i18n": { "defaultLang": "en", "available": ["en"] }
    }))
    .unwrap()
}

pub struct Harness {
    pub channel: Arc<FakePushChannel>,
    pub themes: Arc<FakeThemeSource>,
    pub clipboard: Arc<FakeClipboard>,
    pub navigator: Arc<FakeNavigator>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_theme(Some(theme(None, None)))
    }

    pub fn with_theme(initial: Option<Theme>) -> Self {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();

        Self {
            channel: Default::default(),
            themes: Arc::new(FakeThemeSource::new(initial)),
            clipboard: Default::default(),
            navigator: Default::default(),
        }
    }

    pub fn start(&self, auth_request: &str, state: &str, home_uri: &str) -> LoginSession {
        self.start_with(
            LoginConfig::default(),
            ActivationParams::new(auth_request, state, home_uri),
        )
    }

    pub fn start_with(&self, config: LoginConfig, params: ActivationParams) -> LoginSession {
        self.builder().with_config(config).start(params).unwrap()
    }

    /// A builder wired to every fake of this harness.
    pub fn builder(&self) -> LoginSessionBuilder {
        LoginSession::builder()
            .with_push_channel(self.channel.clone())
            .with_theme_source(self.themes.clone())
            .with_navigator(self.navigator.clone())
            .with_clipboard(self.clipboard.clone())
    }
}
