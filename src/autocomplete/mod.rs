//! Background token index for completion
//!
//! A [`TokenCollection`] owns one worker thread. The UI side sends rope
//! snapshots; the worker waits for edits to settle, asks every provider for
//! tokens, sorts the list and hands it back only when it differs from the
//! last one. [`TokenCollection::poll`] picks results up on the UI thread and
//! runs the listeners there.

mod provider;

pub use provider::{DocumentTokenProvider, KeywordProvider, Token, TokenProvider};

use bevy::log::{debug, trace, warn};
use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use ropey::Rope;
use std::cmp::Ordering;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use crate::document::TextDocument;
use crate::error::EditorError;
use crate::events::{DocumentEvent, ListenerHandle};

/// Quiet period before a rebuild starts
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(3000);

/// Callback run on the UI thread with each new list
pub type TokensListener = Box<dyn FnMut(&[Token])>;

enum WorkerMessage {
    Rebuild(Rope),
    Shutdown,
}

/// Sorted completion tokens, rebuilt off the UI thread
pub struct TokenCollection {
    requests: Sender<WorkerMessage>,
    published: Receiver<Vec<Token>>,
    tokens: Vec<Token>,
    listeners: Vec<TokensListener>,
    matcher: SkimMatcherV2,
    worker: Option<JoinHandle<()>>,
}

impl TokenCollection {
    /// Start the worker with the given providers
    pub fn spawn(providers: Vec<Box<dyn TokenProvider>>, debounce: Duration) -> Result<Self, EditorError> {
        let (requests, worker_requests) = channel();
        let (worker_published, published) = channel();

        let worker = thread::Builder::new()
            .name("token-index".into())
            .spawn(move || run_worker(providers, debounce, worker_requests, worker_published))?;
        debug!("token index worker started (debounce {:?})", debounce);

        Ok(Self {
            requests,
            published,
            tokens: Vec::new(),
            listeners: Vec::new(),
            matcher: SkimMatcherV2::default(),
            worker: Some(worker),
        })
    }

    /// Identifiers from the document, default debounce
    pub fn with_document_tokens() -> Result<Self, EditorError> {
        Self::spawn(vec![Box::new(DocumentTokenProvider::default())], DEFAULT_DEBOUNCE)
    }

    /// Queue a rebuild from `snapshot`; newer requests replace pending ones
    pub fn request_rebuild(&self, snapshot: Rope) {
        if self.requests.send(WorkerMessage::Rebuild(snapshot)).is_err() {
            warn!("token index worker is gone, rebuild dropped");
        }
    }

    /// Rebuild whenever `document` changes, starting now
    pub fn attach(&self, document: &mut TextDocument) -> ListenerHandle {
        let requests = self.requests.clone();
        let handle = document.add_listener(Box::new(move |event| {
            if let DocumentEvent::BufferChanged(changed) = event {
                // a closed channel means the collection was dropped
                let _ = requests.send(WorkerMessage::Rebuild(changed.snapshot.clone()));
            }
        }));
        self.request_rebuild(document.snapshot());
        handle
    }

    /// Take the newest published list, if any, and notify listeners
    ///
    /// Call from the thread that owns the collection.
    pub fn poll(&mut self) -> bool {
        let mut latest = None;
        loop {
            match self.published.try_recv() {
                Ok(tokens) => latest = Some(tokens),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if self.worker.is_some() {
                        warn!("token index worker stopped unexpectedly");
                    }
                    break;
                }
            }
        }

        let Some(tokens) = latest else {
            return false;
        };
        self.tokens = tokens;
        for listener in &mut self.listeners {
            listener(&self.tokens);
        }
        true
    }

    pub fn add_listener(&mut self, listener: TokensListener) {
        self.listeners.push(listener);
    }

    /// Current list, priority first
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Tokens matching `input`, in list order
    pub fn candidates(&self, input: &str) -> Vec<&Token> {
        self.tokens.iter().filter(|t| t.matches(input)).collect()
    }

    /// Fuzzy matches for `input`, best score first
    ///
    /// Ties keep list order, so priority still breaks them.
    pub fn ranked(&self, input: &str) -> Vec<&Token> {
        let mut scored: Vec<(i64, &Token)> = self
            .tokens
            .iter()
            .filter_map(|t| self.matcher.fuzzy_match(&t.content, input).map(|score| (score, t)))
            .collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0));
        scored.into_iter().map(|(_, t)| t).collect()
    }
}

impl Drop for TokenCollection {
    fn drop(&mut self) {
        let _ = self.requests.send(WorkerMessage::Shutdown);
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("token index worker panicked");
            }
        }
    }
}

impl std::fmt::Debug for TokenCollection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCollection")
            .field("tokens", &self.tokens.len())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

fn run_worker(
    providers: Vec<Box<dyn TokenProvider>>,
    debounce: Duration,
    requests: Receiver<WorkerMessage>,
    published: Sender<Vec<Token>>,
) {
    let mut last_hash = None;

    while let Ok(WorkerMessage::Rebuild(mut snapshot)) = requests.recv() {
        // Wait for a quiet period, keeping only the newest snapshot
        loop {
            match requests.recv_timeout(debounce) {
                Ok(WorkerMessage::Rebuild(newer)) => snapshot = newer,
                Ok(WorkerMessage::Shutdown) | Err(RecvTimeoutError::Disconnected) => {
                    debug!("token index worker stopping");
                    return;
                }
                Err(RecvTimeoutError::Timeout) => break,
            }
        }

        let tokens = build_tokens(&providers, &snapshot);
        let hash = hash_tokens(&tokens);
        if last_hash == Some(hash) {
            trace!("token list unchanged ({} tokens)", tokens.len());
            continue;
        }
        last_hash = Some(hash);

        trace!("publishing {} tokens", tokens.len());
        if published.send(tokens).is_err() {
            return;
        }
    }
    debug!("token index worker stopping");
}

fn build_tokens(providers: &[Box<dyn TokenProvider>], text: &Rope) -> Vec<Token> {
    let mut tokens = Vec::new();
    for provider in providers {
        provider.add_tokens(text, &mut tokens);
    }
    tokens.sort_by(compare_tokens);
    tokens
}

/// Priority descending, then case-insensitive content
fn compare_tokens(a: &Token, b: &Token) -> Ordering {
    b.priority
        .cmp(&a.priority)
        .then_with(|| a.content.to_lowercase().cmp(&b.content.to_lowercase()))
        .then_with(|| a.content.cmp(&b.content))
}

fn hash_tokens(tokens: &[Token]) -> u64 {
    let mut hasher = DefaultHasher::new();
    tokens.hash(&mut hasher);
    hasher.finish()
}
