//! Scripted fetch collaborator

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use onto_backend::{ContentFetcher, FetchError, FetchedContent, SyncSource};

type FetchResult = Result<FetchedContent, FetchError>;

/// Fetcher replaying a queue of canned responses
///
/// Responses are consumed in order; once the queue is drained the last
/// response is repeated, so "same content on every call" is the
/// single-response script. A call counter supports retry assertions.
#[derive(Default)]
pub struct ScriptedFetcher {
    script: Mutex<VecDeque<FetchResult>>,
    last: Mutex<Option<FetchResult>>,
    calls: AtomicUsize,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetcher that always returns the given content
    pub fn serving(content: &str) -> Self {
        let fetcher = Self::new();
        fetcher.push_ok(content);
        fetcher
    }

    pub fn push_ok(&self, content: &str) {
        self.push(Ok(FetchedContent::new(content)));
    }

    pub fn push_err(&self, err: FetchError) {
        self.push(Err(err));
    }

    fn push(&self, result: FetchResult) {
        self.script.lock().unwrap().push_back(result);
    }

    /// Number of fetch calls made so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContentFetcher for ScriptedFetcher {
    async fn fetch(&self, source: &SyncSource, _timeout: Duration) -> FetchResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(result) => {
                *self.last.lock().unwrap() = Some(result.clone());
                result
            }
            None => match self.last.lock().unwrap().clone() {
                Some(result) => result,
                None => Err(FetchError::NotFound {
                    source: source.id.clone(),
                }),
            },
        }
    }
}
