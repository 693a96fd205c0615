//! Secret word selection.
//!
//! The coordinator asks a [`WordSource`] for one word at the start of each
//! round. [`WordList`] draws from a fixed vocabulary; [`MockWordSource`]
//! replays scripted answers in tests.

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;

/// The game's built-in vocabulary.
pub const BUILTIN_WORDS: [&str; 40] = [
    "house", "car", "cat", "dog", "tree", "flower", "sun", "moon", "star", "fish", "bird",
    "book", "phone", "computer", "chair", "table", "window", "door", "key", "clock", "bicycle",
    "airplane", "boat", "train", "bus", "road", "bridge", "mountain", "river", "ocean", "pizza",
    "burger", "cake", "apple", "banana", "guitar", "piano", "camera", "ball", "game",
];

/// Word source errors.
#[derive(Debug, Error)]
pub enum WordSourceError {
    /// The source has no words to offer.
    #[error("word list is empty")]
    Empty,

    /// The source failed or could not be reached.
    #[error("word source unavailable: {0}")]
    Unavailable(String),
}

/// Supplies one lowercase word per round.
#[async_trait]
pub trait WordSource: Send + Sync {
    /// Fetch the word for a round of `duration_hint_secs`.
    ///
    /// Sources may use the hint to pick harder words for longer rounds.
    async fn fetch_word(&self, duration_hint_secs: u32) -> Result<String, WordSourceError>;
}

/// Uniform random choice from a fixed list.
pub struct WordList {
    words: Vec<String>,
    rng: Mutex<StdRng>,
}

impl WordList {
    /// A list over `words`, lowercased and with blanks dropped.
    ///
    /// `seed` makes the sequence of picks reproducible.
    pub fn new<I, S>(words: I, seed: Option<u64>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let words = words
            .into_iter()
            .map(|w| w.as_ref().trim().to_lowercase())
            .filter(|w| !w.is_empty())
            .collect();
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        Self {
            words,
            rng: Mutex::new(rng),
        }
    }

    /// The built-in vocabulary.
    pub fn builtin(seed: Option<u64>) -> Self {
        Self::new(BUILTIN_WORDS, seed)
    }

    /// Number of candidate words.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Whether the list has no words.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl std::fmt::Debug for WordList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // The words themselves are secrets
        f.debug_struct("WordList")
            .field("words", &format!("[{} words]", self.words.len()))
            .finish()
    }
}

#[async_trait]
impl WordSource for WordList {
    async fn fetch_word(&self, _duration_hint_secs: u32) -> Result<String, WordSourceError> {
        let mut rng = self
            .rng
            .lock()
            .map_err(|e| WordSourceError::Unavailable(format!("rng lock poisoned: {e}")))?;

        self.words
            .choose(&mut *rng)
            .cloned()
            .ok_or(WordSourceError::Empty)
    }
}

/// Scripted word source for testing.
///
/// Answers are returned in the order they were queued; an empty queue
/// answers `Empty`.
#[derive(Debug, Default, Clone)]
pub struct MockWordSource {
    inner: Arc<Mutex<MockWordSourceInner>>,
}

#[derive(Debug, Default)]
struct MockWordSourceInner {
    answers: VecDeque<Result<String, String>>,
    hints: Vec<u32>,
    delay: Option<Duration>,
}

impl MockWordSource {
    /// Create a source with nothing queued.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a source that will answer with `words` in order.
    pub fn with_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let source = Self::new();
        for word in words {
            source.queue_word(word);
        }
        source
    }

    /// Queue a successful answer.
    pub fn queue_word(&self, word: impl Into<String>) {
        let mut inner = self.inner.lock().unwrap();
        inner.answers.push_back(Ok(word.into()));
    }

    /// Queue a failure.
    pub fn queue_failure(&self, error: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.answers.push_back(Err(error.to_string()));
    }

    /// Sleep this long before every answer.
    pub fn set_delay(&self, delay: Duration) {
        let mut inner = self.inner.lock().unwrap();
        inner.delay = Some(delay);
    }

    /// Duration hints received so far.
    pub fn hints(&self) -> Vec<u32> {
        let inner = self.inner.lock().unwrap();
        inner.hints.clone()
    }
}

#[async_trait]
impl WordSource for MockWordSource {
    async fn fetch_word(&self, duration_hint_secs: u32) -> Result<String, WordSourceError> {
        let delay = {
            let mut inner = self.inner.lock().unwrap();
            inner.hints.push(duration_hint_secs);
            inner.delay
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut inner = self.inner.lock().unwrap();
        match inner.answers.pop_front() {
            Some(Ok(word)) => Ok(word),
            Some(Err(error)) => Err(WordSourceError::Unavailable(error)),
            None => Err(WordSourceError::Empty),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn builtin_list_yields_known_words() {
        let list = WordList::builtin(Some(7));
        assert_eq!(list.len(), 40);

        for _ in 0..20 {
            let word = list.fetch_word(60).await.unwrap();
            assert!(BUILTIN_WORDS.contains(&word.as_str()));
        }
    }

    #[tokio::test]
    async fn seeded_lists_agree() {
        let a = WordList::builtin(Some(42));
        let b = WordList::builtin(Some(42));
        for _ in 0..5 {
            assert_eq!(a.fetch_word(60).await.unwrap(), b.fetch_word(60).await.unwrap());
        }
    }

    #[tokio::test]
    async fn words_are_normalized() {
        let list = WordList::new(["  Rocket ", "", "   "], Some(1));
        assert_eq!(list.len(), 1);
        assert_eq!(list.fetch_word(30).await.unwrap(), "rocket");
    }

    #[tokio::test]
    async fn empty_list_is_an_error() {
        let list = WordList::new(Vec::<String>::new(), None);
        assert!(list.is_empty());
        assert!(matches!(
            list.fetch_word(60).await,
            Err(WordSourceError::Empty)
        ));
    }

    #[test]
    fn debug_hides_words() {
        let list = WordList::new(["secret"], None);
        let debug = format!("{:?}", list);
        assert!(!debug.contains("secret"));
        assert!(debug.contains("1 words"));
    }

    #[tokio::test]
    async fn mock_replays_script() {
        let source = MockWordSource::with_words(["cat"]);
        source.queue_failure("backend down");

        assert_eq!(source.fetch_word(60).await.unwrap(), "cat");
        assert!(matches!(
            source.fetch_word(90).await,
            Err(WordSourceError::Unavailable(_))
        ));
        assert!(matches!(
            source.fetch_word(30).await,
            Err(WordSourceError::Empty)
        ));
        assert_eq!(source.hints(), vec![60, 90, 30]);
    }
}
