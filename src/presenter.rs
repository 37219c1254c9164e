//! Per-token disclosure state machine
//!
//! `Closed -> Open(Loading) -> Open(Found) | Open(NotFound) -> Closed`
//!
//! Opening a token asks the resolver for its entry. If the answer is not
//! already known, a grace timer races the lookup: whichever event arrives
//! first decides what is displayed. The cache write from the lookup happens
//! regardless, so a later open shows the real result.

use crate::cache::{ResolutionStatus, Subscription, WordLookup, WordResolver};
use crate::tokens::Token;
use crate::words::WordEntry;
use std::time::Duration;
use tokio::time::{sleep_until, Instant};

/// How long an unresolved lookup is shown as loading.
pub const GRACE_PERIOD: Duration = Duration::from_millis(3000);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disclosure {
    Closed,
    Loading,
    Found(WordEntry),
    NotFound,
}

impl Disclosure {
    pub fn is_open(&self) -> bool {
        !matches!(self, Disclosure::Closed)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PresenterState {
    pub is_open: bool,
    /// Set once the grace period ran out without a resolution; cleared on close.
    pub fallback_armed: bool,
}

/// Events fed to [`Presenter::apply`]. `epoch` identifies the open they
/// belong to; events from an earlier open are ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresenterEvent {
    Resolved { epoch: u64, status: ResolutionStatus },
    GraceElapsed { epoch: u64 },
}

#[derive(Debug)]
struct PendingOpen {
    subscription: Subscription,
    deadline: Instant,
}

#[derive(Debug)]
pub struct Presenter {
    token: Token,
    lookup_key: String,
    preloaded: Option<WordEntry>,
    grace: Duration,
    state: PresenterState,
    disclosure: Disclosure,
    epoch: u64,
    pending: Option<PendingOpen>,
}

impl Presenter {
    /// Presenter for an interactive word token; `None` for inert tokens.
    ///
    /// `lookup_key` is the key sent to the resolver, which may differ from
    /// the token's own key when the token is displayed in Roman script.
    pub fn new(
        token: Token,
        lookup_key: Option<String>,
        preloaded: Option<WordEntry>,
        grace: Duration,
    ) -> Option<Self> {
        if !token.is_interactive() {
            return None;
        }
        let lookup_key = lookup_key.or_else(|| token.clean_key.clone())?;

        Some(Self {
            token,
            lookup_key,
            preloaded,
            grace,
            state: PresenterState::default(),
            disclosure: Disclosure::Closed,
            epoch: 0,
            pending: None,
        })
    }

    pub fn token(&self) -> &Token {
        &self.token
    }

    pub fn lookup_key(&self) -> &str {
        &self.lookup_key
    }

    pub fn preloaded(&self) -> Option<&WordEntry> {
        self.preloaded.as_ref()
    }

    pub fn state(&self) -> PresenterState {
        self.state
    }

    pub fn disclosure(&self) -> &Disclosure {
        &self.disclosure
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Whether a grace timer is currently running.
    pub fn is_waiting(&self) -> bool {
        self.pending.is_some()
    }

    /// User click/tap: opens a closed presenter, closes an open one.
    pub fn activate<L: WordLookup>(&mut self, resolver: &WordResolver<L>) -> &Disclosure {
        if self.state.is_open {
            self.close();
        } else {
            self.open(resolver);
        }
        &self.disclosure
    }

    fn open<L: WordLookup>(&mut self, resolver: &WordResolver<L>) {
        self.epoch += 1;
        self.state = PresenterState {
            is_open: true,
            fallback_armed: false,
        };

        let subscription = match resolver.resolve(&self.lookup_key, self.preloaded.as_ref()) {
            Some(subscription) => subscription,
            None => {
                self.disclosure = Disclosure::NotFound;
                return;
            }
        };

        match subscription.current() {
            ResolutionStatus::Found(entry) => self.disclosure = Disclosure::Found(entry),
            ResolutionStatus::NotFound => self.disclosure = Disclosure::NotFound,
            ResolutionStatus::Pending => {
                tracing::debug!(key = %self.lookup_key, epoch = self.epoch, "presenter loading");
                self.disclosure = Disclosure::Loading;
                self.pending = Some(PendingOpen {
                    subscription,
                    deadline: Instant::now() + self.grace,
                });
            }
        }
    }

    /// Close and clear the grace timer. The lookup itself keeps running.
    pub fn close(&mut self) {
        self.state = PresenterState::default();
        self.disclosure = Disclosure::Closed;
        self.pending = None;
    }

    /// Feed one event into the state machine. Returns whether it changed
    /// the displayed state.
    pub fn apply(&mut self, event: PresenterEvent) -> bool {
        let epoch = match &event {
            PresenterEvent::Resolved { epoch, .. } | PresenterEvent::GraceElapsed { epoch } => *epoch,
        };
        if epoch != self.epoch || self.disclosure != Disclosure::Loading {
            return false;
        }

        self.pending = None;
        match event {
            PresenterEvent::Resolved { status, .. } => match status {
                ResolutionStatus::Found(entry) => self.disclosure = Disclosure::Found(entry),
                ResolutionStatus::NotFound => self.disclosure = Disclosure::NotFound,
                ResolutionStatus::Pending => return false,
            },
            PresenterEvent::GraceElapsed { .. } => {
                tracing::debug!(key = %self.lookup_key, "grace period elapsed");
                self.state.fallback_armed = true;
                self.disclosure = Disclosure::NotFound;
            }
        }
        true
    }

    /// Wait for whichever comes first: the resolution or the grace timer.
    /// `None` when nothing is pending.
    pub async fn next_event(&mut self) -> Option<PresenterEvent> {
        let epoch = self.epoch;
        let pending = self.pending.as_mut()?;
        let deadline = pending.deadline;

        tokio::select! {
            status = pending.subscription.settled() => Some(PresenterEvent::Resolved { epoch, status }),
            _ = sleep_until(deadline) => Some(PresenterEvent::GraceElapsed { epoch }),
        }
    }

    /// Drive the presenter until it is no longer loading.
    pub async fn settle(&mut self) -> &Disclosure {
        while let Some(event) = self.next_event().await {
            self.apply(event);
        }
        &self.disclosure
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::tests::{word, FakeLookup};
    use crate::tokens::{segment, Script};

    fn presenter_for(text: &str, preloaded: Option<WordEntry>) -> Presenter {
        let token = segment(text, Script::Devanagari).remove(0);
        Presenter::new(token, None, preloaded, GRACE_PERIOD).unwrap()
    }

    #[test]
    fn test_separator_has_no_presenter() {
        let tokens = segment("राम गेला.", Script::Devanagari);
        assert!(Presenter::new(tokens[1].clone(), None, None, GRACE_PERIOD).is_none());
        assert!(Presenter::new(tokens[3].clone(), None, None, GRACE_PERIOD).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_preloaded_opens_instantly() {
        let lookup = FakeLookup::new(100, vec![]);
        let resolver = WordResolver::new(lookup.clone());
        let entry = word(1, "राम", "भगवान राम");
        let mut presenter = presenter_for("राम", Some(entry.clone()));

        assert_eq!(presenter.activate(&resolver), &Disclosure::Found(entry));
        assert!(!presenter.is_waiting());
        assert_eq!(lookup.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_preloaded_ignores_cached_not_found() {
        let lookup = FakeLookup::new(100, vec![]);
        let resolver = WordResolver::new(lookup.clone());

        let mut bare = presenter_for("मन", None);
        bare.activate(&resolver);
        assert_eq!(bare.settle().await, &Disclosure::NotFound);

        let entry = word(2, "मन", "चित्त");
        let mut preloaded = presenter_for("मन", Some(entry.clone()));
        assert_eq!(preloaded.activate(&resolver), &Disclosure::Found(entry));
        assert!(!preloaded.is_waiting());
        assert_eq!(lookup.calls(), 1);
        assert_eq!(
            resolver.entry("मन").map(|e| e.status),
            Some(ResolutionStatus::NotFound)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_result_shows_not_found_after_lookup() {
        let lookup = FakeLookup::new(500, vec![]);
        let resolver = WordResolver::new(lookup.clone());
        let mut presenter = presenter_for("गेला", None);

        let start = Instant::now();
        assert_eq!(presenter.activate(&resolver), &Disclosure::Loading);
        assert_eq!(presenter.settle().await, &Disclosure::NotFound);
        let waited = start.elapsed();
        assert!(waited >= Duration::from_millis(500) && waited < GRACE_PERIOD);
        assert!(!presenter.state().fallback_armed);
        assert_eq!(
            resolver.entry("गेला").map(|e| e.status),
            Some(ResolutionStatus::NotFound)
        );

        // re-open: cached, no loading, no new request
        presenter.activate(&resolver);
        assert_eq!(presenter.disclosure(), &Disclosure::Closed);
        assert_eq!(presenter.activate(&resolver), &Disclosure::NotFound);
        assert_eq!(lookup.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_grace_period_forces_not_found_then_cache_catches_up() {
        let entry = word(4, "प्रेम", "माया");
        let lookup = FakeLookup::new(4000, vec![entry.clone()]);
        let resolver = WordResolver::new(lookup.clone());
        let mut presenter = presenter_for("प्रेम", None);

        let start = Instant::now();
        presenter.activate(&resolver);
        assert_eq!(presenter.settle().await, &Disclosure::NotFound);
        let waited = start.elapsed();
        assert!(waited >= GRACE_PERIOD && waited < Duration::from_millis(4000));
        assert!(presenter.state().fallback_armed);
        assert_eq!(
            resolver.entry("प्रेम").map(|e| e.status),
            Some(ResolutionStatus::Pending)
        );

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(
            resolver.entry("प्रेम").map(|e| e.status),
            Some(ResolutionStatus::Found(entry.clone()))
        );

        presenter.activate(&resolver);
        assert!(!presenter.state().fallback_armed);
        assert_eq!(presenter.activate(&resolver), &Disclosure::Found(entry));
        assert_eq!(lookup.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_clears_timer_and_stale_events_are_ignored() {
        let lookup = FakeLookup::new(5000, vec![]);
        let resolver = WordResolver::new(lookup.clone());
        let mut presenter = presenter_for("मन", None);

        presenter.activate(&resolver);
        let first_epoch = presenter.epoch();
        presenter.activate(&resolver);
        assert!(!presenter.is_waiting());
        assert!(presenter.next_event().await.is_none());

        presenter.activate(&resolver);
        assert_eq!(presenter.disclosure(), &Disclosure::Loading);
        assert!(!presenter.apply(PresenterEvent::GraceElapsed { epoch: first_epoch }));
        assert_eq!(presenter.disclosure(), &Disclosure::Loading);
        assert!(presenter.apply(PresenterEvent::GraceElapsed {
            epoch: presenter.epoch()
        }));
        assert_eq!(presenter.disclosure(), &Disclosure::NotFound);
        assert_eq!(lookup.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_independent_presenters_share_one_request() {
        let entry = word(2, "फूल", "पुष्प");
        let lookup = FakeLookup::new(300, vec![entry.clone()]);
        let resolver = WordResolver::new(lookup.clone());
        let mut presenters: Vec<Presenter> = (0..4).map(|_| presenter_for("फूल", None)).collect();

        for presenter in presenters.iter_mut() {
            assert_eq!(presenter.activate(&resolver), &Disclosure::Loading);
        }
        for presenter in presenters.iter_mut() {
            assert_eq!(presenter.settle().await, &Disclosure::Found(entry.clone()));
        }
        // several tooltips may be open at once
        assert!(presenters.iter().all(|p| p.state().is_open));
        assert_eq!(lookup.calls(), 1);
    }
}
