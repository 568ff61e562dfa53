use std::sync::Arc;
use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::select;
use tokio::sync::mpsc::{Receiver, Sender};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::autoplay::AutoplayScheduler;
use crate::error::Error;
use crate::events::EngineEvent;
use crate::policy::{self, NavigationRequest};
use crate::preload::Preloader;
use crate::render::Renderer;
use crate::slides::SlideSet;

/// Engine tunables beyond the slide list itself.
#[derive(Debug, Clone, Copy)]
pub struct EngineOptions {
    /// How long a slide stays visible before autoplay advances.
    pub dwell: Duration,
    /// Duration of the cross-fade animation.
    pub fade: Duration,
    /// Pick auto-advance targets at random (never the current slide).
    pub random: bool,
}

// The Preloading state: one in-flight load at most. Superseding a load
// aborts the task and drops this record, so a late completion has nowhere
// to land.
struct PendingLoad {
    index: usize,
    url: String,
    task: JoinHandle<Result<(), Error>>,
}

/// Orchestrates preload, swap and autoplay for one carousel instance.
///
/// All state lives on a single task: navigation requests, preload
/// completions and the autoplay deadline are arms of one `select!` loop, so
/// transitions are serialized by construction. A request that arrives while
/// a preload is in flight supersedes it (last request wins).
pub struct TransitionEngine<P, R> {
    slides: SlideSet,
    current: usize,
    options: EngineOptions,
    preloader: Arc<P>,
    renderer: R,
    events: Sender<EngineEvent>,
    rng: StdRng,
}

impl<P, R> TransitionEngine<P, R>
where
    P: Preloader + 'static,
    R: Renderer,
{
    pub fn new(
        slides: SlideSet,
        start: usize,
        options: EngineOptions,
        preloader: Arc<P>,
        renderer: R,
        events: Sender<EngineEvent>,
    ) -> Self {
        Self {
            slides,
            current: start,
            options,
            preloader,
            renderer,
            events,
            rng: StdRng::seed_from_u64(0xFA_DE_FA_DE),
        }
    }

    /// Drive the carousel until `cancel` fires. Consumes the engine;
    /// teardown aborts any in-flight preload and fires no further side
    /// effects.
    pub async fn run(
        mut self,
        mut nav_rx: Receiver<NavigationRequest>,
        cancel: CancellationToken,
    ) -> anyhow::Result<()> {
        let mut autoplay = AutoplayScheduler::new(self.options.dwell);
        let mut pending: Option<PendingLoad> = None;

        // Initial paint: the start slide appears without a transition, then
        // the clock starts.
        let slide = self.slides.get(self.current).clone();
        self.renderer.show_image(&slide.url);
        self.renderer.position_layers();
        self.renderer.set_link(slide.link.as_deref());
        self.renderer.mark_selected(self.current);
        autoplay.arm();
        info!(
            index = self.current,
            url = %slide.url,
            total = self.slides.len(),
            "carousel started"
        );

        loop {
            select! {
                _ = cancel.cancelled() => {
                    if let Some(stale) = pending.take() {
                        stale.task.abort();
                    }
                    debug!("cancel received; engine stopped");
                    break;
                }

                Some(request) = nav_rx.recv() => {
                    self.begin(request, &mut pending, &mut autoplay);
                }

                (index, result) = next_completed(&mut pending), if pending.is_some() => {
                    self.finish(index, result, &mut autoplay).await;
                }

                _ = autoplay.expired(), if autoplay.is_armed() => {
                    debug!("dwell elapsed; auto-advancing");
                    self.begin(NavigationRequest::AutoAdvance, &mut pending, &mut autoplay);
                }
            }
        }
        Ok(())
    }

    /// Accept a navigation request: resolve the target and enter Preloading.
    /// Any previously armed autoplay deadline is cancelled here and re-armed
    /// only when the transition settles.
    fn begin(
        &mut self,
        request: NavigationRequest,
        pending: &mut Option<PendingLoad>,
        autoplay: &mut AutoplayScheduler,
    ) {
        autoplay.cancel();
        let target = policy::resolve(
            self.current,
            request,
            self.slides.len(),
            self.options.random,
            &mut self.rng,
        );
        debug!(?request, target, current = self.current, "navigation accepted");

        // Rapid repeats of the same target are idempotent; the in-flight
        // load already covers it.
        if pending.as_ref().is_some_and(|load| load.index == target) {
            return;
        }
        if let Some(stale) = pending.take() {
            debug!(superseded = stale.index, by = target, "in-flight preload discarded");
            stale.task.abort();
        }
        if target == self.current {
            // Single slide, or a jump to the visible one. Nothing to fade;
            // keep the rhythm.
            autoplay.arm();
            return;
        }

        let url = self.slides.get(target).url.clone();
        let preloader = Arc::clone(&self.preloader);
        let task = tokio::spawn({
            let url = url.clone();
            async move { preloader.load(&url).await }
        });
        *pending = Some(PendingLoad { index: target, url, task });
    }

    /// Leave Preloading: on success perform the swap (Swapping is the
    /// awaited fade inside this call), on failure stay on the current slide.
    /// Either way exactly one autoplay deadline is armed afterwards.
    async fn finish(
        &mut self,
        index: usize,
        result: Result<(), Error>,
        autoplay: &mut AutoplayScheduler,
    ) {
        match result {
            Ok(()) => {
                let slide = self.slides.get(index).clone();
                self.renderer.show_image(&slide.url);
                self.renderer.position_layers();
                self.renderer.hide_current_layer(self.options.fade).await;
                self.renderer.set_link(slide.link.as_deref());
                self.renderer.mark_selected(index);
                self.current = index;
                info!(index, url = %slide.url, "slide shown");
                let _ = self
                    .events
                    .send(EngineEvent::SlideShown {
                        index,
                        url: slide.url,
                        link: slide.link,
                    })
                    .await;
            }
            Err(err) => {
                let url = self.slides.get(index).url.clone();
                warn!(index, url = %url, error = %err, "preload failed; staying on current slide");
                let _ = self
                    .events
                    .send(EngineEvent::LoadFailed {
                        index,
                        url,
                        error: err.to_string(),
                    })
                    .await;
            }
        }
        autoplay.arm();
    }
}

// Await the in-flight preload. Clears the slot before handing the outcome
// back so the engine is observably Idle when `finish` runs.
async fn next_completed(pending: &mut Option<PendingLoad>) -> (usize, Result<(), Error>) {
    match pending.as_mut() {
        Some(load) => {
            let joined = (&mut load.task).await;
            let index = load.index;
            let result = match joined {
                Ok(result) => result,
                Err(join_err) => Err(Error::image_load(load.url.clone(), anyhow::anyhow!(join_err))),
            };
            *pending = None;
            (index, result)
        }
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Mutex;
    use tokio::sync::mpsc;
    use tokio::time::timeout;

    const DWELL: Duration = Duration::from_secs(5);
    const FADE: Duration = Duration::from_millis(400);

    /// Completes instantly unless scripted: urls in `fail` error, urls in
    /// `hold` never resolve on their own (the engine must supersede them).
    #[derive(Default)]
    struct ScriptedPreloader {
        fail: HashSet<String>,
        hold: HashSet<String>,
        attempts: Mutex<Vec<String>>,
    }

    impl ScriptedPreloader {
        fn failing(urls: &[&str]) -> Self {
            Self {
                fail: urls.iter().map(|u| u.to_string()).collect(),
                ..Self::default()
            }
        }

        fn holding(urls: &[&str]) -> Self {
            Self {
                hold: urls.iter().map(|u| u.to_string()).collect(),
                ..Self::default()
            }
        }

        fn attempts(&self) -> Vec<String> {
            self.attempts.lock().unwrap().clone()
        }
    }

    impl Preloader for ScriptedPreloader {
        async fn load(&self, url: &str) -> Result<(), Error> {
            self.attempts.lock().unwrap().push(url.to_owned());
            if self.hold.contains(url) {
                std::future::pending::<()>().await;
            }
            if self.fail.contains(url) {
                return Err(Error::image_load(url, anyhow::anyhow!("scripted failure")));
            }
            Ok(())
        }
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        Show(String),
        Position,
        Fade,
        Link(Option<String>),
        Selected(usize),
    }

    #[derive(Clone, Default)]
    struct RecordingRenderer {
        calls: Arc<Mutex<Vec<Call>>>,
    }

    impl RecordingRenderer {
        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl Renderer for RecordingRenderer {
        fn show_image(&mut self, url: &str) {
            self.calls.lock().unwrap().push(Call::Show(url.to_owned()));
        }

        fn position_layers(&mut self) {
            self.calls.lock().unwrap().push(Call::Position);
        }

        async fn hide_current_layer(&mut self, fade: Duration) {
            tokio::time::sleep(fade).await;
            self.calls.lock().unwrap().push(Call::Fade);
        }

        fn set_link(&mut self, link: Option<&str>) {
            self.calls
                .lock()
                .unwrap()
                .push(Call::Link(link.map(str::to_owned)));
        }

        fn mark_selected(&mut self, index: usize) {
            self.calls.lock().unwrap().push(Call::Selected(index));
        }
    }

    struct Harness {
        nav: mpsc::Sender<NavigationRequest>,
        events: mpsc::Receiver<EngineEvent>,
        cancel: CancellationToken,
        renderer: RecordingRenderer,
        preloader: Arc<ScriptedPreloader>,
        engine: JoinHandle<anyhow::Result<()>>,
    }

    fn start(images: &[&str], links: Vec<Option<String>>, random: bool, preloader: ScriptedPreloader) -> Harness {
        let slides = SlideSet::new(images.iter().map(|s| s.to_string()).collect(), links).unwrap();
        let preloader = Arc::new(preloader);
        let renderer = RecordingRenderer::default();
        let (nav_tx, nav_rx) = mpsc::channel(8);
        let (event_tx, event_rx) = mpsc::channel(8);
        let cancel = CancellationToken::new();
        let engine = TransitionEngine::new(
            slides,
            0,
            EngineOptions {
                dwell: DWELL,
                fade: FADE,
                random,
            },
            Arc::clone(&preloader),
            renderer.clone(),
            event_tx,
        );
        let task = tokio::spawn(engine.run(nav_rx, cancel.clone()));
        Harness {
            nav: nav_tx,
            events: event_rx,
            cancel,
            renderer,
            preloader,
            engine: task,
        }
    }

    impl Harness {
        async fn next_event(&mut self) -> EngineEvent {
            timeout(Duration::from_secs(120), self.events.recv())
                .await
                .expect("timed out waiting for engine event")
                .expect("engine dropped its event channel")
        }

        async fn expect_shown(&mut self) -> (usize, String, Option<String>) {
            match self.next_event().await {
                EngineEvent::SlideShown { index, url, link } => (index, url, link),
                other => panic!("expected SlideShown, got {other:?}"),
            }
        }

        async fn expect_failed(&mut self) -> (usize, String) {
            match self.next_event().await {
                EngineEvent::LoadFailed { index, url, .. } => (index, url),
                other => panic!("expected LoadFailed, got {other:?}"),
            }
        }

        async fn quiet_for(&mut self, window: Duration) {
            let res = timeout(window, self.events.recv()).await;
            assert!(res.is_err(), "unexpected event: {:?}", res.unwrap());
        }

        async fn settle() {
            // Let the engine task absorb queued requests before asserting.
            for _ in 0..16 {
                tokio::task::yield_now().await;
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn initial_paint_shows_start_slide() {
        let mut h = start(&["a", "b"], vec![], false, ScriptedPreloader::default());
        Harness::settle().await;
        assert_eq!(
            h.renderer.calls(),
            vec![
                Call::Show("a".into()),
                Call::Position,
                Call::Link(None),
                Call::Selected(0),
            ]
        );
        h.cancel.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn sequential_next_cycles_in_order() {
        let mut h = start(&["a", "b", "c"], vec![], false, ScriptedPreloader::default());
        for expected in [1usize, 2, 0] {
            h.nav.send(NavigationRequest::Next).await.unwrap();
            let (index, _, _) = h.expect_shown().await;
            assert_eq!(index, expected);
        }
        // Visible order a -> b -> c -> a.
        let shows: Vec<_> = h
            .renderer
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Show(url) => Some(url),
                _ => None,
            })
            .collect();
        assert_eq!(shows, vec!["a", "b", "c", "a"]);
        h.cancel.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn previous_from_first_wraps_to_last() {
        let mut h = start(&["a", "b"], vec![], false, ScriptedPreloader::default());
        h.nav.send(NavigationRequest::Previous).await.unwrap();
        let (index, url, _) = h.expect_shown().await;
        assert_eq!(index, 1);
        assert_eq!(url, "b");
        h.cancel.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn single_slide_never_errors_or_transitions() {
        let mut h = start(&["a"], vec![], true, ScriptedPreloader::default());
        for request in [
            NavigationRequest::Next,
            NavigationRequest::Previous,
            NavigationRequest::JumpTo(5),
        ] {
            h.nav.send(request).await.unwrap();
        }
        // Covers a full dwell too, so autoplay resolving to the same slide
        // is exercised as well.
        h.quiet_for(DWELL * 2).await;
        let shows = h
            .renderer
            .calls()
            .iter()
            .filter(|c| matches!(c, Call::Show(_)))
            .count();
        assert_eq!(shows, 1, "only the initial paint may show an image");
        assert!(!h.engine.is_finished());
        h.cancel.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn links_are_applied_and_cleared_per_slide() {
        let links = vec![None, Some("http://x".to_string()), None];
        let mut h = start(&["a", "b", "c"], links, false, ScriptedPreloader::default());

        h.nav.send(NavigationRequest::Next).await.unwrap();
        let (_, _, link) = h.expect_shown().await;
        assert_eq!(link.as_deref(), Some("http://x"));
        assert!(h.renderer.calls().contains(&Call::Link(Some("http://x".into()))));

        h.nav.send(NavigationRequest::Next).await.unwrap();
        let (_, _, link) = h.expect_shown().await;
        assert_eq!(link, None);
        assert_eq!(h.renderer.calls().last(), Some(&Call::Selected(2)));
        h.cancel.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn superseded_preload_never_commits() {
        let mut h = start(&["a", "b", "c"], vec![], false, ScriptedPreloader::holding(&["b"]));

        // Next targets b and stalls in Preloading.
        h.nav.send(NavigationRequest::Next).await.unwrap();
        Harness::settle().await;
        assert_eq!(h.preloader.attempts(), vec!["b"]);

        // Previous (from the still-current index 0) supersedes it.
        h.nav.send(NavigationRequest::Previous).await.unwrap();
        let (index, url, _) = h.expect_shown().await;
        assert_eq!(index, 2);
        assert_eq!(url, "c");

        // b's load must never surface, no matter how long we wait.
        h.quiet_for(DWELL - Duration::from_secs(1)).await;
        assert!(
            !h.renderer.calls().contains(&Call::Show("b".into())),
            "superseded target leaked into the renderer"
        );
        h.cancel.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn repeated_requests_for_same_target_share_one_preload() {
        let mut h = start(&["a", "b"], vec![], false, ScriptedPreloader::holding(&["b"]));
        h.nav.send(NavigationRequest::Next).await.unwrap();
        Harness::settle().await;
        h.nav.send(NavigationRequest::Next).await.unwrap();
        h.nav.send(NavigationRequest::JumpTo(1)).await.unwrap();
        Harness::settle().await;
        assert_eq!(h.preloader.attempts(), vec!["b"], "duplicate preload spawned");
        h.cancel.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn load_failure_keeps_current_and_autoplay_alive() {
        let mut h = start(&["a", "b", "c"], vec![], false, ScriptedPreloader::failing(&["b"]));

        h.nav.send(NavigationRequest::Next).await.unwrap();
        let (index, url) = h.expect_failed().await;
        assert_eq!((index, url.as_str()), (1, "b"));

        // Still on a: a jump past the bad slide commits normally.
        h.nav.send(NavigationRequest::JumpTo(2)).await.unwrap();
        let (index, url, _) = h.expect_shown().await;
        assert_eq!((index, url.as_str()), (2, "c"));

        // And the timer survived the failure: from c autoplay wraps to a.
        let (index, _, _) = h.expect_shown().await;
        assert_eq!(index, 0);
        h.cancel.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn autoplay_advances_once_per_dwell() {
        let mut h = start(&["a", "b", "c"], vec![], false, ScriptedPreloader::default());

        let (index, _, _) = h.expect_shown().await;
        assert_eq!(index, 1);

        // Exactly one timer outstanding: nothing fires early.
        h.quiet_for(DWELL - Duration::from_secs(1)).await;

        let (index, _, _) = h.expect_shown().await;
        assert_eq!(index, 2);
        h.cancel.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn random_autoplay_never_repeats_current() {
        let mut h = start(&["a", "b", "c"], vec![], true, ScriptedPreloader::default());
        let mut current = 0usize;
        for _ in 0..8 {
            let (index, _, _) = h.expect_shown().await;
            assert_ne!(index, current, "random advance repeated the visible slide");
            current = index;
        }
        h.cancel.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn teardown_stops_the_engine_silently() {
        let mut h = start(&["a", "b"], vec![], false, ScriptedPreloader::holding(&["b"]));
        h.nav.send(NavigationRequest::Next).await.unwrap();
        Harness::settle().await;

        h.cancel.cancel();
        h.engine.await.unwrap().unwrap();
        // No event ever surfaced for the aborted load.
        assert!(h.events.try_recv().is_err());
    }
}
