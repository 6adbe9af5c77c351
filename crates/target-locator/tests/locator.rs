use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use omnitime_core_types::{AdapterMetadata, DebugLog};
use page_dom::{DomEvent, EventKind, Listener, NodeId, Page};
use site_adapter::{AdapterError, GitlabAdapter, SiteAdapter};
use target_locator::{
    InjectOutcome, InjectionGuard, LocatorState, PollOutcome, PollPolicy, TargetLocator,
    INJECTED_MARKER,
};

const ISSUE_URL: &str = "https://gitlab.example.com/group/app/-/issues/7";

fn counting_handler() -> (Listener, Arc<AtomicUsize>) {
    let clicks = Arc::new(AtomicUsize::new(0));
    let counter = clicks.clone();
    let handler: Listener = Arc::new(move |_: &mut DomEvent| {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    (handler, clicks)
}

fn locator_for(page: &Page, handler: Listener) -> Arc<TargetLocator> {
    locator_with_policy(page, handler, PollPolicy::default())
}

fn locator_with_policy(page: &Page, handler: Listener, policy: PollPolicy) -> Arc<TargetLocator> {
    let adapter: Arc<dyn SiteAdapter> = Arc::new(GitlabAdapter::new().unwrap());
    let guard = InjectionGuard::new(adapter.clone(), handler, DebugLog::new(true));
    Arc::new(
        TargetLocator::new(page.clone(), adapter, guard, DebugLog::new(true)).with_policy(policy),
    )
}

fn add_widget(page: &Page) -> NodeId {
    let doc = page.document();
    doc.append_element(
        doc.body(),
        "div",
        &[("data-testid", "time-tracking-component")],
    )
    .unwrap()
}

#[tokio::test(start_paused = true)]
async fn immediate_hit_skips_polling() {
    let page = Page::blank(ISSUE_URL).unwrap();
    let widget = add_widget(&page);
    let (handler, _) = counting_handler();
    let locator = locator_for(&page, handler);

    let mut handle = locator.start();
    assert_eq!(
        handle.poll_finished().await.unwrap(),
        PollOutcome::FoundImmediately
    );
    assert_eq!(locator.state(), LocatorState::Found);
    assert_eq!(locator.poll_attempts(), 0);
    assert!(InjectionGuard::is_injected(&page, widget));
    assert_eq!(page.document().listener_count(widget, EventKind::Click), 1);
}

#[tokio::test(start_paused = true)]
async fn polling_gives_up_after_fifteen_attempts_then_observation_finds() {
    let page = Page::blank(ISSUE_URL).unwrap();
    let (handler, _) = counting_handler();
    let locator = locator_for(&page, handler);

    let mut handle = locator.start();
    assert_eq!(locator.state(), LocatorState::Searching);
    assert_eq!(
        handle.poll_finished().await.unwrap(),
        PollOutcome::Exhausted { attempts: 15 }
    );
    assert_eq!(locator.state(), LocatorState::Idle);
    assert_eq!(locator.poll_attempts(), 15);
    assert!(handle.is_observing());

    let widget = add_widget(&page);
    let mut state = locator.subscribe();
    state
        .wait_for(|state| *state == LocatorState::Found)
        .await
        .unwrap();
    assert_eq!(page.document().listener_count(widget, EventKind::Click), 1);

    // Unrelated churn rediscovers the same target without a second handler.
    let doc = page.document();
    doc.append_element(doc.body(), "p", &[]).unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(page.document().listener_count(widget, EventKind::Click), 1);
    assert_eq!(locator.poll_attempts(), 15);
}

#[tokio::test(start_paused = true)]
async fn polling_finds_target_that_appears_without_mutations() {
    let page = Page::blank(ISSUE_URL).unwrap();
    let doc = page.document();
    let block = doc.append_element(doc.body(), "div", &[]).unwrap();
    let (handler, _) = counting_handler();
    let locator = locator_for(&page, handler);

    let mut handle = locator.start();
    tokio::time::sleep(Duration::from_millis(2500)).await;
    // Attribute changes are not child-list mutations; only the timer sees this.
    doc.set_attribute(block, "class", "time-tracking-component")
        .unwrap();

    assert_eq!(
        handle.poll_finished().await.unwrap(),
        PollOutcome::Found { attempts: 3 }
    );
    assert_eq!(locator.state(), LocatorState::Found);
    assert!(InjectionGuard::is_injected(&page, block));
}

#[tokio::test(start_paused = true)]
async fn custom_policy_bounds_attempts() {
    let page = Page::blank(ISSUE_URL).unwrap();
    let (handler, _) = counting_handler();
    let policy = PollPolicy::default()
        .with_interval(Duration::from_millis(200))
        .with_max_attempts(3);
    let locator = locator_with_policy(&page, handler, policy);

    let started = tokio::time::Instant::now();
    let mut handle = locator.start();
    assert_eq!(
        handle.poll_finished().await.unwrap(),
        PollOutcome::Exhausted { attempts: 3 }
    );
    assert!(started.elapsed() >= Duration::from_millis(600));
    assert_eq!(locator.state(), LocatorState::Idle);
}

#[tokio::test]
async fn repeated_discovery_attaches_one_handler() {
    let page = Page::blank(ISSUE_URL).unwrap();
    let widget = add_widget(&page);
    let (handler, clicks) = counting_handler();
    let locator = locator_for(&page, handler);

    for _ in 0..5 {
        assert_eq!(locator.scan(), Some(widget));
    }
    page.document().dispatch_click(widget).unwrap();
    assert_eq!(clicks.load(Ordering::SeqCst), 1);
    assert_eq!(
        page.document().attribute(widget, INJECTED_MARKER).as_deref(),
        Some("true")
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_scans_attach_one_handler() {
    let page = Page::blank(ISSUE_URL).unwrap();
    let widget = add_widget(&page);
    let (handler, clicks) = counting_handler();
    let locator = locator_for(&page, handler);

    let barrier = Arc::new(tokio::sync::Barrier::new(32));
    let scans: Vec<_> = (0..32)
        .map(|_| {
            let locator = locator.clone();
            let barrier = barrier.clone();
            tokio::spawn(async move {
                barrier.wait().await;
                locator.scan()
            })
        })
        .collect();
    for scan in scans {
        assert_eq!(scan.await.unwrap(), Some(widget));
    }

    let doc = page.document();
    assert_eq!(doc.listener_count(widget, EventKind::Click), 1);
    doc.dispatch_click(widget).unwrap();
    assert_eq!(clicks.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn rerendered_target_gets_its_own_handler() {
    let page = Page::blank(ISSUE_URL).unwrap();
    let first = add_widget(&page);
    let (handler, clicks) = counting_handler();
    let locator = locator_for(&page, handler);

    assert_eq!(locator.scan(), Some(first));
    page.document().remove(first).unwrap();
    let second = add_widget(&page);
    assert_eq!(locator.scan(), Some(second));

    page.document().dispatch_click(second).unwrap();
    assert_eq!(clicks.load(Ordering::SeqCst), 1);
    assert_eq!(page.document().listener_count(second, EventKind::Click), 1);
}

#[tokio::test]
async fn handler_lands_on_heading_inside_target() {
    let page = Page::blank(ISSUE_URL).unwrap();
    let doc = page.document();
    let widget = add_widget(&page);
    let heading = doc.append_element(widget, "h3", &[]).unwrap();
    doc.append_text(heading, "Time tracking").unwrap();
    let (handler, clicks) = counting_handler();
    let locator = locator_for(&page, handler);

    locator.scan();
    assert_eq!(doc.listener_count(heading, EventKind::Click), 1);
    assert_eq!(doc.listener_count(widget, EventKind::Click), 0);
    assert!(InjectionGuard::is_injected(&page, widget));

    doc.dispatch_click(heading).unwrap();
    assert_eq!(clicks.load(Ordering::SeqCst), 1);
}

struct BrokenStyling;

impl SiteAdapter for BrokenStyling {
    fn name(&self) -> &'static str {
        "broken"
    }

    fn scan_for_target(&self, page: &Page) -> Option<NodeId> {
        page.document().children(page.document().body()).first().copied()
    }

    fn style_target(&self, _page: &Page, _target: NodeId) -> Result<NodeId, AdapterError> {
        Err(AdapterError::Extraction("styling refused".to_string()))
    }

    fn get_metadata(&self, _page: &Page) -> Result<AdapterMetadata, AdapterError> {
        Err(AdapterError::Extraction("no metadata".to_string()))
    }
}

#[test]
fn failed_injection_clears_marker() {
    let page = Page::blank(ISSUE_URL).unwrap();
    let doc = page.document();
    let target = doc.append_element(doc.body(), "div", &[]).unwrap();
    let (handler, _) = counting_handler();
    let guard = InjectionGuard::new(Arc::new(BrokenStyling), handler, DebugLog::disabled());

    assert!(guard.inject(&page, target).is_err());
    assert!(!InjectionGuard::is_injected(&page, target));
    assert_eq!(doc.listener_count(target, EventKind::Click), 0);
}

#[test]
fn marked_target_is_left_alone() {
    let page = Page::blank(ISSUE_URL).unwrap();
    let widget = add_widget(&page);
    let (handler, _) = counting_handler();
    let adapter: Arc<dyn SiteAdapter> = Arc::new(GitlabAdapter::new().unwrap());
    let guard = InjectionGuard::new(adapter, handler, DebugLog::disabled());

    let first = guard.inject(&page, widget).unwrap();
    assert!(first.is_injected());
    assert_eq!(
        guard.inject(&page, widget).unwrap(),
        InjectOutcome::AlreadyInjected
    );
    assert_eq!(page.document().listener_count(widget, EventKind::Click), 1);
}
