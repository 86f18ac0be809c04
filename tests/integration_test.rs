// Integration tests driving the public API through the process-wide kernel

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

use olympus::messaging::{MESSAGE_DISPATCHED, SCENE_AFTER_CHANGE};
use olympus::popup::TimedPopupPolicy;
use olympus::scene::{same_scene, SceneChange, TimedScenePolicy};
use olympus::{
    Command, Config, Core, CoreError, HandlerResult, HeadlessBridge, Injectable, Listener,
    Mediator, MediatorBase, Message, MessageHandlers, OpenOptions, Payload, Popup, PopupManager,
    PopupRef, Scene, SceneManager, SceneRef, SyncQueue, System,
};

type Log = Arc<Mutex<Vec<String>>>;

fn core() -> Arc<Core> {
    Core::init()
        .ok()
        .or_else(Core::global)
        .expect("kernel should be available")
}

struct Page {
    name: &'static str,
    base: MediatorBase,
    log: Log,
}

impl Page {
    fn scene(name: &'static str, log: &Log) -> SceneRef {
        Arc::new(Page {
            name,
            base: MediatorBase::new(Arc::new(HeadlessBridge::new())),
            log: log.clone(),
        })
    }
}

impl Mediator for Page {
    fn base(&self) -> &MediatorBase {
        &self.base
    }
}

impl Scene for Page {
    fn on_after_in(&self, _from: Option<&SceneRef>, _data: Option<&Payload>) {
        self.log.lock().push(format!("{}.after_in", self.name));
    }
}

fn after_in_count(log: &Log, name: &str) -> usize {
    let entry = format!("{}.after_in", name);
    log.lock().iter().filter(|e| **e == entry).count()
}

fn is_current(scenes: &SceneManager, scene: &SceneRef) -> bool {
    scenes
        .get_cur_scene()
        .is_some_and(|cur| same_scene(&cur, scene))
}

#[test]
fn test_second_init_fails() {
    let first = core();
    assert!(matches!(Core::init(), Err(CoreError::AlreadyInitialized)));

    let global = Core::global().expect("kernel was initialized");
    assert!(Arc::ptr_eq(&first, &global));
}

#[test]
fn test_home_settings_walkthrough() {
    let core = core();
    let log: Log = Arc::default();
    let scenes = SceneManager::new(Arc::clone(&core), &Config::default());
    let home = Page::scene("home", &log);
    let settings = Page::scene("settings", &log);

    assert_eq!(scenes.get_active_count(), 0);

    scenes.switch_scene(Arc::clone(&home), None);
    assert!(is_current(&scenes, &home));
    assert_eq!(scenes.get_active_count(), 1);

    scenes.push_scene(Arc::clone(&settings), None);
    assert!(is_current(&scenes, &settings));
    assert_eq!(scenes.get_active_count(), 2);

    scenes.pop_scene(Arc::clone(&settings), None);
    assert!(is_current(&scenes, &home));
    assert_eq!(scenes.get_active_count(), 1);
    assert_eq!(after_in_count(&log, "home"), 2);
}

#[test]
fn test_walkthrough_with_animated_transitions() {
    let core = core();
    let system = System::new();
    let log: Log = Arc::default();
    let scenes = SceneManager::new(Arc::clone(&core), &Config::default());
    scenes.set_default_policy(Arc::new(TimedScenePolicy::new(
        system.clone(),
        Duration::from_millis(100),
    )));
    let home = Page::scene("home", &log);
    let settings = Page::scene("settings", &log);

    let settled = Arc::new(Mutex::new(0));
    let on_change = {
        let settled = Arc::clone(&settled);
        let settings = Arc::clone(&settings);
        Listener::new(move |msg| {
            if let Some(change) = msg.param::<SceneChange>(0) {
                if same_scene(&change.to, &settings) {
                    *settled.lock() += 1;
                }
            }
            Ok(())
        })
    };
    core.listen(SCENE_AFTER_CHANGE, &on_change);

    // All three are queued up front and run one after another
    scenes.switch_scene(Arc::clone(&home), None);
    scenes.push_scene(Arc::clone(&settings), None);
    scenes.pop_scene(Arc::clone(&settings), None);

    assert!(is_current(&scenes, &home));
    assert!(scenes.is_transitioning());

    system.tick(Duration::from_millis(100));
    assert!(is_current(&scenes, &settings));
    assert_eq!(*settled.lock(), 1);

    system.tick(Duration::from_millis(100));
    assert!(is_current(&scenes, &home));
    assert_eq!(scenes.get_active_count(), 1);
    assert!(!scenes.is_transitioning());
    assert!(settings.is_disposed());
    assert_eq!(after_in_count(&log, "home"), 2);

    core.unlisten(SCENE_AFTER_CHANGE, &on_change);
}

#[derive(Default)]
struct Counter {
    hits: Mutex<Vec<String>>,
}

impl Injectable for Counter {
    fn message_handlers() -> MessageHandlers<Self> {
        MessageHandlers::new().on("it.tally", |counter: &Counter, msg| {
            counter.hits.lock().push("inject".to_string());
            if let Some(log) = msg.param::<Log>(0) {
                log.lock().push("inject".to_string());
            }
            Ok(())
        })
    }
}

struct Tally {
    log: Option<Log>,
}

impl Command for Tally {
    fn from_message(msg: &Message) -> Self {
        Self {
            log: msg.param::<Log>(0).cloned(),
        }
    }

    fn exec(self) -> HandlerResult {
        if let Some(log) = self.log {
            log.lock().push("command".to_string());
        }
        Ok(())
    }
}

#[test]
fn test_dispatch_through_global_kernel() {
    let core = core();
    let log: Log = Arc::default();
    let counter = core.map_inject::<Counter>();
    core.map_command::<Tally>("it.tally");
    core.map_command::<Tally>("it.tally");

    let listener = {
        let log = log.clone();
        Listener::new(move |_| {
            log.lock().push("listener".to_string());
            Ok(())
        })
    };
    core.listen("it.tally", &Listener::new(|_| anyhow::bail!("listener failure")));
    core.listen("it.tally", &listener);
    core.listen("it.tally", &listener);

    let seen_notice = Arc::new(Mutex::new(false));
    let notice = {
        let seen = seen_notice.clone();
        Listener::new(move |msg| {
            if msg.dispatched_original().is_some_and(|m| m.is("it.tally")) {
                *seen.lock() = true;
            }
            Ok(())
        })
    };
    core.listen(MESSAGE_DISPATCHED, &notice);

    core.dispatch(Message::new("it.tally").with_param(log.clone()));

    assert_eq!(*counter.hits.lock(), vec!["inject"]);
    assert_eq!(*log.lock(), vec!["inject", "command", "listener"]);
    assert!(*seen_notice.lock());
    core.unlisten(MESSAGE_DISPATCHED, &notice);
}

trait Clock: Send + Sync {
    fn now(&self) -> u64;
}

struct FixedClock(u64);

impl Clock for FixedClock {
    fn now(&self) -> u64 {
        self.0
    }
}

#[test]
fn test_injection_by_interface_key() {
    let core = core();

    core.map_inject_value_as::<dyn Clock>(Arc::new(FixedClock(1)), MessageHandlers::new());
    core.map_inject_value_as::<dyn Clock>(Arc::new(FixedClock(2)), MessageHandlers::new());

    let clock = core.get_inject::<dyn Clock>().expect("clock is mapped");
    assert_eq!(clock.now(), 2);
    assert!(core.get_inject::<FixedClock>().is_none());
}

struct Notice {
    base: MediatorBase,
}

impl Mediator for Notice {
    fn base(&self) -> &MediatorBase {
        &self.base
    }
}

impl Popup for Notice {}

#[test]
fn test_popup_lifecycle_with_timed_policy() {
    let core = core();
    let system = System::new();
    let popups = PopupManager::new(Arc::clone(&core), &Config::default());
    popups.set_default_policy(Arc::new(TimedPopupPolicy::new(
        system.clone(),
        Duration::from_millis(50),
    )));

    let notice: PopupRef = core.create_mediator(Notice {
        base: MediatorBase::new(Arc::new(HeadlessBridge::new())),
    });
    popups.open(Arc::clone(&notice), OpenOptions::new().modal(false));
    assert!(popups.get_opened().is_empty());

    system.tick(Duration::from_millis(50));
    assert_eq!(popups.get_opened_of::<Notice>().len(), 1);
    assert_eq!(popups.modal_count(), 0);

    popups.close(Arc::clone(&notice), None);
    assert!(!popups.is_open(&notice));
    system.tick(Duration::from_millis(50));
    assert!(notice.is_disposed());
    assert!(!core.is_mediator_mapped(&notice));
}

#[test]
fn test_sync_queue_fifo() {
    let queue = SyncQueue::new();
    let log: Log = Arc::default();

    let a = log.clone();
    queue.wait("q", move || a.lock().push("a".to_string()));
    let b = log.clone();
    queue.wait("q", move || b.lock().push("b".to_string()));

    assert_eq!(*log.lock(), vec!["a"]);
    queue.notify("q");
    assert_eq!(*log.lock(), vec!["a", "b"]);
}
