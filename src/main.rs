//! Headless walkthrough of the kernel: a home scene, a settings scene pushed
//! on top of it with a timed transition, and a confirmation popup.
//!
//! Usage: `olympus-demo [config.json]`

use anyhow::Context;
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use olympus::messaging::{SCENE_AFTER_CHANGE, POPUP_AFTER_CLOSE};
use olympus::popup::TimedPopupPolicy;
use olympus::scene::{SceneChange, TimedScenePolicy};
use olympus::view::DisplayNode;
use olympus::{
    logging, AppResult, Bridge, Command, Config, Core, HandlerResult, HeadlessBridge, Injectable,
    Listener, Mediator, MediatorBase, Message, MessageHandlers, OpenOptions, Payload, Point,
    Popup, PopupManager, Scene, SceneManager, SceneRef, System,
};

const LOG_TARGET_STARTUP: &str = "olympus::startup";
const FRAME: Duration = Duration::from_millis(16);
const SAVE_SETTINGS: &str = "saveSettings";

/// Settings shared through the injector
#[derive(Default)]
struct Preferences {
    volume: Mutex<u8>,
}

impl Injectable for Preferences {
    fn message_handlers() -> MessageHandlers<Self> {
        MessageHandlers::new().on(SAVE_SETTINGS, |prefs: &Preferences, msg| {
            if let Some(volume) = msg.param::<u8>(0) {
                *prefs.volume.lock() = *volume;
            }
            Ok(())
        })
    }
}

/// Persists settings whenever they are saved
struct PersistSettings {
    volume: Option<u8>,
}

impl Command for PersistSettings {
    fn from_message(msg: &Message) -> Self {
        Self {
            volume: msg.param::<u8>(0).copied(),
        }
    }

    fn exec(self) -> HandlerResult {
        let volume = self.volume.context("saveSettings without a volume")?;
        tracing::info!("[demo] Persisting volume {}", volume);
        Ok(())
    }
}

struct DemoScene {
    title: &'static str,
    base: MediatorBase,
}

impl DemoScene {
    fn new(bridge: &Arc<HeadlessBridge>, stage: &DisplayNode, title: &'static str) -> Self {
        let skin = bridge.create_node(title);
        bridge.add_child(stage, &skin);
        Self {
            title,
            base: MediatorBase::with_skin(bridge.clone(), skin),
        }
    }
}

impl Mediator for DemoScene {
    fn base(&self) -> &MediatorBase {
        &self.base
    }
}

impl Scene for DemoScene {
    fn on_after_in(&self, from: Option<&SceneRef>, _data: Option<&Payload>) {
        tracing::info!(
            "[demo] {} is now visible (came from {})",
            self.title,
            from.map_or("nowhere", |s| s.mediator_name())
        );
    }
}

struct ConfirmPopup {
    base: MediatorBase,
}

impl Mediator for ConfirmPopup {
    fn base(&self) -> &MediatorBase {
        &self.base
    }
}

impl Popup for ConfirmPopup {
    fn on_after_open(&self, is_modal: bool, from: Option<Point>) {
        tracing::info!("[demo] Confirm dialog open (modal: {}, from: {:?})", is_modal, from);
    }
}

fn load_config() -> AppResult<Config> {
    match std::env::args().nth(1).map(PathBuf::from) {
        Some(path) => Config::load_from(&path)
            .with_context(|| format!("Failed to read config {}", path.display())),
        None => Ok(Config::load().unwrap_or_else(|e| {
            eprintln!("Warning: {:#}, using defaults", anyhow::Error::from(e));
            Config::default()
        })),
    }
}

/// Tick the clock until `done` reports true, or give up after `max_frames`
fn run_frames(system: &System, max_frames: usize, done: impl Fn() -> bool) -> bool {
    for _ in 0..max_frames {
        if done() {
            return true;
        }
        system.tick(FRAME);
    }
    done()
}

fn main() -> AppResult<()> {
    let config = load_config()?;
    let _log_guard = logging::init(&config).context("Failed to initialize logging")?;

    tracing::info!(
        target: LOG_TARGET_STARTUP,
        "Starting olympus demo v{}",
        env!("CARGO_PKG_VERSION")
    );

    let core = Core::init_with(&config)?;
    let system = System::new();
    let bridge = Arc::new(HeadlessBridge::new());
    let stage = bridge.create_node("stage");

    let prefs = core.map_inject::<Preferences>();
    core.map_command::<PersistSettings>(SAVE_SETTINGS);

    let on_scene = Listener::new(|msg| {
        if let Some(change) = msg.param::<SceneChange>(0) {
            tracing::info!("[demo] Scene changed: {}", change.describe());
        }
        Ok(())
    });
    core.listen(SCENE_AFTER_CHANGE, &on_scene);

    let scenes = SceneManager::new(Arc::clone(&core), &config);
    scenes.set_default_policy(Arc::new(TimedScenePolicy::new(
        system.clone(),
        Duration::from_millis(250),
    )));
    let popups = PopupManager::new(Arc::clone(&core), &config);
    popups.set_default_policy(Arc::new(TimedPopupPolicy::new(
        system.clone(),
        Duration::from_millis(120),
    )));

    let home: SceneRef = core.create_mediator(DemoScene::new(&bridge, &stage, "Home"));
    let settings: SceneRef = core.create_mediator(DemoScene::new(&bridge, &stage, "Settings"));

    scenes.switch_scene(Arc::clone(&home), None);
    scenes.push_scene(Arc::clone(&settings), None);
    anyhow::ensure!(
        run_frames(&system, 60, || !scenes.is_transitioning()),
        "Scene transition never completed"
    );
    tracing::info!("[demo] {} scenes active", scenes.get_active_count());

    core.dispatch(Message::new(SAVE_SETTINGS).with_param(7_u8));
    tracing::info!("[demo] Stored volume {}", *prefs.volume.lock());

    let confirm = core.create_mediator(ConfirmPopup {
        base: MediatorBase::with_skin(bridge.clone(), bridge.create_node("confirm")),
    });
    let closed = Arc::new(Mutex::new(false));
    let on_closed = {
        let closed = Arc::clone(&closed);
        Listener::new(move |_| {
            *closed.lock() = true;
            Ok(())
        })
    };
    core.listen(POPUP_AFTER_CLOSE, &on_closed);

    let confirm = popups.open(confirm, OpenOptions::new().from_point(Point::new(160.0, 90.0)));
    run_frames(&system, 30, || popups.is_open(&confirm));
    popups.close(Arc::clone(&confirm), None);
    anyhow::ensure!(
        run_frames(&system, 30, || *closed.lock()),
        "Popup never closed"
    );

    scenes.pop_scene(Arc::clone(&settings), None);
    anyhow::ensure!(
        run_frames(&system, 60, || !scenes.is_transitioning()),
        "Scene transition never completed"
    );

    tracing::info!(
        "[demo] Done: {} scene(s), {} popup(s) open, stage children {:?}, {:?} elapsed",
        scenes.get_active_count(),
        popups.get_opened().len(),
        bridge.child_labels(&stage),
        system.timer()
    );
    Ok(())
}
