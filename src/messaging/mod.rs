/// Messaging kernel: message bus, injection, commands and mediator registry
///
/// Every message goes through four delivery stages, in a fixed order:
///
/// ```text
///                 dispatch(msg)
///                      │
///                      ▼
/// ┌──────────┐   ┌───────────┐   ┌──────────┐   ┌───────────┐
/// │ Injected │──>│ Mediators │──>│ Commands │──>│ Listeners │
/// │  values  │   │  (sugar)  │   │ (fresh)  │   │ (explicit)│
/// └──────────┘   └───────────┘   └──────────┘   └───────────┘
///                                                     │
///                                                     ▼
///                                              ┌─────────────┐
///                                              │ Message taps│
///                                              └─────────────┘
/// ```
///
/// A receiver that fails or panics is logged and the remaining receivers
/// still run.
///
/// ## Usage
///
/// ```rust,ignore
/// let core = Core::init()?;
///
/// let on_goal = Listener::new(|msg| {
///     tracing::info!("goal: {}", msg.description());
///     Ok(())
/// });
/// core.listen("goal", &on_goal);
/// core.map_command::<SaveScore>("goal");
///
/// core.dispatch(Message::new("goal").with_param(3_u32));
/// ```
pub mod bus;
pub mod commands;
pub mod handlers;
pub mod injector;
pub mod mediators;
pub mod message;

// Re-export commonly used types
pub use bus::{Core, SubscriberId};
pub use commands::{Command, CommandRegistry};
pub use handlers::{Listener, MessageHandlers, Stage};
pub use injector::{Injectable, InjectionRegistry};
pub use mediators::MediatorRegistry;
pub use message::{
    Message, Payload, MESSAGE_DISPATCHED, POPUP_AFTER_CLOSE, POPUP_AFTER_OPEN,
    POPUP_BEFORE_CLOSE, POPUP_BEFORE_OPEN, SCENE_AFTER_CHANGE, SCENE_BEFORE_CHANGE,
};
