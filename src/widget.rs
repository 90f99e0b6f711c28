//! Stroke-order widget capability.
//!
//! The rendering/animation/quiz engine itself is the Hanzi Writer library
//! running in the browser page; the server drives it through a one-way
//! command stream. Creating a handle emits a `Create` command; the handle
//! then exposes the two imperative operations the board's buttons need.
//! Exactly one handle is live at a time — the shell drops the old one
//! before constructing the next.

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::debug;

/// Directives applied to the browser-side widget.
///
/// `Animate` restores the default (emerald) stroke colors and starts the
/// stroke demonstration; `Quiz` switches to the red tracing color scheme
/// and enters interactive quiz mode. The page maps these one-to-one onto
/// Hanzi Writer calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum WidgetCommand {
    #[serde(rename_all = "camelCase")]
    Create { character: char, size: u32 },
    Animate,
    Quiz,
}

/// Imperative surface of one live widget instance.
pub trait WidgetHandle: Send {
    fn animate(&self);
    fn quiz(&self);
}

/// Constructs widget handles scoped to one character.
pub trait WidgetFactory: Send {
    fn create(&self, character: char, size: u32) -> Box<dyn WidgetHandle>;
}

/// Production factory: publishes commands onto a broadcast channel that
/// the SSE endpoint fans out to connected pages.
pub struct SseWidgetFactory {
    tx: broadcast::Sender<WidgetCommand>,
}

impl SseWidgetFactory {
    pub fn new(tx: broadcast::Sender<WidgetCommand>) -> Self {
        Self { tx }
    }
}

impl WidgetFactory for SseWidgetFactory {
    fn create(&self, character: char, size: u32) -> Box<dyn WidgetHandle> {
        let handle = SseWidgetHandle {
            tx: self.tx.clone(),
        };
        handle.send(WidgetCommand::Create { character, size });
        Box::new(handle)
    }
}

struct SseWidgetHandle {
    tx: broadcast::Sender<WidgetCommand>,
}

impl SseWidgetHandle {
    fn send(&self, command: WidgetCommand) {
        // A send error just means no page is connected yet; the state
        // endpoint lets late joiners catch up.
        if self.tx.send(command.clone()).is_err() {
            debug!("No widget subscribers for {command:?}");
        }
    }
}

impl WidgetHandle for SseWidgetHandle {
    fn animate(&self) {
        self.send(WidgetCommand::Animate);
    }

    fn quiz(&self) {
        self.send(WidgetCommand::Quiz);
    }
}

#[cfg(test)]
pub mod testing {
    //! Recording widget doubles for shell tests.

    use super::*;
    use std::sync::{Arc, Mutex};

    /// Records every command each created handle receives, in order.
    #[derive(Clone, Default)]
    pub struct RecordingFactory {
        pub commands: Arc<Mutex<Vec<WidgetCommand>>>,
    }

    impl RecordingFactory {
        pub fn taken(&self) -> Vec<WidgetCommand> {
            self.commands.lock().unwrap().clone()
        }
    }

    impl WidgetFactory for RecordingFactory {
        fn create(&self, character: char, size: u32) -> Box<dyn WidgetHandle> {
            self.commands
                .lock()
                .unwrap()
                .push(WidgetCommand::Create { character, size });
            Box::new(RecordingHandle {
                commands: self.commands.clone(),
            })
        }
    }

    struct RecordingHandle {
        commands: Arc<Mutex<Vec<WidgetCommand>>>,
    }

    impl WidgetHandle for RecordingHandle {
        fn animate(&self) {
            self.commands.lock().unwrap().push(WidgetCommand::Animate);
        }

        fn quiz(&self) {
            self.commands.lock().unwrap().push(WidgetCommand::Quiz);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_serialize_with_kind_tag() {
        let json = serde_json::to_value(WidgetCommand::Create {
            character: '猫',
            size: 300,
        })
        .unwrap();
        assert_eq!(json["kind"], "create");
        assert_eq!(json["character"], "猫");
        assert_eq!(json["size"], 300);

        let json = serde_json::to_value(WidgetCommand::Animate).unwrap();
        assert_eq!(json["kind"], "animate");
    }

    #[test]
    fn sse_factory_emits_create_on_construction() {
        let (tx, mut rx) = broadcast::channel(8);
        let factory = SseWidgetFactory::new(tx);

        let handle = factory.create('好', 300);
        handle.animate();
        handle.quiz();

        assert_eq!(
            rx.try_recv().unwrap(),
            WidgetCommand::Create {
                character: '好',
                size: 300
            }
        );
        assert_eq!(rx.try_recv().unwrap(), WidgetCommand::Animate);
        assert_eq!(rx.try_recv().unwrap(), WidgetCommand::Quiz);
    }

    #[test]
    fn sending_without_subscribers_does_not_panic() {
        let (tx, _) = broadcast::channel(8);
        let factory = SseWidgetFactory::new(tx);
        let handle = factory.create('字', 300);
        handle.animate();
    }
}
