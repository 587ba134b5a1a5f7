use duet_core::CallError;
use tokio::sync::oneshot;

/// User intents, delivered to the controller loop.
#[derive(Debug)]
pub enum CallCommand {
    StartCall {
        reply: oneshot::Sender<Result<(), CallError>>,
    },
    ToggleMicrophone {
        reply: oneshot::Sender<bool>,
    },
    ToggleCamera {
        reply: oneshot::Sender<bool>,
    },
    Leave {
        reply: oneshot::Sender<()>,
    },
}
