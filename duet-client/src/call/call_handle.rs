use crate::call::{CallCommand, CallSnapshot};
use duet_core::CallError;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc, oneshot, watch};
use tokio::task::JoinHandle;

/// Cheap handle to a running [`CallController`](crate::CallController).
#[derive(Clone)]
pub struct CallHandle {
    command_tx: mpsc::Sender<CallCommand>,
    state_rx: watch::Receiver<CallSnapshot>,
    task: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl CallHandle {
    pub(crate) fn new(
        command_tx: mpsc::Sender<CallCommand>,
        state_rx: watch::Receiver<CallSnapshot>,
        task: JoinHandle<()>,
    ) -> Self {
        Self {
            command_tx,
            state_rx,
            task: Arc::new(Mutex::new(Some(task))),
        }
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> CallCommand,
    ) -> Result<T, CallError> {
        let (reply, rx) = oneshot::channel();
        self.command_tx
            .send(make(reply))
            .await
            .map_err(|_| CallError::Closed)?;
        rx.await.map_err(|_| CallError::Closed)
    }

    pub async fn start_call(&self) -> Result<(), CallError> {
        self.request(|reply| CallCommand::StartCall { reply }).await?
    }

    /// Returns whether the microphone is now enabled.
    pub async fn toggle_microphone(&self) -> Result<bool, CallError> {
        self.request(|reply| CallCommand::ToggleMicrophone { reply }).await
    }

    /// Returns whether the camera is now enabled.
    pub async fn toggle_camera(&self) -> Result<bool, CallError> {
        self.request(|reply| CallCommand::ToggleCamera { reply }).await
    }

    /// Idempotent: leaving a call that already ended succeeds.
    pub async fn leave_room(&self) -> Result<(), CallError> {
        match self.request(|reply| CallCommand::Leave { reply }).await {
            Ok(()) | Err(CallError::Closed) => {}
            Err(e) => return Err(e),
        }
        self.join().await;
        Ok(())
    }

    pub fn state(&self) -> watch::Receiver<CallSnapshot> {
        self.state_rx.clone()
    }

    pub fn snapshot(&self) -> CallSnapshot {
        self.state_rx.borrow().clone()
    }

    /// Waits until a published snapshot satisfies `predicate`, returning it.
    /// Fails with `Closed` if the controller stops first.
    pub async fn wait_for(
        &self,
        mut predicate: impl FnMut(&CallSnapshot) -> bool,
    ) -> Result<CallSnapshot, CallError> {
        let mut state = self.state_rx.clone();
        let snapshot = state
            .wait_for(|snapshot| predicate(snapshot) || snapshot.finished)
            .await
            .map_err(|_| CallError::Closed)?
            .clone();
        if predicate(&snapshot) {
            Ok(snapshot)
        } else {
            Err(CallError::Closed)
        }
    }

    /// Waits for the controller loop to stop.
    pub async fn join(&self) {
        let task = self.task.lock().await.take();
        if let Some(task) = task {
            let _ = task.await;
        }
    }
}
