use duet_client::{RemoteRenderer, RemoteStream};
use std::sync::{Arc, Mutex};

#[derive(Clone, Default)]
pub struct RecordingRenderer {
    rendered: Arc<Mutex<Vec<RemoteStream>>>,
}

impl RecordingRenderer {
    pub fn rendered(&self) -> Vec<RemoteStream> {
        self.rendered.lock().unwrap().clone()
    }
}

impl RemoteRenderer for RecordingRenderer {
    fn render(&mut self, stream: RemoteStream) {
        self.rendered.lock().unwrap().push(stream);
    }
}
