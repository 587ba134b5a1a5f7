mod local_media;
mod media_source;
mod remote_stream;

pub use local_media::*;
pub use media_source::*;
pub use remote_stream::*;
