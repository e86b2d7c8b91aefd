mod local_media;
mod local_stream;
mod local_tracks;
mod media_source;
mod media_track;

pub use local_media::*;
pub use local_stream::*;
pub(crate) use local_tracks::*;
pub use media_source::*;
pub use media_track::*;
