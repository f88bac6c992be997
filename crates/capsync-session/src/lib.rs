//! Caption session orchestration.
//!
//! Ties the caption pipeline, sentence merger, playback sampler and
//! translation worker together for one video at a time.

pub mod config;
pub mod error;
pub mod logging;
pub mod session;

pub use config::SessionConfig;
pub use error::{SessionError, SessionResult};
pub use logging::LoadLogger;
pub use session::{CaptionSession, LoadedVideo, LAST_VIDEO_KEY};
