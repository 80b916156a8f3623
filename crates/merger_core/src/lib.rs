//! Merger core: selection validation and the pure merge-job state machine.
mod effect;
mod error;
mod msg;
mod progress;
mod selection;
mod state;
mod update;
mod view_model;

pub use effect::Effect;
pub use error::{EngineKind, MergeError, SelectionError};
pub use msg::{EngineReadiness, Msg};
pub use progress::{ProgressEvent, ProgressTracker, COMPLETE_MESSAGE};
pub use selection::{
    compare_names, is_video_media_type, media_type_for_filename, validate, validate_with,
    FileDescriptor, NameOrder, RawFileHandle, RejectReason, RejectedEntry, Selection,
};
pub use state::{AppState, JobId, JobStatus};
pub use update::{update, LOADED_MESSAGE, PREPARING_MESSAGE};
pub use view_model::AppViewModel;
