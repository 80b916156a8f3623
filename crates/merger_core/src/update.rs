use crate::{AppState, EngineKind, Effect, JobStatus, MergeError, Msg, ProgressEvent};

pub const PREPARING_MESSAGE: &str = "Preparing files...";
pub const LOADED_MESSAGE: &str = "Files loaded, calling merge engine...";

/// Pure update function: applies a message to state and returns any effects.
///
/// Messages addressed to a job that is not the current one are ignored.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::SelectionStarted => {
            if let Some(active) = state.active_job() {
                return (state, vec![Effect::SelectionRefused { active }]);
            }
            let had_job = state.job_id().is_some();
            state.begin_selection();
            if had_job {
                vec![Effect::DiscardArtifact]
            } else {
                Vec::new()
            }
        }
        Msg::SelectionValidated(result) => {
            if state.status() != JobStatus::Selecting {
                return (state, Vec::new());
            }
            match result {
                Ok(selection) => {
                    let count = selection.descriptors().len();
                    state.set_selection(selection.into_descriptors());
                    state.set_message(format!("Selected {count} video file(s)"));
                }
                Err(_) => {
                    state.set_selection(Vec::new());
                    state.set_message("No video files found in the selection.");
                }
            }
            Vec::new()
        }
        Msg::MergeRequested { readiness } => {
            if let Some(active) = state.active_job() {
                return (
                    state,
                    vec![Effect::MergeRejected(MergeError::JobAlreadyActive { active })],
                );
            }
            let rejection = if !readiness.codec_ready {
                Some(MergeError::EngineNotReady {
                    engine: EngineKind::Codec,
                })
            } else if !readiness.merge_entry_point {
                Some(MergeError::EngineNotReady {
                    engine: EngineKind::MergeBridge,
                })
            } else if state.selection().is_empty() {
                Some(MergeError::EmptySelection)
            } else {
                None
            };
            if let Some(error) = rejection {
                return (state, vec![Effect::MergeRejected(error)]);
            }

            let job_id = state.start_job();
            state.set_message(PREPARING_MESSAGE);
            vec![
                Effect::PublishProgress(ProgressEvent::new(state.progress(), PREPARING_MESSAGE)),
                Effect::LoadFiles {
                    job_id,
                    descriptors: state.selection().to_vec(),
                },
            ]
        }
        Msg::FilesLoaded { job_id } => {
            if !state.is_current(job_id) || state.status() != JobStatus::Loading {
                return (state, Vec::new());
            }
            state.set_status(JobStatus::Merging);
            state.set_message(LOADED_MESSAGE);
            vec![
                Effect::PublishProgress(ProgressEvent::new(state.progress(), LOADED_MESSAGE)),
                Effect::InvokeMerge { job_id },
            ]
        }
        Msg::LoadFailed { job_id, error } => {
            if !state.is_current(job_id) || state.status() != JobStatus::Loading {
                return (state, Vec::new());
            }
            state.fail_job(error.clone());
            vec![Effect::JobFailed { job_id, error }]
        }
        Msg::MergeProgress { job_id, percentage } => {
            // Progress only ever touches the percentage, never the status.
            if !state.is_current(job_id) || state.status() != JobStatus::Merging {
                return (state, Vec::new());
            }
            match state.record_progress(percentage) {
                Some(published) => {
                    let message = format!("Merging: {published:.2}%");
                    state.set_message(message.clone());
                    vec![Effect::PublishProgress(ProgressEvent::new(published, message))]
                }
                None => Vec::new(),
            }
        }
        Msg::MergeSucceeded { job_id } => {
            if !state.is_current(job_id) || state.status() != JobStatus::Merging {
                return (state, Vec::new());
            }
            state.finish_job();
            state.set_message(crate::COMPLETE_MESSAGE);
            vec![
                Effect::PublishProgress(ProgressEvent::complete()),
                Effect::JobCompleted { job_id },
            ]
        }
        Msg::MergeFailed { job_id, error } => {
            if !state.is_current(job_id) || !state.status().is_active() {
                return (state, Vec::new());
            }
            state.fail_job(error.clone());
            vec![Effect::JobFailed { job_id, error }]
        }
    };

    (state, effects)
}
