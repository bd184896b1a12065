use thiserror::Error;

/// Application-specific errors for the CLI
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Missing required argument: {arg}")]
    MissingArgument { arg: String },

    #[error("No workflow selected; pass --workflow int|coh|ha or set `workflows` in the config")]
    NoWorkflow,

    #[error("{failed} unit(s) failed in the engine; see {log}")]
    UnitsFailed { failed: usize, log: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Planner error: {0}")]
    Planner(#[from] sarplan::Error),
}
