#[derive(Debug, thiserror::Error)]
pub enum Error {
    // --------------------------------- session errors --------------------------------------------
    #[error("debug session already closed")]
    SessionClosed,
    #[error("no suspension awaiting confirmation")]
    NoPendingSuspension,

    // --------------------------------- debugger entity not found ---------------------------------
    #[error("frame number {0} not found")]
    FrameNotFound(u32),

    // --------------------------------- third party errors ----------------------------------------
    #[error("hook: {0}")]
    Hook(anyhow::Error),
}
