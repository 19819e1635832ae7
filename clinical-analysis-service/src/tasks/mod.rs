pub mod reasoning_stage;

pub use reasoning_stage::ReasoningStageTask;

/// Context keys set when a session starts.
pub mod keys {
    pub const TRANSCRIPT: &str = "transcript";
    pub const PATIENT_CONTEXT: &str = "patient_context";
    pub const OPTIONS: &str = "options";
}
