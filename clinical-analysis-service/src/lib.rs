pub mod compiler;
pub mod config;
pub mod error;
pub mod extraction;
pub mod models;
pub mod prompts;
pub mod reasoning;
pub mod reference;
pub mod service;
pub mod stages;
pub mod tasks;
pub mod workflow;

pub use compiler::{LegacyAnalysis, ResultCompiler};
pub use config::{PipelineConfig, ServiceConfig, StageTimeouts};
pub use error::{AnalysisError, ReasoningError, Result};
pub use extraction::{ExtractedEntities, ExtractionEngine};
pub use models::*;
pub use reasoning::{ReasoningClient, RigReasoningClient, StageReply};
pub use service::{AppState, build_router, create_app};
pub use stages::StageId;
pub use workflow::{ClinicalReasoningPipeline, build_clinical_workflow};
