mod pipeline;

pub use pipeline::{HallucinationPipeline, PipelineOutcome};
