//! Claim-level hallucination detection for LLM answers.
//!
//! An answer is split into sentence-level claims and every claim is checked
//! against a pool of evidence sentences: NLI entailment first, then NLI
//! contradiction, then embedding similarity as a fallback. The first claim
//! that fails decides the verdict. [`services::HallucinationPipeline`] wraps
//! the detector with answer generation, Wikipedia evidence retrieval and
//! evidence-grounded correction.

pub mod api;
pub mod config;
pub mod correction;
pub mod db;
pub mod detection;
pub mod embeddings;
pub mod error;
pub mod llm;
pub mod nli;
pub mod retrieval;
pub mod services;
