//! Routing + reservation pipeline for the childcare-availability assistant.
//!
//! One conversational turn runs through a constrained, synchronous pipeline:
//!
//! 1. **Action Router** (`router`) - a small oracle model classifies the
//!    latest user message into one capacity-store action plus slots.
//! 2. **Action Executor** (`executor`) - performs at most one store
//!    operation and renders a context fragment summarizing the outcome.
//! 3. **Response Assembler** (`assembler`) - injects the fragment as a
//!    synthetic system message, calls the generation step with retrieval and
//!    web search enabled, and strips citation markers from the answer.
//!
//! # Safety principle
//!
//! The models are strictly translators. Whether a reservation succeeds is
//! decided by the capacity store's atomic ledger update, never by the LLM.
//! Oracle failures degrade to "no action"; store failures cost the turn its
//! structured context but never the answer.

pub mod assembler;
pub mod executor;
pub mod llm;
pub mod openai;
pub mod router;
pub mod runtime;
