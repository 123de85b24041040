//! # squire-triage
//!
//! Background Gmail inbox triage. On each run the pipeline authenticates,
//! lists recent unread inbox messages, normalizes each message into a
//! sender/subject/cleaned-body triple, asks an external classification
//! service what the message is, and applies the suggested mailbox action:
//! trash, archive, label, or label plus a draft-generation request.
//!
//! Messages are handled strictly one at a time and every external call is a
//! single attempt. An authorization rejection invalidates the cached
//! credential and aborts the run; any other failure only skips the message
//! that hit it.

pub mod auth;
pub mod classifier;
pub mod cli;
pub mod client;
pub mod config;
pub mod dispatch;
pub mod draft;
pub mod error;
pub mod labels;
pub mod models;
pub mod normalize;
pub mod pipeline;
pub mod scheduler;
pub mod state;

pub use auth::{Credential, TokenProvider};
pub use client::{GmailClient, LabelInfo};
pub use error::{Result, TriageError};
pub use models::{
    ActionOutcome, ClassificationResult, EmailClassification, MessageOutcome, NormalizedEmail,
    RunResult, SuggestedAction,
};
pub use pipeline::{PipelineSettings, TriagePipeline};
