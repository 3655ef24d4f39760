//! Photo in, celebrity lookalike out.
//!
//! An axum server takes an uploaded photo, asks Gemini to read the face with a
//! fixed prompt, and pulls the `!!!닮은꼴:<name>!!!` marker out of the answer.

pub mod config;
pub mod controller;
pub mod error;
pub mod gateway;
pub mod logging;
pub mod parser;
pub mod share;
pub mod submission;
pub mod web;

pub use controller::{SubmissionState, UploadController};
pub use gateway::{GeminiGateway, InferenceGateway};
pub use parser::{parse, ParsedResult};
pub use submission::ImageSubmission;
