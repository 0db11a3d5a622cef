//! LLM Anonymizer - document preprocessing front end.
//!
//! Accepts uploaded documents (CSV, PDF, images, DOCX, ODT, TXT), converts
//! them to text with external OCR tooling and merges the result into a CSV
//! report that the anonymization pipeline consumes.

pub mod cli;
pub mod config;
pub mod extract;
pub mod jobs;
pub mod llama;
pub mod logging;
pub mod report;
pub mod server;
pub mod utils;
