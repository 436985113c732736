//! Core library for the customer-wrangler command line application.
//!
//! The library merges the personal, billing, and sales-offer exports of a
//! customer base into one spreadsheet report. Responsibilities are split into
//! narrow stages: source loaders and the workbook writer live under
//! [`wrangler::io`], the tabular representation inside [`wrangler::model`], the
//! join/cleanup/derivation steps in [`wrangler::transform`], and the run
//! orchestration under [`wrangler::pipeline`].

pub mod wrangler;

pub use wrangler::{PipelineError, Result, error, io, logging, model, pipeline, transform};
