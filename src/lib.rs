//! rollsift - turns registry rolls of licensed professionals into
//! deduplicated, enriched and scored contact records.
//!
//! Pages come in through a [`document::Document`], are read by one or more
//! [`extraction::ExtractionStrategy`]s, filtered by the
//! [`classify::NoiseClassifier`], collapsed by [`dedup::dedup`], enriched
//! by [`enrich::Enricher`] and scored by [`scoring::Scorer`]. The
//! [`pipeline::Pipeline`] wires these stages together.

pub mod classify;
pub mod config;
pub mod dedup;
pub mod document;
pub mod enrich;
pub mod extraction;
pub mod models;
pub mod ocr;
pub mod output;
pub mod pipeline;
pub mod scoring;
