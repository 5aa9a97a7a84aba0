//! # Repositories
//!
//! Process-wide stores of resources that are expensive to discover or load, shared by every
//! document and every batch worker.

pub mod fonts;
