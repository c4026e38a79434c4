//! # API Route Modules
//!
//! - `cases`: case intake, fact updates, the generation trigger, and the
//!   status, decision and document views.

pub mod cases;
