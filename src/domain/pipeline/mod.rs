//! The canonical event pipeline vocabulary.
//!
//! Every platform adapter normalizes its native envelope into
//! [`CanonicalEvent`]; the ingestor reduces a canonical event to an
//! [`IngestOutcome`]. Skips are data, not errors: duplicate delivery,
//! unrelated channels, and our own bot's echoes are all expected traffic.

mod canonical;

pub use canonical::{CanonicalEvent, InboundRejection, IngestOutcome, SkipReason};
