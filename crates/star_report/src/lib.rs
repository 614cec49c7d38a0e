//! Report emission for STA runs: per-mode text indexes and the handoff payload.
//!
//! The emitter reads a finished [`CategoryTree`](star_timing::CategoryTree)
//! and writes:
//!
//! - one `<mode>_<delay>.idx` text index per declared mode and delay type;
//! - `handoff/miscInfo.yaml`, `handoff/pvtInfo.yaml`, and
//!   `handoff/timingInfo.yaml` for the external publisher.
//!
//! The handoff documents can be read back with [`parse_document`] and
//! [`tree_from_timing_info`].

#![warn(missing_docs)]

pub mod document;
pub mod error;
pub mod handoff;
pub mod output;
pub mod publish;
pub mod text_index;

pub use document::{parse_document, render_document, Document, HandoffValue};
pub use error::EmitError;
pub use handoff::{
    misc_info, pvt_info, strip_wildcards, timing_info, tree_from_timing_info, HandoffPayload,
    HANDOFF_DIR, MISC_INFO_FILE, PVT_INFO_FILE, TIMING_INFO_FILE,
};
pub use output::prepare_output_dir;
pub use publish::run_publisher;
pub use text_index::{index_file_name, render_index, write_indexes, INDEX_EXTENSION};
