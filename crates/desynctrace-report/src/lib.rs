//! Out-of-core report aggregation: turns a drained finding collector plus
//! fingerprint and scan timing into a serializable [`ScanReport`], and
//! renders both the JSON file and the terminal summary.

mod error;
mod model;
mod payload_view;
mod printer;
mod writer;

pub use error::ReportError;
pub use model::{FindingView, FingerprintView, ScanReport};
pub use payload_view::PayloadView;
pub use printer::{print_summary, render_text};
pub use writer::{read_json, write_json, write_text};
