//! bonesketch-trim-core: rewrites pose snapshots for another rig by renaming
//! bones through a CSV table and dropping unwanted keys.

pub mod error;
pub mod table;
pub mod trim;

pub use error::TrimError;
pub use table::{ExcludeKeys, RenameTable};
pub use trim::{strip_keys, trim_dir, trim_document, trim_file, TrimOptions, TrimSummary};
