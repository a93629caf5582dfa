//! Report renderers for license scan results.
//!
//! - [`terminal`]: colored summary box and tables; respects `--quiet`.
//! - JSON output is plain `serde_json` over the result models and lives in `main`.

pub mod terminal;
