// THEORY:
// This file is the main entry point for the `pca_engine` library crate.
// It follows the standard Rust convention of using `lib.rs` to define the
// public API that will be exposed to external consumers (like the
// `compression_tester` binary).
//
// The crate splits into two independent numerical components with no shared
// state: the channel PCA engine (`core_modules` + `pipeline` + `worker`),
// which compresses images by eigendecomposing per-channel covariance
// matrices off the caller's thread, and the interactive 2D solver
// (`core_modules::plane_solver`), which recomputes a closed-form 2x2
// eigensolution synchronously as points arrive. The `core_modules` numeric
// layers are exported for callers that want the pieces, while `pipeline`
// and `worker` are the intended high-level surfaces.

pub mod core_modules;
pub mod error;
pub mod pipeline;
pub mod worker;

pub use error::{PcaError, Result};
