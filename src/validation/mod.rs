//! Validator (C2): three independent phases, input (Phase A), per-result
//! sanitation (Phase B), storage validation (Phase C), grounded on
//! `examples/original_source/orchestrator/services/data_validator.py`.
//! Every phase returns error lists rather than raising, matching the
//! "validation never panics" contract.

mod input;
mod sanitize;
mod storage;

pub use input::validate_search_input;
pub use sanitize::sanitize_raw_result;
pub use storage::validate_for_storage;

pub const MAX_TITLE_LENGTH: usize = 500;
pub const MAX_URL_LENGTH: usize = 2000;
pub const MAX_CONTENT_LENGTH: usize = 5000;
pub const MIN_DURATION_MS: u64 = 1_000;
pub const MAX_DURATION_MS: u64 = 14_400_000;
pub const MIN_QUERY_LENGTH: usize = 2;
pub const MAX_QUERY_LENGTH: usize = 200;
