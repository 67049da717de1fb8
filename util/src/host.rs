//! Host platform utility functions

use std::{env, path::PathBuf};

/// Name of the environment variable pointing at the software root.
pub const SW_ROOT_ENV_VAR: &str = "LF_SW_ROOT";

/// Get the root directory of the software from the `LF_SW_ROOT` environment
/// variable.
pub fn get_lf_sw_root() -> Result<PathBuf, env::VarError> {
    env::var(SW_ROOT_ENV_VAR).map(PathBuf::from)
}
