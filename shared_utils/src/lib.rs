//! Small helpers shared by the workspace binaries.

pub mod env;

pub use env::{MissingEnvVarError, get_env_var, optional_env_var};
