//! Security utilities: allowlist input validation.

pub mod input;
