//! CLI subcommands.

pub(crate) mod validate;
