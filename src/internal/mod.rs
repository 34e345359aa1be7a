//! Key parsing, formatting and subkey selection shared by the rpgp engine.

mod helpers;
mod policy;

pub(crate) use helpers::*;
pub(crate) use policy::*;
