//! Source resolution for vault resources.
//!
//! Turns web URLs into [`Address`]es describing what to fetch:
//! - Repository roots (`https://github.com/org/repo`)
//! - Folders (`.../tree/<branch>/<path>`)
//! - Single files, including `SKILL.md` markers (`.../blob/<branch>/<path>`)

mod resolver;
mod spec;

pub use resolver::{AddressResolver, DEFAULT_HOST};
pub use spec::{Address, clone_url};

#[cfg(test)]
mod tests;
