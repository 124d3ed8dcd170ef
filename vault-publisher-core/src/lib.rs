#![doc = "vault-publisher-core: core logic library for vault-publisher."]

//! This crate contains all publishing, reconciliation and selection logic for
//! vault-publisher. Network transport and local storage are abstracted behind
//! the traits in [`contract`]; the CLI crate provides the real implementations.
//!
//! # Usage
//! Add this as a dependency for all shared selection, path, publish and
//! prune code.

pub mod contract;
pub mod frontmatter;
pub mod paths;
pub mod prune;
pub mod publish;
pub mod select;
pub mod settings;
pub mod workflow;
