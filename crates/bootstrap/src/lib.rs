//! # bootstrap
//!
//! First-boot plans for search-engine nodes.
//!
//! For every role group the [`Composer`] produces a [`BootstrapPlan`]: an
//! ordered list of package installs, file writes and commands that turn a
//! bare instance into a running node of that role.
//!
//! ## Core Concepts
//!
//! - **ConfigDocument**: dotted-key engine config, layered base + role overlay
//! - **ConfigTemplates**: base documents and overlays, injected by the caller
//! - **BootstrapPlan**: the composed step list, rendered to a bash script or
//!   run directly by the executor
//! - **FailurePolicy**: whether optional steps may fail without aborting
//!
//! ## Example
//!
//! ```
//! use bootstrap::{ComposeOptions, Composer, ConfigTemplates};
//! use topology::{ClusterSpec, NodeCounts, Role};
//!
//! let spec = ClusterSpec::with_counts(NodeCounts {
//!     manager: 3,
//!     data: 4,
//!     ..NodeCounts::default()
//! });
//! let topology = topology::plan(&spec).unwrap();
//!
//! let templates = ConfigTemplates::builtin().unwrap();
//! let composer = Composer::new(&templates, ComposeOptions::default());
//! let plan = composer.compose(topology.seed(), &spec).unwrap();
//!
//! assert_eq!(plan.role(), Role::Seed);
//! let script = bootstrap::script::render(&plan);
//! assert!(script.starts_with("#!/bin/bash"));
//! ```
//!
//! ## Provider Traits
//!
//! - [`StepRunner`]: runs a step's shell command on the instance
//! - [`ProgressCallback`]: receives progress updates during execution

pub mod composer;
pub mod context;
pub mod document;
pub mod error;
pub mod executor;
pub mod heap;
pub mod script;
pub mod templates;
pub mod types;

pub use composer::{Composer, SEED_NODE_NAME, compose};
pub use context::{CommandOutput, NoProgress, ProgressCallback, StepRunner};
pub use document::{ConfigDocument, ConfigValue};
pub use error::{Error, ErrorCategory, Result, StepWarning};
pub use executor::{ExecuteOptions, ExecuteSummary, execute};
pub use heap::{MAX_HEAP_GIB, heap_size_gib};
pub use templates::{ConfigTemplates, overlay_key};
pub use types::{
    BootstrapPlan, BootstrapStep, ComposeOptions, Criticality, FailurePolicy, InstallLayout,
    StepAction, StepKind, WriteMode,
};
