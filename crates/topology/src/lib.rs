//! # topology
//!
//! Role assignment for search-engine clusters.
//!
//! Given a [`ClusterSpec`], the planner decides how many instances play each
//! operational role and which of them receive client traffic:
//!
//! - **Seed election**: exactly one seed instance, carved out of the manager
//!   pool when dedicated managers exist, otherwise out of the data pool
//! - **Role groups**: Manager, Data, Client and Ml groups sized from the
//!   remaining counts
//! - **Routing**: client nodes front the load balancer; without them, data
//!   nodes do
//!
//! ## Example
//!
//! ```
//! use topology::{ClusterSpec, NodeCounts, Role};
//!
//! let spec = ClusterSpec::with_counts(NodeCounts {
//!     manager: 3,
//!     data: 4,
//!     ..NodeCounts::default()
//! });
//!
//! let plan = topology::plan(&spec).expect("valid spec");
//! assert_eq!(plan.seed().role, Role::Seed);
//! assert_eq!(plan.group(Role::Manager).unwrap().capacity, 2);
//! assert!(plan.group(Role::Data).unwrap().is_load_balancer_target);
//! ```

#![warn(clippy::all)]

pub mod error;
pub mod planner;
pub mod types;

pub use error::{Error, ErrorCategory, Result};
pub use planner::{TopologyPlan, plan, validate};
pub use types::{
    ClassStorage, ClusterSpec, CpuArch, DASHBOARDS_PORT, DashboardsSpec, Distribution,
    InstanceProfiles, ListenerBinding, ListenerKind, NodeCounts, Role, RoleGroup, SEARCH_PORT,
};
