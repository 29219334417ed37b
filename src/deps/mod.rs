//! Dependency registry: upstream services this instance reports as edges.
//!
//! Dependencies are declared by URL (`http://host:port/prefix`) and stored in
//! resolved form as [`DependencyKey`]s, so the collector keys dependency edges
//! by IP the same way it keys machines.

pub mod registry;
pub mod resolve;
pub mod types;

pub use registry::DependencyRegistry;
pub use resolve::{parse_dependency_url, resolve_dependency, DependencyUrl};
pub use types::DependencyKey;
