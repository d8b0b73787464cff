pub mod policy;

pub use policy::{Policy, PolicyEngine, PolicyKind, PolicyResult};
