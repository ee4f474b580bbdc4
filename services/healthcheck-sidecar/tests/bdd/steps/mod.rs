//! BDD step definitions for the healthcheck sidecar

pub mod lifecycle_steps;
