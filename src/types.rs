// src/types.rs

//! Shared name aliases used across the engine.

/// Canonical task name type.
pub type TaskName = String;

/// Graph node key: a task name or an artifact label.
pub type Label = String;

/// Content fingerprint (hex digest) or task fingerprint (`counter|timestamp`).
pub type Fingerprint = String;
