//! Kubernetes log source for levelwatch
//!
//! This crate resolves cluster credentials, looks up the target pod and opens
//! its log stream as a sequence of text lines.

mod client;
mod stream;

pub use client::{KubeClient, TailOptions};
pub use stream::LogLines;

// Re-export types that are used in our public API
pub use levelwatch_types::{ContainerInfo, PodInfo, PodStatus};
