//! # Decal Runtime
//!
//! Dependency-ordered asynchronous startup for the decal editor.
//!
//! Interdependent subsystems come up without race conditions by waiting
//! for named dependencies instead of sleeping for fixed delays: each
//! subsystem publishes its products into a [`init::DependencyRegistry`]
//! once ready, and waiters poll once per rendered frame through
//! [`init::Initializer`]. The [`startup`] module sequences the editor's
//! stages on top of that primitive:
//!
//! ```text
//! scene graph ─┐
//! ray caster  ─┤
//! overlays    ─┼─▶ selection engine ─▶ transform-tool ─▶ ui ─▶ library
//! orbit       ─┘                        binding        binding  (optional)
//! ```
//!
//! Failures before the optional library stage are fatal to the sequence;
//! the library stage degrades with a warning.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod init;
pub mod startup;
pub mod telemetry;

pub use init::{DependencyRegistry, FrameClock, InitError, InitResult, Initializer};
pub use startup::{initialize, EditorHandles, StartupConfig};
pub use telemetry::init_tracing;
