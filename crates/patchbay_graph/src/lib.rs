// SPDX-License-Identifier: MIT OR Apache-2.0
//! Reactive node-graph execution runtime.
//!
//! This crate provides a deterministic, synchronous, single-threaded
//! graph evaluator:
//! - Typed ports with plain, validating and listening flavors
//! - Directed value-carrying cables with eager push propagation
//! - Lazy pull of unset inputs through upstream `request` hooks
//! - An event-driven interface layer for presentation code
//! - Registry-driven node construction and JSON document import/export
//!
//! ## Architecture
//!
//! An [`Engine`] owns the node/interface type registries and the live
//! graph. Node semantics are [`NodeBehavior`] trait objects whose hooks
//! receive a [`NodeScope`] and may re-enter the engine: writing an
//! output recurses depth-first through every downstream `update` hook
//! before the write returns. There is no cycle detection — cyclic graphs
//! are a documented caller hazard, bounded only by the optional
//! [`PropagationLimits`].

pub mod cable;
pub mod engine;
pub mod error;
pub mod iface;
pub mod import;
pub mod node;
pub mod port;
pub mod types;

pub use cable::{Cable, CableId};
pub use engine::{Engine, NodeScope, PropagationLimits, CABLE_CONNECT, CABLE_DISCONNECT};
pub use error::GraphError;
pub use iface::{EventData, Interface, InterfaceBuilder};
pub use import::{CableSpec, GraphDoc, NodeSpec};
pub use node::{InertBehavior, Node, NodeBehavior, NodeBuilder, NodeId};
pub use port::{Port, PortDef, PortDirection, PortRef};
pub use types::{Value, ValueKind};
