// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Offsync API Layer
//!
//! High-level runtime for an offline-first real-time client.
//!
//! # Overview
//!
//! The API layer wires the lower modules into two cooperating contexts:
//! - A background [`Worker`] answering requests cache-first and draining
//!   the pending queue once the host is back online
//! - Any number of foreground [`Client`]s holding a real-time connection
//!   and mirroring state for a presentation layer
//!
//! # Example
//!
//! ```ignore
//! use offsync_core::api::{Client, OffsyncConfig, Worker};
//!
//! let config = OffsyncConfig::from_env()?;
//! let (worker, _task) = Worker::new(mediator, coordinator, monitor.clone()).spawn();
//! worker.install().await?;
//!
//! let client = Client::builder(manager, worker.attach())
//!     .background_sync(Arc::new(worker.clone()))
//!     .start();
//! client.connect().await?;
//! client.send("hello").await;
//! ```
//!
//! # Module Structure
//!
//! - [`error`] - Error types for the API layer
//! - [`config`] - Configuration types
//! - [`events`] - Event system for callbacks
//! - [`state`] - State mirror for presentation layers
//! - [`worker`] - Background worker context
//! - [`client`] - Foreground client context

pub mod client;
pub mod config;
pub mod error;
pub mod events;
pub mod state;
pub mod worker;

// Error types
pub use error::{OffsyncError, OffsyncResult};

// Configuration
pub use config::OffsyncConfig;

// Events
pub use events::{CallbackHandler, ClientEvent, EventDispatcher, EventHandler};

// State
pub use state::{ClientState, LastSync, StateMirror};

// Contexts
pub use client::{Client, ClientBuilder};
pub use worker::{Worker, WorkerHandle, WorkerLifecycle};
