// SPDX-License-Identifier: MIT

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! orc-adapters: subprocess lifecycle (4.A) and the `Backend` abstraction
//! over external agent CLIs (4.B).

pub mod backend;
pub mod supervisor;

pub use backend::{Backend, BackendConfig, BackendError, BackendFactory, BackendKind};
pub use supervisor::{ExecuteError, ExecuteRequest, ProcessSupervisor};
