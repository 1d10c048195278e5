// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! HTTP transport for communicating with the Fibaro hub.
//!
//! - [`RestClient`]: authenticated GET/POST requests against the API root,
//!   JSON decoding, per-call timeouts and cancellation of in-flight requests

mod rest;

pub use rest::RestClient;
