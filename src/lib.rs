// MIT License

// Copyright (c) 2025-2026 The calico Developers

// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:

// The above copyright notice and this permission notice shall be included in
// all copies or substantial portions of the Software.

// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
// SOFTWARE.

//! ### Usage:
//! calico turns a single 32-byte shared secret into two bidirectional
//! secure channels: a datagram channel (unordered, lossy, replay-protected)
//! and a stream channel (ordered, lossless). See the [`session`] module for
//! the main API.
//!
//! ```rust
//! use calico::session::{Role, Session, STREAM_OVERHEAD};
//!
//! let shared_key = [0x42u8; 32];
//!
//! let mut client = Session::new();
//! let mut server = Session::new();
//! client.key(Role::Initiator, &shared_key)?;
//! server.key(Role::Responder, &shared_key)?;
//!
//! let mut buffer = *b"hello over TCP";
//! let mut overhead = [0u8; STREAM_OVERHEAD];
//! client.stream_encrypt(b"hello over TCP", &mut buffer, &mut overhead)?;
//! server.stream_decrypt(&mut buffer, &overhead)?;
//!
//! assert_eq!(&buffer, b"hello over TCP");
//! # Ok::<(), calico::errors::CalicoError>(())
//! ```
//!
//! ### Security:
//! The 32-byte session key must be unique per session and is typically the
//! output of a key agreement protocol. calico provides no key agreement, no
//! rekeying and no forward secrecy; when a session is done, tear it down.
//!
//! [`session`]: session/index.html

#![doc(html_root_url = "https://docs.rs/calico/0.5.0")]
#![cfg_attr(not(feature = "safe_api"), no_std)]
#![forbid(unsafe_code)]
#![deny(missing_docs)]

#[cfg(all(test, feature = "safe_api"))]
#[macro_use]
extern crate quickcheck;

/// Little-endian conversion helpers.
mod endianness;

/// Errors.
pub mod errors;

/// Low-level building blocks. The [`session`] API composes these safely;
/// misuse of the pieces here, IV reuse above all, voids every guarantee.
///
/// [`session`]: ../session/index.html
pub mod hazardous;

/// Replay protection for the datagram channel.
mod replay;

/// Authenticated encryption sessions. This is the main API.
pub mod session;

/// Utilities.
pub mod util;
