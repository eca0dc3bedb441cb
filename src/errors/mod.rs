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

use core::fmt;

/// Opaque error returned by every fallible operation.
///
/// The type carries no detail on purpose: distinguishing a replayed
/// datagram from a forged one, or a bad key from a wrong mode, would hand
/// an attacker an oracle. Callers react to failure the same way regardless
/// of cause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalicoError;

impl fmt::Display for CalicoError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("calico: operation failed")
	}
}

#[cfg(feature = "safe_api")]
impl std::error::Error for CalicoError {}

#[cfg(feature = "safe_api")]
impl From<getrandom::Error> for CalicoError {
	fn from(_: getrandom::Error) -> Self {
		CalicoError
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_failure_causes_are_indistinguishable() {
		use crate::session::{Role, Session, STREAM_OVERHEAD};

		let mut session = Session::new();

		// A short key and an unkeyed-session call fail with the same value
		let bad_key = session.key(Role::Initiator, &[0u8; 16]).unwrap_err();

		let mut buffer = [0u8; 4];
		let unkeyed = session
			.stream_decrypt(&mut buffer, &[0u8; STREAM_OVERHEAD])
			.unwrap_err();

		assert_eq!(bad_key, unkeyed);
		assert_eq!(bad_key, CalicoError);
	}

	#[test]
	#[cfg(feature = "safe_api")]
	fn test_messages_reveal_nothing() {
		assert_eq!(format!("{}", CalicoError), "calico: operation failed");
		assert_eq!(format!("{:?}", CalicoError), "CalicoError");
	}

	#[test]
	#[cfg(feature = "safe_api")]
	fn test_usable_as_error_trait_object() {
		let err: Box<dyn std::error::Error> = Box::new(CalicoError);
		assert!(err.source().is_none());
	}

	#[test]
	#[cfg(feature = "safe_api")]
	fn test_from_getrandom() {
		use core::num::NonZeroU32;

		let raw = getrandom::Error::from(NonZeroU32::new(getrandom::Error::CUSTOM_START).unwrap());
		assert_eq!(CalicoError::from(raw), CalicoError);
	}
}
