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

//! # Parameters:
//! - `secret_key`: The 16-byte MAC key.
//! - `data`: The message to authenticate.
//! - `ad`: A 64-bit additional-data word bound into the tag. Calico passes
//!   the message IV here, so a tag is only valid for the IV it was produced
//!   under.
//!
//! # Security:
//! - SipHash-2-4 produces a 64-bit tag. This is sufficient for the
//! per-message, per-key authentication done here, but it is not a
//! general-purpose collision-resistant hash.
//! - The `ad` word is compressed like an extra message word, so two messages
//! that only differ in `ad` never share a tag except by chance.
//!
//! # Example:
//! ```rust
//! use calico::hazardous::mac::siphash::{self, SecretKey};
//!
//! let key = SecretKey::from_slice(&[0x24; 16])?;
//!
//! let tag = siphash::siphash24(&key, b"authenticate me", 7);
//! assert_eq!(tag, siphash::siphash24(&key, b"authenticate me", 7));
//! assert_ne!(tag, siphash::siphash24(&key, b"authenticate me", 8));
//! # Ok::<(), calico::errors::CalicoError>(())
//! ```
use crate::{endianness::load_u64_le, errors::CalicoError};
use zeroize::Zeroize;

/// The key size for SipHash-2-4.
pub const SIPHASH_KEYSIZE: usize = 16;

/// A type to represent the secret key that SipHash-2-4 uses for
/// authentication.
///
/// # Errors:
/// An error will be returned if:
/// - `slice` is not 16 bytes.
pub struct SecretKey {
	value: [u8; SIPHASH_KEYSIZE],
}

impl SecretKey {
	#[must_use]
	/// Make an object from a given byte slice.
	pub fn from_slice(slice: &[u8]) -> Result<Self, CalicoError> {
		if slice.len() != SIPHASH_KEYSIZE {
			return Err(CalicoError);
		}

		let mut value = [0u8; SIPHASH_KEYSIZE];
		value.copy_from_slice(slice);

		Ok(Self { value })
	}

	#[inline]
	/// Return the object as byte slice. __**Warning**__: Should not be used
	/// unless strictly needed. This __**breaks protections**__ that the type
	/// implements.
	pub fn unprotected_as_bytes(&self) -> &[u8] {
		self.value.as_ref()
	}

	/// The length of the object.
	pub fn len(&self) -> usize {
		SIPHASH_KEYSIZE
	}
}

impl Drop for SecretKey {
	fn drop(&mut self) {
		self.value.zeroize();
	}
}

impl PartialEq for SecretKey {
	fn eq(&self, other: &Self) -> bool {
		use subtle::ConstantTimeEq;
		self.value.ct_eq(&other.value).unwrap_u8() == 1
	}
}

impl Eq for SecretKey {}

impl core::fmt::Debug for SecretKey {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		write!(f, "SecretKey {{***OMITTED***}}")
	}
}

#[inline(always)]
fn sip_round(v0: &mut u64, v1: &mut u64, v2: &mut u64, v3: &mut u64) {
	*v0 = v0.wrapping_add(*v1);
	*v2 = v2.wrapping_add(*v3);
	*v1 = v1.rotate_left(13) ^ *v0;
	*v3 = v3.rotate_left(16) ^ *v2;
	*v0 = v0.rotate_left(32);

	*v2 = v2.wrapping_add(*v1);
	*v0 = v0.wrapping_add(*v3);
	*v1 = v1.rotate_left(17) ^ *v2;
	*v3 = v3.rotate_left(21) ^ *v0;
	*v2 = v2.rotate_left(32);
}

#[inline(always)]
/// Compress one 64-bit word: two SipRounds between the v3/v0 injections.
fn compress(v0: &mut u64, v1: &mut u64, v2: &mut u64, v3: &mut u64, word: u64) {
	*v3 ^= word;
	sip_round(v0, v1, v2, v3);
	sip_round(v0, v1, v2, v3);
	*v0 ^= word;
}

#[must_use]
/// SipHash-2-4 over `data` with a 64-bit additional-data word.
pub fn siphash24(secret_key: &SecretKey, data: &[u8], ad: u64) -> u64 {
	let key = secret_key.unprotected_as_bytes();
	let k0 = load_u64_le(&key[..8]);
	let k1 = load_u64_le(&key[8..]);

	// Mix the key across the initial state
	let mut v0 = k0 ^ 0x736f_6d65_7073_6575;
	let mut v1 = k1 ^ 0x646f_7261_6e64_6f6d;
	let mut v2 = k0 ^ 0x6c79_6765_6e65_7261;
	let mut v3 = k1 ^ 0x7465_6462_7974_6573;

	let mut chunks = data.chunks_exact(8);
	for chunk in chunks.by_ref() {
		compress(&mut v0, &mut v1, &mut v2, &mut v3, load_u64_le(chunk));
	}

	// Bind the additional data as one extra message word
	compress(&mut v0, &mut v1, &mut v2, &mut v3, ad);

	// Mix the last 0..7 bytes with the length
	let mut last = (data.len() as u64) << 56;
	for (shift, byte) in chunks.remainder().iter().enumerate() {
		last |= u64::from(*byte) << (8 * shift as u64);
	}
	compress(&mut v0, &mut v1, &mut v2, &mut v3, last);

	// Finalization
	v2 ^= 0xff;
	sip_round(&mut v0, &mut v1, &mut v2, &mut v3);
	sip_round(&mut v0, &mut v1, &mut v2, &mut v3);
	sip_round(&mut v0, &mut v1, &mut v2, &mut v3);
	sip_round(&mut v0, &mut v1, &mut v2, &mut v3);

	(v0 ^ v1) ^ (v2 ^ v3)
}
