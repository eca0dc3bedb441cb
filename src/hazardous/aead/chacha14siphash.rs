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
//! - `channel_key`: The 48-byte one-way channel key: a 32-byte ChaCha cipher
//!   key followed by a 16-byte SipHash MAC key.
//! - `iv`: The 64-bit message counter. Encoded little-endian as the ChaCha
//!   nonce and bound into the MAC tag as additional data.
//! - `plaintext`: The data to be encrypted.
//! - `dst_out`: Destination for the ciphertext. Must be at least
//!   `plaintext.len()` bytes; the ciphertext is exactly `plaintext.len()`
//!   bytes.
//! - `buffer`: Ciphertext, verified and decrypted in place.
//! - `provided_tag`: The 64-bit MAC tag received with the message.
//!
//! Encrypt-then-MAC: the keystream of 14-round ChaCha is XORed over the
//! plaintext and SipHash-2-4 authenticates the resulting ciphertext together
//! with the IV. Zero-length messages are valid; their tag still binds the IV.
//!
//! # Errors:
//! An error will be returned if:
//! - The length of `dst_out` is less than `plaintext`.
//! - The provided tag does not match the computed tag (`open` only).
//!
//! # Security:
//! - It is critical for security that a given `iv` is not re-used with a
//!   given key. Should this happen,
//! the security of all data that has been encrypted with that given key is
//! compromised.
//! - `open` never produces plaintext for a message that fails
//!   authentication; the buffer is left untouched in that case.
//! - The tag comparison is constant time in the tag bits.
//!
//! # Example:
//! ```rust
//! use calico::hazardous::aead::chacha14siphash::{self, ChannelKey};
//!
//! let channel_key = ChannelKey::from_slice(&[0x3f; 48])?;
//!
//! let message = "Data to protect".as_bytes();
//! let mut buffer = [0u8; 15];
//!
//! let tag = chacha14siphash::seal(&channel_key, 0, message, &mut buffer)?;
//! chacha14siphash::open(&channel_key, 0, &mut buffer, tag)?;
//!
//! assert_eq!(buffer.as_ref(), message);
//! # Ok::<(), calico::errors::CalicoError>(())
//! ```
use crate::errors::CalicoError;
use crate::hazardous::mac::siphash::{self, SIPHASH_KEYSIZE};
use crate::hazardous::stream::chacha::{self, CHACHA_KEYSIZE, CHACHA_ROUNDS};
use zeroize::Zeroize;

/// The size of a one-way channel key: cipher key followed by MAC key.
pub const CHANNEL_KEYSIZE: usize = CHACHA_KEYSIZE + SIPHASH_KEYSIZE;

/// A type to represent the one-way channel key used to protect a single
/// direction of a single channel.
///
/// The first 32 bytes key the ChaCha cipher and the remaining 16 bytes key
/// the SipHash-2-4 MAC.
///
/// # Errors:
/// An error will be returned if:
/// - `slice` is not 48 bytes.
pub struct ChannelKey {
	value: [u8; CHANNEL_KEYSIZE],
}

impl ChannelKey {
	#[must_use]
	/// Make an object from a given byte slice.
	pub fn from_slice(slice: &[u8]) -> Result<Self, CalicoError> {
		if slice.len() != CHANNEL_KEYSIZE {
			return Err(CalicoError);
		}

		let mut value = [0u8; CHANNEL_KEYSIZE];
		value.copy_from_slice(slice);

		Ok(Self { value })
	}

	/// The length of the object.
	pub fn len(&self) -> usize {
		CHANNEL_KEYSIZE
	}

	fn cipher_key(&self) -> Result<chacha::SecretKey, CalicoError> {
		chacha::SecretKey::from_slice(&self.value[..CHACHA_KEYSIZE])
	}

	fn mac_key(&self) -> Result<siphash::SecretKey, CalicoError> {
		siphash::SecretKey::from_slice(&self.value[CHACHA_KEYSIZE..])
	}
}

impl Drop for ChannelKey {
	fn drop(&mut self) {
		self.value.zeroize();
	}
}

impl PartialEq for ChannelKey {
	fn eq(&self, other: &Self) -> bool {
		use subtle::ConstantTimeEq;
		self.value.ct_eq(&other.value).unwrap_u8() == 1
	}
}

impl Eq for ChannelKey {}

impl core::fmt::Debug for ChannelKey {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		write!(f, "ChannelKey {{***OMITTED***}}")
	}
}

#[inline]
fn nonce_from_iv(iv: u64) -> chacha::Nonce {
	chacha::Nonce::from(iv.to_le_bytes())
}

#[must_use]
/// Encrypt `plaintext` into `dst_out` and return the MAC tag over the
/// ciphertext and the IV.
pub fn seal(
	channel_key: &ChannelKey,
	iv: u64,
	plaintext: &[u8],
	dst_out: &mut [u8],
) -> Result<u64, CalicoError> {
	if dst_out.len() < plaintext.len() {
		return Err(CalicoError);
	}

	chacha::encrypt(
		&channel_key.cipher_key()?,
		&nonce_from_iv(iv),
		CHACHA_ROUNDS,
		0,
		plaintext,
		dst_out,
	)?;

	Ok(siphash::siphash24(
		&channel_key.mac_key()?,
		&dst_out[..plaintext.len()],
		iv,
	))
}

#[must_use]
/// Verify the MAC tag over `buffer` and the IV, then decrypt `buffer` in
/// place. On mismatch the buffer is not modified.
pub fn open(
	channel_key: &ChannelKey,
	iv: u64,
	buffer: &mut [u8],
	provided_tag: u64,
) -> Result<(), CalicoError> {
	let expected_tag = siphash::siphash24(&channel_key.mac_key()?, buffer, iv);

	// Constant-time in the tag bits: a 64-bit XOR folded into a 32-bit OR,
	// with a single branch on the final fold.
	let delta = expected_tag ^ provided_tag;
	let z = ((delta >> 32) as u32) | (delta as u32);
	if z != 0 {
		return Err(CalicoError);
	}

	chacha::encrypt_in_place(
		&channel_key.cipher_key()?,
		&nonce_from_iv(iv),
		CHACHA_ROUNDS,
		0,
		buffer,
	)
}
