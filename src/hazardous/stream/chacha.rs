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
//! - `secret_key`: The secret key.
//! - `nonce`: The nonce value, a little-endian encoded 64-bit counter.
//! - `rounds`: The number of ChaCha rounds. Must be even.
//! - `initial_counter`: The initial block counter value. In most cases, this is `0`.
//! - `plaintext`: The data to be encrypted.
//! - `buffer`: In-place destination holding the ciphertext/plaintext before
//!   encryption/decryption.
//! - `dst_out`: Destination array that will hold the ciphertext/plaintext after
//!   encryption/decryption.
//!
//! This is the original ChaCha design with a 64-bit nonce and a 64-bit block
//! counter, not the IETF variant from [RFC 8439](https://tools.ietf.org/html/rfc8439).
//! The nonce here is a message counter chosen by the sender, never random.
//!
//! # Errors:
//! An error will be returned if:
//! - `rounds` is zero or odd.
//! - The length of `dst_out` is less than `plaintext`.
//! - The block counter would overflow while processing.
//!
//! # Security:
//! - It is critical for security that a given nonce is not re-used with a given
//!   key. Should this happen,
//! the security of all data that has been encrypted with that given key is
//! compromised.
//! - Functions herein do not provide any data integrity. If you need
//! data integrity, which is nearly ***always the case***, you should use the
//! [`Session`] API instead.
//! - To securely generate a strong key, use [`SecretKey::generate()`].
//!
//! # Example:
//! ```rust
//! use calico::hazardous::stream::chacha::{self, Nonce, SecretKey, CHACHA_ROUNDS};
//!
//! let secret_key = SecretKey::generate();
//! let nonce = Nonce::from(0u64.to_le_bytes());
//!
//! // Length of this message is 15
//! let message = "Data to protect".as_bytes();
//!
//! let mut dst_out_ct = [0u8; 15];
//! let mut dst_out_pt = [0u8; 15];
//!
//! chacha::encrypt(&secret_key, &nonce, CHACHA_ROUNDS, 0, message, &mut dst_out_ct)?;
//!
//! chacha::decrypt(&secret_key, &nonce, CHACHA_ROUNDS, 0, &dst_out_ct, &mut dst_out_pt)?;
//!
//! assert_eq!(dst_out_pt.as_ref(), message);
//! # Ok::<(), calico::errors::CalicoError>(())
//! ```
//! [`Session`]: ../../../session/struct.Session.html
//! [`SecretKey::generate()`]: struct.SecretKey.html
use crate::{
	endianness::{load_u32_into_le, store_u32_into_le},
	errors::CalicoError,
};
use zeroize::Zeroize;

/// The key size for ChaCha.
pub const CHACHA_KEYSIZE: usize = 32;
/// The nonce size for the 64-bit-nonce ChaCha variant.
pub const CHACHA_NONCESIZE: usize = 8;
/// The blocksize which ChaCha operates on.
pub const CHACHA_BLOCKSIZE: usize = 64;
/// The round count used for per-message encryption.
pub const CHACHA_ROUNDS: usize = 14;
/// The round count used for key expansion.
pub const CHACHA_KDF_ROUNDS: usize = 20;
/// Type for a ChaCha state represented as an array of 16 32-bit unsigned
/// integers.
type ChaChaState = [u32; 16];

/// A type to represent the secret key that ChaCha uses for encryption.
///
/// # Errors:
/// An error will be returned if:
/// - `slice` is not 32 bytes.
///
/// # Panics:
/// A panic will occur if:
/// - The OS random source fails to initialize or read from its source.
pub struct SecretKey {
	value: [u8; CHACHA_KEYSIZE],
}

impl SecretKey {
	#[must_use]
	/// Make an object from a given byte slice.
	pub fn from_slice(slice: &[u8]) -> Result<Self, CalicoError> {
		if slice.len() != CHACHA_KEYSIZE {
			return Err(CalicoError);
		}

		let mut value = [0u8; CHACHA_KEYSIZE];
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
		CHACHA_KEYSIZE
	}

	#[cfg(feature = "safe_api")]
	/// Randomly generate using a CSPRNG. Not available in `no_std` context.
	pub fn generate() -> Self {
		let mut value = [0u8; CHACHA_KEYSIZE];
		crate::util::secure_rand_bytes(&mut value).unwrap();

		Self { value }
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

impl From<[u8; CHACHA_KEYSIZE]> for SecretKey {
	fn from(bytes: [u8; CHACHA_KEYSIZE]) -> Self {
		Self { value: bytes }
	}
}

/// A type that represents the nonce that ChaCha uses, the little-endian
/// encoding of a 64-bit message counter.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Nonce {
	value: [u8; CHACHA_NONCESIZE],
}

impl Nonce {
	#[must_use]
	/// Make an object from a given byte slice.
	pub fn from_slice(slice: &[u8]) -> Result<Self, CalicoError> {
		if slice.len() != CHACHA_NONCESIZE {
			return Err(CalicoError);
		}

		let mut value = [0u8; CHACHA_NONCESIZE];
		value.copy_from_slice(slice);

		Ok(Self { value })
	}

	/// The length of the object.
	pub fn len(&self) -> usize {
		CHACHA_NONCESIZE
	}
}

impl AsRef<[u8]> for Nonce {
	fn as_ref(&self) -> &[u8] {
		self.value.as_ref()
	}
}

impl From<[u8; CHACHA_NONCESIZE]> for Nonce {
	fn from(bytes: [u8; CHACHA_NONCESIZE]) -> Self {
		Self { value: bytes }
	}
}

struct InternalState {
	state: ChaChaState,
	rounds: usize,
}

impl Drop for InternalState {
	fn drop(&mut self) {
		self.state.zeroize();
	}
}

impl InternalState {
	#[inline]
	/// ChaCha quarter round.
	fn quarter_round(state: &mut ChaChaState, x: usize, y: usize, z: usize, w: usize) {
		state[x] = state[x].wrapping_add(state[y]);
		state[w] ^= state[x];
		state[w] = state[w].rotate_left(16);

		state[z] = state[z].wrapping_add(state[w]);
		state[y] ^= state[z];
		state[y] = state[y].rotate_left(12);

		state[x] = state[x].wrapping_add(state[y]);
		state[w] ^= state[x];
		state[w] = state[w].rotate_left(8);

		state[z] = state[z].wrapping_add(state[w]);
		state[y] ^= state[z];
		state[y] = state[y].rotate_left(7);
	}

	#[inline]
	/// Performs 8 `quarter_round` function calls to process a double round.
	fn process_double_round(state: &mut ChaChaState) {
		// Perform column rounds
		Self::quarter_round(state, 0, 4, 8, 12);
		Self::quarter_round(state, 1, 5, 9, 13);
		Self::quarter_round(state, 2, 6, 10, 14);
		Self::quarter_round(state, 3, 7, 11, 15);
		// Perform diagonal rounds
		Self::quarter_round(state, 0, 5, 10, 15);
		Self::quarter_round(state, 1, 6, 11, 12);
		Self::quarter_round(state, 2, 7, 8, 13);
		Self::quarter_round(state, 3, 4, 9, 14);
	}

	#[must_use]
	#[inline]
	/// Initialize a ChaCha state with a `secret_key` and `nonce`.
	fn init(secret_key: &SecretKey, nonce: &Nonce, rounds: usize) -> Result<Self, CalicoError> {
		if rounds == 0 || rounds % 2 != 0 {
			return Err(CalicoError);
		}

		let mut internal_state = Self {
			state: [0u32; 16],
			rounds,
		};

		// Setup state with constants
		internal_state.state[0] = 0x6170_7865_u32;
		internal_state.state[1] = 0x3320_646e_u32;
		internal_state.state[2] = 0x7962_2d32_u32;
		internal_state.state[3] = 0x6b20_6574_u32;

		load_u32_into_le(
			secret_key.unprotected_as_bytes(),
			&mut internal_state.state[4..12],
		);

		// Words 12..14 hold the 64-bit block counter, set per block.
		load_u32_into_le(nonce.as_ref(), &mut internal_state.state[14..16]);

		Ok(internal_state)
	}

	#[must_use]
	#[inline(always)]
	/// Process a keystream block at a given 64-bit block counter.
	fn process_block(&mut self, block_count: u64) -> ChaChaState {
		self.state[12] = block_count as u32;
		self.state[13] = (block_count >> 32) as u32;

		let mut working_state = self.state;

		for _ in 0..(self.rounds / 2) {
			Self::process_double_round(&mut working_state);
		}

		working_state
			.iter_mut()
			.zip(self.state.iter())
			.for_each(|(a, b)| *a = a.wrapping_add(*b));

		working_state
	}

	#[must_use]
	#[inline(always)]
	/// Serialize a keystream block of 16 u32's, into a little-endian byte
	/// array.
	fn serialize_block(
		src_block: &ChaChaState,
		dst_block: &mut [u8],
	) -> Result<(), CalicoError> {
		if dst_block.len() != CHACHA_BLOCKSIZE {
			return Err(CalicoError);
		}

		store_u32_into_le(src_block, dst_block);

		Ok(())
	}
}

#[must_use]
/// XOR the ChaCha keystream into `buffer` in place.
pub fn encrypt_in_place(
	secret_key: &SecretKey,
	nonce: &Nonce,
	rounds: usize,
	initial_counter: u64,
	buffer: &mut [u8],
) -> Result<(), CalicoError> {
	let mut chacha_state = InternalState::init(secret_key, nonce, rounds)?;
	let mut keystream_state: ChaChaState = [0u32; 16];
	let mut keystream_block = [0u8; CHACHA_BLOCKSIZE];

	for (counter, buffer_block) in buffer.chunks_mut(CHACHA_BLOCKSIZE).enumerate() {
		match initial_counter.checked_add(counter as u64) {
			Some(block_counter) => {
				keystream_state = chacha_state.process_block(block_counter);
				InternalState::serialize_block(&keystream_state, &mut keystream_block)?;

				for (buffer_byte, keystream_byte) in
					buffer_block.iter_mut().zip(keystream_block.iter())
				{
					*buffer_byte ^= keystream_byte;
				}
			}
			None => return Err(CalicoError),
		}
	}

	keystream_state.zeroize();
	keystream_block.zeroize();

	Ok(())
}

#[must_use]
/// ChaCha encryption with a 64-bit nonce and a selectable round count.
pub fn encrypt(
	secret_key: &SecretKey,
	nonce: &Nonce,
	rounds: usize,
	initial_counter: u64,
	plaintext: &[u8],
	dst_out: &mut [u8],
) -> Result<(), CalicoError> {
	if dst_out.len() < plaintext.len() {
		return Err(CalicoError);
	}

	dst_out[..plaintext.len()].copy_from_slice(plaintext);

	encrypt_in_place(
		secret_key,
		nonce,
		rounds,
		initial_counter,
		&mut dst_out[..plaintext.len()],
	)
}

#[must_use]
/// ChaCha decryption with a 64-bit nonce and a selectable round count.
pub fn decrypt(
	secret_key: &SecretKey,
	nonce: &Nonce,
	rounds: usize,
	initial_counter: u64,
	ciphertext: &[u8],
	dst_out: &mut [u8],
) -> Result<(), CalicoError> {
	encrypt(secret_key, nonce, rounds, initial_counter, ciphertext, dst_out)
}

#[must_use]
/// ChaCha block function returning a serialized keystream block.
pub fn keystream_block(
	secret_key: &SecretKey,
	nonce: &Nonce,
	rounds: usize,
	counter: u64,
) -> Result<[u8; CHACHA_BLOCKSIZE], CalicoError> {
	let mut chacha_state = InternalState::init(secret_key, nonce, rounds)?;
	let mut keystream_block = [0u8; CHACHA_BLOCKSIZE];
	let mut keystream_state = chacha_state.process_block(counter);

	InternalState::serialize_block(&keystream_state, &mut keystream_block)?;

	keystream_state.zeroize();

	Ok(keystream_block)
}


// Testing private functions in the module.
#[cfg(test)]
mod private {
	use super::*;

	mod test_init_state {
		use super::*;

		#[test]
		fn test_rounds() {
			let sk = SecretKey::from_slice(&[0u8; 32]).unwrap();
			let nonce = Nonce::from_slice(&[0u8; 8]).unwrap();

			assert!(InternalState::init(&sk, &nonce, 0).is_err());
			assert!(InternalState::init(&sk, &nonce, 7).is_err());
			assert!(InternalState::init(&sk, &nonce, 13).is_err());
			assert!(InternalState::init(&sk, &nonce, 14).is_ok());
			assert!(InternalState::init(&sk, &nonce, 20).is_ok());
		}
	}

	mod test_serialize_block {
		use super::*;

		#[test]
		fn test_dst_out_length() {
			let mut chacha_state = InternalState::init(
				&SecretKey::from_slice(&[0u8; 32]).unwrap(),
				&Nonce::from_slice(&[0u8; 8]).unwrap(),
				CHACHA_ROUNDS,
			)
			.unwrap();

			let src = chacha_state.process_block(0);

			let mut dst_small = [0u8; CHACHA_BLOCKSIZE - 1];
			let mut dst_exact = [0u8; CHACHA_BLOCKSIZE];
			let mut dst_big = [0u8; CHACHA_BLOCKSIZE + 1];

			assert!(InternalState::serialize_block(&src, &mut dst_small).is_err());
			assert!(InternalState::serialize_block(&src, &mut dst_big).is_err());
			assert!(InternalState::serialize_block(&src, &mut dst_exact).is_ok());
		}
	}
}
