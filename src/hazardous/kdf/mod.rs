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
//! - `secret_key`: The 32-byte session key to expand.
//! - `okm_out`: Destination buffer for the derived key material. The amount
//!   of bytes to derive is implied by the length of `okm_out`.
//!
//! Key expansion is the 20-round ChaCha keystream under the session key with
//! an all-zero nonce and block counter starting at zero. Both sides of a
//! session derive the same output and then take opposite halves of it, so
//! the expansion itself is direction-agnostic.
//!
//! # Errors:
//! An error will be returned if:
//! - `okm_out` is empty.
//!
//! # Security:
//! - The zero nonce is safe here because a session key must be unique per
//! session and is used for nothing but this one expansion.
//!
//! # Example:
//! ```rust
//! use calico::hazardous::kdf;
//! use calico::hazardous::stream::chacha::SecretKey;
//!
//! let session_key = SecretKey::generate();
//!
//! let mut okm = [0u8; 192];
//! kdf::expand_key(&session_key, &mut okm)?;
//! # Ok::<(), calico::errors::CalicoError>(())
//! ```
use crate::errors::CalicoError;
use crate::hazardous::stream::chacha::{self, SecretKey, CHACHA_BLOCKSIZE, CHACHA_KDF_ROUNDS};
use zeroize::Zeroize;

#[must_use]
/// Fill `okm_out` with key material expanded from `secret_key`.
pub fn expand_key(secret_key: &SecretKey, okm_out: &mut [u8]) -> Result<(), CalicoError> {
	if okm_out.is_empty() {
		return Err(CalicoError);
	}

	let nonce = chacha::Nonce::from([0u8; 8]);
	let mut keystream_block = [0u8; CHACHA_BLOCKSIZE];

	for (counter, okm_block) in okm_out.chunks_mut(CHACHA_BLOCKSIZE).enumerate() {
		keystream_block =
			chacha::keystream_block(secret_key, &nonce, CHACHA_KDF_ROUNDS, counter as u64)?;
		okm_block.copy_from_slice(&keystream_block[..okm_block.len()]);
	}

	keystream_block.zeroize();

	Ok(())
}
