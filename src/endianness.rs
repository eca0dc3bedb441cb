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

//! Little-endian packing helpers shared by the cipher, the MAC and the
//! wire format. Everything multi-byte in calico is little-endian: ChaCha
//! state words, SipHash message words and the 64-bit tags on the wire.
//!
//! All helpers panic on a length mismatch; callers size their buffers from
//! compile-time constants.

/// Read one `u64` from an 8-byte little-endian slice.
#[inline]
pub fn load_u64_le(src: &[u8]) -> u64 {
	let mut bytes = [0u8; 8];
	// Panics unless `src` is exactly 8 bytes
	bytes.copy_from_slice(src);

	u64::from_le_bytes(bytes)
}

/// Unpack `src` into `dst` as little-endian `u32` words. `src` must be
/// exactly `4 * dst.len()` bytes.
#[inline]
pub fn load_u32_into_le(src: &[u8], dst: &mut [u32]) {
	assert_eq!(src.len(), dst.len() * 4);

	for (word, chunk) in dst.iter_mut().zip(src.chunks_exact(4)) {
		let mut bytes = [0u8; 4];
		bytes.copy_from_slice(chunk);
		*word = u32::from_le_bytes(bytes);
	}
}

/// Pack the `u32` words of `src` into `dst` little-endian. `dst` must be
/// exactly `4 * src.len()` bytes.
#[inline]
pub fn store_u32_into_le(src: &[u32], dst: &mut [u8]) {
	assert_eq!(dst.len(), src.len() * 4);

	for (chunk, word) in dst.chunks_exact_mut(4).zip(src.iter()) {
		chunk.copy_from_slice(&word.to_le_bytes());
	}
}

/// Pack the `u64` words of `src` into `dst` little-endian. `dst` must be
/// exactly `8 * src.len()` bytes.
#[inline]
pub fn store_u64_into_le(src: &[u64], dst: &mut [u8]) {
	assert_eq!(dst.len(), src.len() * 8);

	for (chunk, word) in dst.chunks_exact_mut(8).zip(src.iter()) {
		chunk.copy_from_slice(&word.to_le_bytes());
	}
}
