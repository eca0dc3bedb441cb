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

//! Sliding-window replay protection for datagram IVs.
//!
//! The window tracks the 1024 most recent IV positions relative to the
//! newest accepted IV. Bit `k` of the bitmap corresponds to IV
//! `newest_iv - k`; a set bit means that IV has been accepted before.
//!
//! [`check`] is pure and must run before any MAC work, so replayed or
//! ancient datagrams are dropped cheaply. [`accept`] mutates and must only
//! run after the message authenticated, otherwise a forged IV could poison
//! the window.
//!
//! [`check`]: struct.AntiReplayWindow.html#method.check
//! [`accept`]: struct.AntiReplayWindow.html#method.accept

/// Number of IV positions the window can distinguish.
pub const WINDOW_BITS: usize = 1024;
const WINDOW_WORDS: usize = WINDOW_BITS / 64;

/// Sliding window over the most recently accepted datagram IVs.
#[derive(Clone)]
pub(crate) struct AntiReplayWindow {
	/// Newest accepted IV. Bit 0 of the bitmap tracks whether this exact IV
	/// has been accepted.
	newest_iv: u64,
	bitmap: [u64; WINDOW_WORDS],
}

impl AntiReplayWindow {
	pub(crate) fn new() -> Self {
		Self {
			newest_iv: 0,
			bitmap: [0u64; WINDOW_WORDS],
		}
	}

	pub(crate) fn newest_iv(&self) -> u64 {
		self.newest_iv
	}

	/// Whether `iv` would be accepted. Does not mutate.
	pub(crate) fn check(&self, iv: u64) -> bool {
		// IVs newer than anything seen are always acceptable
		if iv > self.newest_iv {
			return true;
		}

		let delta = self.newest_iv - iv;

		// Too old to have a record for
		if delta >= WINDOW_BITS as u64 {
			return false;
		}

		let delta = delta as usize;
		(self.bitmap[delta >> 6] >> (delta & 63)) & 1 == 0
	}

	/// Record `iv` as accepted. Only call after the message authenticated.
	pub(crate) fn accept(&mut self, iv: u64) {
		if iv > self.newest_iv {
			let delta = iv - self.newest_iv;

			// If it would shift out everything we have seen,
			if delta >= WINDOW_BITS as u64 {
				self.bitmap = [0u64; WINDOW_WORDS];
				self.bitmap[0] = 1;
			} else {
				let delta = delta as usize;
				let word_shift = delta >> 6;
				let bit_shift = delta & 63;

				// Shift replay window
				if bit_shift > 0 {
					let mut last = self.bitmap[WINDOW_WORDS - 1 - word_shift];
					for ii in ((word_shift + 1)..WINDOW_WORDS).rev() {
						let x = self.bitmap[ii - word_shift - 1];
						self.bitmap[ii] = (last << bit_shift) | (x >> (64 - bit_shift));
						last = x;
					}
					self.bitmap[word_shift] = last << bit_shift;
				} else {
					for ii in (word_shift..WINDOW_WORDS).rev() {
						self.bitmap[ii] = self.bitmap[ii - word_shift];
					}
				}

				// Zero the words we skipped
				for word in self.bitmap[..word_shift].iter_mut() {
					*word = 0;
				}

				// Set low bit for this IV
				self.bitmap[0] |= 1;
			}

			self.newest_iv = iv;
		} else {
			// Out-of-order IV inside the window
			let delta = (self.newest_iv - iv) as usize;
			self.bitmap[delta >> 6] |= 1u64 << (delta & 63);
		}
	}
}
