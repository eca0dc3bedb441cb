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

//! Authenticated encryption sessions over a shared secret.
//!
//! # Use case:
//! A [`Session`] turns one 32-byte shared secret into two independent,
//! bidirectional secure channels between an Initiator and a Responder: a
//! datagram channel for unordered, lossy transports (UDP-like) and a stream
//! channel for ordered, lossless transports (TCP-like).
//!
//! Datagram messages carry 11 bytes of overhead and are protected against
//! replay and reordering by a 1024-position sliding window. Stream messages
//! carry 8 bytes of overhead; their sequence number is implicit, so any
//! loss, reorder or replay on the stream channel surfaces as an
//! authentication failure.
//!
//! # About:
//! - Each side of the conversation must take a unique [`Role`]. If both
//! sides key with the same role, the first decryption fails.
//! - A session key must be unique per session. It is typically produced by
//! a key agreement protocol; this crate does not provide one.
//! - Use one session per peer, for both directions. Do not use separate
//! sessions to transmit and to receive under the same key.
//! - A [`Session`] is not thread-safe; all calls into one session must be
//! serialized by the caller. Independent sessions are fine on independent
//! threads.
//!
//! # Errors:
//! An error will be returned if:
//! - The session is not keyed, or not keyed for the requested channel.
//! - The session key is not 32 bytes.
//! - The destination buffer is shorter than the plaintext.
//! - A send counter is exhausted.
//! - A datagram was replayed, too old, or tampered with.
//! - A stream message arrived out of order or tampered with.
//!
//! A failed decryption reports a single opaque error and leaves the session
//! state and the message buffer untouched.
//!
//! # Security:
//! - Key material is erased when the session is torn down or dropped.
//! - It is important to check the return value of every operation to avoid
//! active attacks.
//!
//! # Example:
//! ```rust
//! use calico::session::{Role, Session, DATAGRAM_OVERHEAD};
//!
//! // Both sides agreed on this key out of band.
//! let shared_key = [0x07u8; 32];
//!
//! let mut initiator = Session::new();
//! let mut responder = Session::new();
//! initiator.key(Role::Initiator, &shared_key)?;
//! responder.key(Role::Responder, &shared_key)?;
//!
//! let message = b"Attack at dawn";
//! let mut ciphertext = [0u8; 14];
//! let mut overhead = [0u8; DATAGRAM_OVERHEAD];
//!
//! initiator.datagram_encrypt(message, &mut ciphertext, &mut overhead)?;
//! responder.datagram_decrypt(&mut ciphertext, &overhead)?;
//!
//! assert_eq!(ciphertext.as_ref(), message.as_ref());
//! # Ok::<(), calico::errors::CalicoError>(())
//! ```
//! [`Session`]: struct.Session.html
//! [`Role`]: enum.Role.html
use crate::endianness::{load_u64_le, store_u64_into_le};
use crate::errors::CalicoError;
use crate::hazardous::aead::chacha14siphash::{self, ChannelKey, CHANNEL_KEYSIZE};
use crate::hazardous::kdf;
use crate::hazardous::stream::chacha;
use crate::replay::AntiReplayWindow;
use zeroize::Zeroize;

/// The size of a session key.
pub const SESSION_KEYSIZE: usize = 32;
/// Number of bytes of overhead produced per datagram message.
pub const DATAGRAM_OVERHEAD: usize = 11;
/// Number of bytes of overhead produced per stream message.
pub const STREAM_OVERHEAD: usize = 8;

// Truncated-IV codec constants
const IV_BYTES: usize = 3;
const IV_BITS: u32 = 24;
const IV_MASK: u32 = (1 << IV_BITS) - 1;
const IV_FUZZ: u32 = 0x0028_6AD7;

// Key material derived per side: stream key first, then datagram key
const PER_SIDE_FULL: usize = 2 * CHANNEL_KEYSIZE;
const PER_SIDE_STREAM_ONLY: usize = CHANNEL_KEYSIZE;

/// The role of one side of a session.
///
/// The role decides which half of the derived key material a side sends
/// with and which half it receives with. The two sides must take opposite
/// roles; which side takes which does not matter.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Role {
	/// The side that initiated the session.
	Initiator = 1,
	/// The side that responded.
	Responder = 2,
}

/// One direction-pair of keys and counters for the stream channel.
struct StreamChannel {
	local: ChannelKey,
	remote: ChannelKey,
	send_iv: u64,
	recv_iv: u64,
}

/// One direction-pair of keys and the send counter for the datagram
/// channel. The receive side is tracked by the anti-replay window.
struct DatagramChannel {
	local: ChannelKey,
	remote: ChannelKey,
	send_iv: u64,
}

enum State {
	Unkeyed,
	StreamOnly {
		stream: StreamChannel,
	},
	Full {
		stream: StreamChannel,
		datagram: DatagramChannel,
		window: AntiReplayWindow,
	},
}

/// A keyed endpoint of a datagram/stream channel pair.
///
/// See the [module documentation] for usage.
///
/// [module documentation]: index.html
pub struct Session {
	state: State,
}

impl Default for Session {
	fn default() -> Self {
		Self::new()
	}
}

impl Session {
	/// Create an unkeyed session. Every message operation fails until the
	/// session is keyed.
	pub fn new() -> Self {
		Self {
			state: State::Unkeyed,
		}
	}

	#[must_use = "SECURITY WARNING: Ignoring a Result can have real security implications."]
	/// Key the session for both the datagram and the stream channel.
	///
	/// `session_key` must be 32 bytes and unique to this session. Keying an
	/// already-keyed session starts over with fresh counters and a fresh
	/// replay window; re-keying with the same key is a misuse this library
	/// cannot detect.
	pub fn key(&mut self, role: Role, session_key: &[u8]) -> Result<(), CalicoError> {
		let secret_key = chacha::SecretKey::from_slice(session_key)?;

		let mut okm = [0u8; 2 * PER_SIDE_FULL];
		kdf::expand_key(&secret_key, &mut okm)?;

		let (local, remote) = split_halves(&okm, role, PER_SIDE_FULL);

		let stream = StreamChannel {
			local: ChannelKey::from_slice(&local[..CHANNEL_KEYSIZE])?,
			remote: ChannelKey::from_slice(&remote[..CHANNEL_KEYSIZE])?,
			send_iv: 0,
			recv_iv: 0,
		};
		let datagram = DatagramChannel {
			local: ChannelKey::from_slice(&local[CHANNEL_KEYSIZE..])?,
			remote: ChannelKey::from_slice(&remote[CHANNEL_KEYSIZE..])?,
			send_iv: 0,
		};

		okm.zeroize();

		self.state = State::Full {
			stream,
			datagram,
			window: AntiReplayWindow::new(),
		};

		Ok(())
	}

	#[must_use = "SECURITY WARNING: Ignoring a Result can have real security implications."]
	/// Key the session for the stream channel only.
	///
	/// This derives half the key material of [`key`] and rejects datagram
	/// operations. Use it when only an ordered, lossless transport is in
	/// play. Both sides must agree on the mode: a stream-only session derives
	/// different stream sub-keys than a fully keyed one and the two cannot
	/// talk to each other.
	///
	/// [`key`]: #method.key
	pub fn key_stream_only(&mut self, role: Role, session_key: &[u8]) -> Result<(), CalicoError> {
		let secret_key = chacha::SecretKey::from_slice(session_key)?;

		let mut okm = [0u8; 2 * PER_SIDE_STREAM_ONLY];
		kdf::expand_key(&secret_key, &mut okm)?;

		let (local, remote) = split_halves(&okm, role, PER_SIDE_STREAM_ONLY);

		let stream = StreamChannel {
			local: ChannelKey::from_slice(local)?,
			remote: ChannelKey::from_slice(remote)?,
			send_iv: 0,
			recv_iv: 0,
		};

		okm.zeroize();

		self.state = State::StreamOnly { stream };

		Ok(())
	}

	#[must_use = "SECURITY WARNING: Ignoring a Result can have real security implications."]
	/// Encrypt a datagram message.
	///
	/// Writes `plaintext.len()` bytes of ciphertext into `dst_out` and fills
	/// `overhead`. Transmit the overhead block along with the ciphertext;
	/// where it goes relative to the ciphertext is the caller's choice.
	pub fn datagram_encrypt(
		&mut self,
		plaintext: &[u8],
		dst_out: &mut [u8],
		overhead: &mut [u8; DATAGRAM_OVERHEAD],
	) -> Result<(), CalicoError> {
		let datagram = match &mut self.state {
			State::Full { datagram, .. } => datagram,
			_ => return Err(CalicoError),
		};

		let iv = datagram.send_iv;
		if iv == u64::max_value() {
			return Err(CalicoError);
		}

		let tag = chacha14siphash::seal(&datagram.local, iv, plaintext, dst_out)?;
		datagram.send_iv = iv + 1;

		overhead[..IV_BYTES].copy_from_slice(&encode_iv(iv, tag));
		store_u64_into_le(&[tag], &mut overhead[IV_BYTES..]);

		Ok(())
	}

	#[must_use = "SECURITY WARNING: Ignoring a Result can have real security implications."]
	/// Decrypt a datagram message in place.
	///
	/// On success `buffer` holds the plaintext. On failure `buffer` is
	/// untouched and the replay window does not change; replayed, reordered-
	/// out-of-window and tampered messages are indistinguishable to the
	/// caller.
	pub fn datagram_decrypt(
		&mut self,
		buffer: &mut [u8],
		overhead: &[u8; DATAGRAM_OVERHEAD],
	) -> Result<(), CalicoError> {
		let (datagram, window) = match &mut self.state {
			State::Full {
				datagram, window, ..
			} => (datagram, window),
			_ => return Err(CalicoError),
		};

		let tag = load_u64_le(&overhead[IV_BYTES..]);

		let low_bits = decode_iv([overhead[0], overhead[1], overhead[2]], tag);
		let iv = reconstruct_counter(window.newest_iv(), low_bits);

		// Drop replayed and ancient IVs before doing any MAC work
		if !window.check(iv) {
			return Err(CalicoError);
		}

		chacha14siphash::open(&datagram.remote, iv, buffer, tag)?;

		// The window may only learn IVs that authenticated
		window.accept(iv);

		Ok(())
	}

	#[must_use = "SECURITY WARNING: Ignoring a Result can have real security implications."]
	/// Encrypt a stream message.
	///
	/// Writes `plaintext.len()` bytes of ciphertext into `dst_out` and fills
	/// `overhead`. Stream messages must be delivered to the peer complete,
	/// in order and exactly once.
	pub fn stream_encrypt(
		&mut self,
		plaintext: &[u8],
		dst_out: &mut [u8],
		overhead: &mut [u8; STREAM_OVERHEAD],
	) -> Result<(), CalicoError> {
		let stream = match &mut self.state {
			State::StreamOnly { stream } | State::Full { stream, .. } => stream,
			State::Unkeyed => return Err(CalicoError),
		};

		let iv = stream.send_iv;
		if iv == u64::max_value() {
			return Err(CalicoError);
		}

		let tag = chacha14siphash::seal(&stream.local, iv, plaintext, dst_out)?;
		stream.send_iv = iv + 1;

		store_u64_into_le(&[tag], overhead);

		Ok(())
	}

	#[must_use = "SECURITY WARNING: Ignoring a Result can have real security implications."]
	/// Decrypt a stream message in place.
	///
	/// The message counter is implicit: this call only succeeds for the
	/// next message in send order. On failure `buffer` is untouched and the
	/// receive counter does not advance.
	pub fn stream_decrypt(
		&mut self,
		buffer: &mut [u8],
		overhead: &[u8; STREAM_OVERHEAD],
	) -> Result<(), CalicoError> {
		let stream = match &mut self.state {
			State::StreamOnly { stream } | State::Full { stream, .. } => stream,
			State::Unkeyed => return Err(CalicoError),
		};

		let iv = stream.recv_iv;
		if iv == u64::max_value() {
			return Err(CalicoError);
		}

		let tag = load_u64_le(overhead.as_ref());

		chacha14siphash::open(&stream.remote, iv, buffer, tag)?;

		// Advance only on success
		stream.recv_iv = iv + 1;

		Ok(())
	}

	/// Return the session to the unkeyed state, erasing all key material.
	///
	/// Idempotent; calling it on a never-keyed session is a no-op. The
	/// session may be keyed again afterwards, with a fresh key.
	pub fn teardown(&mut self) {
		// Dropping the channel keys zeroizes them
		self.state = State::Unkeyed;
	}
}

impl Drop for Session {
	fn drop(&mut self) {
		self.teardown();
	}
}

impl core::fmt::Debug for Session {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		let mode = match self.state {
			State::Unkeyed => "Unkeyed",
			State::StreamOnly { .. } => "StreamOnly",
			State::Full { .. } => "Full",
		};
		write!(f, "Session {{ mode: {}, keys: [***OMITTED***] }}", mode)
	}
}

/// Split the expanded key material into this side's send half and receive
/// half. The two roles split oppositely so one side's send keys are the
/// other side's receive keys.
fn split_halves(okm: &[u8], role: Role, per_side: usize) -> (&[u8], &[u8]) {
	debug_assert_eq!(okm.len(), 2 * per_side);
	let (first, second) = okm.split_at(per_side);

	match role {
		Role::Initiator => (second, first),
		Role::Responder => (first, second),
	}
}

/// Truncate `iv` to 24 bits and obfuscate it with the MAC tag.
///
/// The byte order 0,16,8 is deliberate and part of the wire format.
fn encode_iv(iv: u64, tag: u64) -> [u8; IV_BYTES] {
	let trunc = (iv as u32).wrapping_sub(tag as u32) ^ IV_FUZZ;

	[trunc as u8, (trunc >> 16) as u8, (trunc >> 8) as u8]
}

/// Recover the low 24 bits of the IV from the wire encoding. Any edit to
/// the tag scrambles the result.
fn decode_iv(bytes: [u8; IV_BYTES], tag: u64) -> u32 {
	let trunc = u32::from(bytes[0]) | (u32::from(bytes[2]) << 8) | (u32::from(bytes[1]) << 16);

	((trunc ^ IV_FUZZ).wrapping_add(tag as u32)) & IV_MASK
}

/// Choose the 64-bit counter whose low 24 bits equal `low_bits` and that is
/// numerically closest to `newest`, without wrapping below 0 or above
/// `u64::MAX`.
fn reconstruct_counter(newest: u64, low_bits: u32) -> u64 {
	debug_assert!(low_bits <= IV_MASK);

	let span = 1u64 << IV_BITS;
	let half = span >> 1;
	let candidate = (newest & !u64::from(IV_MASK)) | u64::from(low_bits);

	if candidate > newest {
		if candidate - newest > half && candidate >= span {
			return candidate - span;
		}
	} else if newest - candidate > half {
		if let Some(up) = candidate.checked_add(span) {
			return up;
		}
	}

	candidate
}


// Testing public functions in the module. Only executed when NOT testing
// no_std, since the scenarios allocate.
#[cfg(all(test, feature = "safe_api"))]
mod public {
	use super::*;

	fn keyed_pair(key: &[u8]) -> (Session, Session) {
		let mut initiator = Session::new();
		let mut responder = Session::new();
		initiator.key(Role::Initiator, key).unwrap();
		responder.key(Role::Responder, key).unwrap();

		(initiator, responder)
	}

	fn datagram_roundtrip(
		sender: &mut Session,
		receiver: &mut Session,
		plaintext: &[u8],
	) -> Result<Vec<u8>, CalicoError> {
		let mut buffer = vec![0u8; plaintext.len()];
		let mut overhead = [0u8; DATAGRAM_OVERHEAD];

		sender.datagram_encrypt(plaintext, &mut buffer, &mut overhead)?;
		receiver.datagram_decrypt(&mut buffer, &overhead)?;

		Ok(buffer)
	}

	mod test_keying {
		use super::*;

		#[test]
		fn test_key_length() {
			let mut session = Session::new();

			assert!(session.key(Role::Initiator, &[0u8; 31]).is_err());
			assert!(session.key(Role::Initiator, &[0u8; 33]).is_err());
			assert!(session.key(Role::Initiator, &[0u8; 0]).is_err());
			assert!(session.key(Role::Initiator, &[0u8; 32]).is_ok());

			let mut session = Session::new();
			assert!(session.key_stream_only(Role::Responder, &[0u8; 31]).is_err());
			assert!(session.key_stream_only(Role::Responder, &[0u8; 32]).is_ok());
		}

		#[test]
		fn test_unkeyed_rejects_everything() {
			let mut session = Session::new();
			let mut buffer = [0u8; 16];

			assert!(session
				.datagram_encrypt(&[0u8; 16], &mut buffer, &mut [0u8; DATAGRAM_OVERHEAD])
				.is_err());
			assert!(session
				.datagram_decrypt(&mut buffer, &[0u8; DATAGRAM_OVERHEAD])
				.is_err());
			assert!(session
				.stream_encrypt(&[0u8; 16], &mut buffer, &mut [0u8; STREAM_OVERHEAD])
				.is_err());
			assert!(session
				.stream_decrypt(&mut buffer, &[0u8; STREAM_OVERHEAD])
				.is_err());
		}

		#[test]
		fn test_stream_only_rejects_datagram_ops() {
			let mut session = Session::new();
			session.key_stream_only(Role::Initiator, &[0u8; 32]).unwrap();

			let mut buffer = [0u8; 16];
			assert!(session
				.datagram_encrypt(&[0u8; 16], &mut buffer, &mut [0u8; DATAGRAM_OVERHEAD])
				.is_err());
			assert!(session
				.datagram_decrypt(&mut buffer, &[0u8; DATAGRAM_OVERHEAD])
				.is_err());

			// But stream operations work
			assert!(session
				.stream_encrypt(&[0u8; 16], &mut buffer, &mut [0u8; STREAM_OVERHEAD])
				.is_ok());
		}

		#[test]
		fn test_stream_only_pair_roundtrip() {
			let key = [0x44u8; 32];
			let mut a = Session::new();
			let mut b = Session::new();
			a.key_stream_only(Role::Initiator, &key).unwrap();
			b.key_stream_only(Role::Responder, &key).unwrap();

			let pt = b"stream-only both ways";
			let mut buffer = vec![0u8; pt.len()];
			let mut overhead = [0u8; STREAM_OVERHEAD];

			a.stream_encrypt(pt, &mut buffer, &mut overhead).unwrap();
			b.stream_decrypt(&mut buffer, &overhead).unwrap();
			assert_eq!(buffer, pt);

			let mut buffer = vec![0u8; pt.len()];
			let mut overhead = [0u8; STREAM_OVERHEAD];
			b.stream_encrypt(pt, &mut buffer, &mut overhead).unwrap();
			a.stream_decrypt(&mut buffer, &overhead).unwrap();
			assert_eq!(buffer, pt);
		}

		#[test]
		fn test_stream_only_derives_its_own_keys() {
			// Stream-only keying expands half the key material, so its
			// stream sub-keys differ from a fully keyed session's. The two
			// forms do not interoperate; both sides must agree on the mode.
			let key = [0x44u8; 32];
			let mut stream_only = Session::new();
			let mut full = Session::new();
			stream_only.key_stream_only(Role::Initiator, &key).unwrap();
			full.key(Role::Responder, &key).unwrap();

			let pt = b"mode mismatch";
			let mut buffer = vec![0u8; pt.len()];
			let mut overhead = [0u8; STREAM_OVERHEAD];

			stream_only.stream_encrypt(pt, &mut buffer, &mut overhead).unwrap();
			assert!(full.stream_decrypt(&mut buffer, &overhead).is_err());
		}

		#[test]
		fn test_role_mismatch_fails_first_message() {
			let key = [0u8; 32];
			let mut a = Session::new();
			let mut b = Session::new();
			a.key(Role::Initiator, &key).unwrap();
			b.key(Role::Initiator, &key).unwrap();

			let mut buffer = [0u8; 8];
			let mut overhead = [0u8; DATAGRAM_OVERHEAD];
			a.datagram_encrypt(&[1u8; 8], &mut buffer, &mut overhead).unwrap();
			assert!(b.datagram_decrypt(&mut buffer, &overhead).is_err());

			let mut overhead = [0u8; STREAM_OVERHEAD];
			a.stream_encrypt(&[1u8; 8], &mut buffer, &mut overhead).unwrap();
			assert!(b.stream_decrypt(&mut buffer, &overhead).is_err());
		}

		#[test]
		fn test_mismatched_keys_fail() {
			let key_a = [0u8; 32];
			let mut key_b = [0u8; 32];
			key_b[0] = 0x01;

			let mut a = Session::new();
			let mut b = Session::new();
			a.key(Role::Initiator, &key_a).unwrap();
			b.key(Role::Responder, &key_b).unwrap();

			let mut buffer = [0u8; 8];
			let mut overhead = [0u8; DATAGRAM_OVERHEAD];
			a.datagram_encrypt(&[1u8; 8], &mut buffer, &mut overhead).unwrap();
			assert!(b.datagram_decrypt(&mut buffer, &overhead).is_err());
		}

		#[test]
		fn test_teardown_idempotent() {
			let mut session = Session::new();
			session.teardown();
			session.teardown();

			session.key(Role::Initiator, &[0u8; 32]).unwrap();
			session.teardown();
			session.teardown();

			let mut buffer = [0u8; 8];
			assert!(session
				.stream_encrypt(&[0u8; 8], &mut buffer, &mut [0u8; STREAM_OVERHEAD])
				.is_err());

			// A torn-down session can be keyed again
			assert!(session.key(Role::Initiator, &[1u8; 32]).is_ok());
		}
	}

	mod test_datagram {
		use super::*;

		#[test]
		fn test_roundtrip_various_lengths() {
			let (mut a, mut b) = keyed_pair(&[0x5cu8; 32]);

			for &len in &[0usize, 1, 3, 55, 56, 57, 63, 64, 65, 1000, 10_000] {
				let pt = vec![0xa5u8; len];
				let out = datagram_roundtrip(&mut a, &mut b, &pt).unwrap();
				assert_eq!(out, pt);
			}
		}

		#[test]
		fn test_encrypt_dst_too_short() {
			let (mut a, _) = keyed_pair(&[0u8; 32]);

			let mut dst = [0u8; 7];
			assert!(a
				.datagram_encrypt(&[0u8; 8], &mut dst, &mut [0u8; DATAGRAM_OVERHEAD])
				.is_err());
		}

		#[test]
		fn test_replay_rejected() {
			let (mut a, mut b) = keyed_pair(&[0u8; 32]);

			let pt: Vec<u8> = (0u8..0x20).collect();
			let mut buffer = pt.clone();
			let mut overhead = [0u8; DATAGRAM_OVERHEAD];
			a.datagram_encrypt(&pt, &mut buffer, &mut overhead).unwrap();

			let captured = buffer.clone();

			assert!(b.datagram_decrypt(&mut buffer, &overhead).is_ok());
			assert_eq!(buffer, pt);

			// Replaying the captured datagram must fail
			let mut replayed = captured;
			assert!(b.datagram_decrypt(&mut replayed, &overhead).is_err());
		}

		#[test]
		fn test_any_order_within_window() {
			let (mut a, mut b) = keyed_pair(&[0u8; 32]);

			let mut messages = Vec::new();
			for byte in [b'A', b'B', b'C'].iter() {
				let mut buffer = [*byte];
				let mut overhead = [0u8; DATAGRAM_OVERHEAD];
				a.datagram_encrypt(&[*byte], &mut buffer, &mut overhead).unwrap();
				messages.push((buffer, overhead));
			}

			// Deliver C, then A, then B
			for &idx in &[2usize, 0, 1] {
				let (mut buffer, overhead) = messages[idx];
				assert!(b.datagram_decrypt(&mut buffer, &overhead).is_ok());
				assert_eq!(buffer[0], [b'A', b'B', b'C'][idx]);
			}
		}

		#[test]
		fn test_window_edge() {
			let (mut a, mut b) = keyed_pair(&[0u8; 32]);

			let mut messages = Vec::new();
			for _ in 0..2048u32 {
				let mut buffer = [0xeeu8; 4];
				let mut overhead = [0u8; DATAGRAM_OVERHEAD];
				a.datagram_encrypt(&[0xeeu8; 4], &mut buffer, &mut overhead).unwrap();
				messages.push((buffer, overhead));
			}

			// Deliver only #2047 first
			let (mut buffer, overhead) = messages[2047];
			assert!(b.datagram_decrypt(&mut buffer, &overhead).is_ok());

			// #1024..#2046 in forward order all fit the window
			for msg in messages[1024..2047].iter() {
				let (mut buffer, overhead) = *msg;
				assert!(b.datagram_decrypt(&mut buffer, &overhead).is_ok());
			}

			// #0..#1023 slid out of the window
			for msg in messages[..1024].iter() {
				let (mut buffer, overhead) = *msg;
				assert!(b.datagram_decrypt(&mut buffer, &overhead).is_err());
			}

			// And #2047 is a replay now
			let (mut buffer, overhead) = messages[2047];
			assert!(b.datagram_decrypt(&mut buffer, &overhead).is_err());
		}

		#[test]
		fn test_tamper_ciphertext_and_overhead() {
			let (mut a, mut b) = keyed_pair(&[0u8; 32]);

			let pt = [0x42u8; 24];
			let mut buffer = [0u8; 24];
			let mut overhead = [0u8; DATAGRAM_OVERHEAD];
			a.datagram_encrypt(&pt, &mut buffer, &mut overhead).unwrap();

			// Single-bit flips across the ciphertext
			for byte_idx in 0..buffer.len() {
				for bit in [0u8, 3, 7].iter() {
					let mut tampered = buffer;
					tampered[byte_idx] ^= 1 << bit;
					assert!(b.datagram_decrypt(&mut tampered, &overhead).is_err());
				}
			}

			// Single-bit flips across the overhead block
			for byte_idx in 0..overhead.len() {
				for bit in [0u8, 4].iter() {
					let mut tampered_overhead = overhead;
					tampered_overhead[byte_idx] ^= 1 << bit;
					let mut tampered = buffer;
					assert!(b
						.datagram_decrypt(&mut tampered, &tampered_overhead)
						.is_err());
				}
			}

			// The untampered original still decrypts
			assert!(b.datagram_decrypt(&mut buffer, &overhead).is_ok());
			assert_eq!(buffer, pt);
		}

		#[test]
		fn test_tag_bound_to_encoded_iv() {
			let (mut a, mut b) = keyed_pair(&[0u8; 32]);

			let pt = [0x99u8; 16];
			let mut buffer = [0u8; 16];
			let mut overhead = [0u8; DATAGRAM_OVERHEAD];
			// This datagram was sealed under IV 0
			a.datagram_encrypt(&pt, &mut buffer, &mut overhead).unwrap();

			// Re-encode the overhead so it claims IV 1 with the same tag
			let tag = load_u64_le(&overhead[IV_BYTES..]);
			let mut forged = overhead;
			forged[..IV_BYTES].copy_from_slice(&encode_iv(1, tag));

			let mut forged_buffer = buffer;
			assert!(b.datagram_decrypt(&mut forged_buffer, &forged).is_err());

			// The honest overhead still passes
			assert!(b.datagram_decrypt(&mut buffer, &overhead).is_ok());
		}

		#[test]
		fn test_send_counter_exhaustion() {
			let (mut a, _) = keyed_pair(&[0u8; 32]);

			match &mut a.state {
				State::Full { datagram, .. } => datagram.send_iv = u64::max_value(),
				_ => unreachable!(),
			}

			let mut buffer = [0u8; 4];
			assert!(a
				.datagram_encrypt(&[0u8; 4], &mut buffer, &mut [0u8; DATAGRAM_OVERHEAD])
				.is_err());

			// The counter did not advance (no wrap to 0)
			match &a.state {
				State::Full { datagram, .. } => {
					assert_eq!(datagram.send_iv, u64::max_value())
				}
				_ => unreachable!(),
			}
		}
	}

	mod test_stream {
		use super::*;

		#[test]
		fn test_roundtrip_various_lengths() {
			let (mut a, mut b) = keyed_pair(&[0x31u8; 32]);

			for &len in &[0usize, 1, 63, 64, 65, 10_000] {
				let pt = vec![0x3cu8; len];
				let mut buffer = pt.clone();
				let mut overhead = [0u8; STREAM_OVERHEAD];

				a.stream_encrypt(&pt, &mut buffer, &mut overhead).unwrap();
				b.stream_decrypt(&mut buffer, &overhead).unwrap();
				assert_eq!(buffer, pt);
			}
		}

		#[test]
		fn test_bidirectional() {
			let (mut a, mut b) = keyed_pair(&[0x09u8; 32]);

			let mut buffer = *b"forward";
			let mut overhead = [0u8; STREAM_OVERHEAD];
			a.stream_encrypt(b"forward", &mut buffer, &mut overhead).unwrap();
			b.stream_decrypt(&mut buffer, &overhead).unwrap();
			assert_eq!(&buffer, b"forward");

			let mut buffer = *b"backward";
			let mut overhead = [0u8; STREAM_OVERHEAD];
			b.stream_encrypt(b"backward", &mut buffer, &mut overhead).unwrap();
			a.stream_decrypt(&mut buffer, &overhead).unwrap();
			assert_eq!(&buffer, b"backward");
		}

		#[test]
		fn test_out_of_order_fails() {
			let (mut a, mut b) = keyed_pair(&[0u8; 32]);

			let mut first = [1u8; 8];
			let mut first_overhead = [0u8; STREAM_OVERHEAD];
			a.stream_encrypt(&[1u8; 8], &mut first, &mut first_overhead).unwrap();

			let mut second = [2u8; 8];
			let mut second_overhead = [0u8; STREAM_OVERHEAD];
			a.stream_encrypt(&[2u8; 8], &mut second, &mut second_overhead).unwrap();

			// Second before first: rejected, counter unchanged
			let mut early = second;
			assert!(b.stream_decrypt(&mut early, &second_overhead).is_err());

			// In-order delivery still works afterwards
			assert!(b.stream_decrypt(&mut first, &first_overhead).is_ok());
			assert!(b.stream_decrypt(&mut second, &second_overhead).is_ok());
			assert_eq!(first, [1u8; 8]);
			assert_eq!(second, [2u8; 8]);
		}

		#[test]
		fn test_lost_message_breaks_stream() {
			let (mut a, mut b) = keyed_pair(&[0u8; 32]);

			let mut dropped = [0u8; 4];
			a.stream_encrypt(&[9u8; 4], &mut dropped, &mut [0u8; STREAM_OVERHEAD])
				.unwrap();

			let mut next = [0u8; 4];
			let mut next_overhead = [0u8; STREAM_OVERHEAD];
			a.stream_encrypt(&[8u8; 4], &mut next, &mut next_overhead).unwrap();

			// The receiver never saw the first message
			assert!(b.stream_decrypt(&mut next, &next_overhead).is_err());
		}

		#[test]
		fn test_send_counter_exhaustion() {
			let mut session = Session::new();
			session.key_stream_only(Role::Initiator, &[0u8; 32]).unwrap();

			match &mut session.state {
				State::StreamOnly { stream } => stream.send_iv = u64::max_value(),
				_ => unreachable!(),
			}

			let mut buffer = [0u8; 4];
			assert!(session
				.stream_encrypt(&[0u8; 4], &mut buffer, &mut [0u8; STREAM_OVERHEAD])
				.is_err());

			match &session.state {
				State::StreamOnly { stream } => {
					assert_eq!(stream.send_iv, u64::max_value())
				}
				_ => unreachable!(),
			}
		}
	}

	// Proptests. Only executed when NOT testing no_std.
	#[cfg(feature = "safe_api")]
	mod proptest {
		use super::*;

		quickcheck! {
			// Any plaintext round-trips over the datagram channel.
			fn prop_datagram_roundtrip(input: Vec<u8>, key_byte: u8) -> bool {
				let (mut a, mut b) = keyed_pair(&[key_byte; 32]);

				match datagram_roundtrip(&mut a, &mut b, &input) {
					Ok(out) => out == input,
					Err(_) => false,
				}
			}
		}

		quickcheck! {
			// Any sequence of plaintexts round-trips over the stream channel
			// in order, in both directions.
			fn prop_stream_roundtrip(inputs: Vec<Vec<u8>>, key_byte: u8) -> bool {
				let (mut a, mut b) = keyed_pair(&[key_byte; 32]);

				for input in inputs {
					let mut buffer = input.clone();
					let mut overhead = [0u8; STREAM_OVERHEAD];

					if a.stream_encrypt(&input, &mut buffer, &mut overhead).is_err() {
						return false;
					}
					if b.stream_decrypt(&mut buffer, &overhead).is_err() {
						return false;
					}
					if buffer != input {
						return false;
					}
				}

				true
			}
		}
	}
}
