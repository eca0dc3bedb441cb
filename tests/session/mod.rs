extern crate calico;

use calico::session::{Role, Session, DATAGRAM_OVERHEAD, STREAM_OVERHEAD};

pub fn keyed_pair_test_runner(key: &[u8; 32]) -> (Session, Session) {
	let mut initiator = Session::new();
	let mut responder = Session::new();
	initiator.key(Role::Initiator, key).unwrap();
	responder.key(Role::Responder, key).unwrap();

	(initiator, responder)
}

#[test]
fn test_zero_key_tunnel_message() {
	// 68 bytes of ASCII, NUL terminator included
	let message = b"The message was sent through the Calico secure tunnel successfully!\0";
	assert_eq!(message.len(), 68);

	let (mut initiator, mut responder) = keyed_pair_test_runner(&[0u8; 32]);

	let mut buffer = vec![0u8; message.len()];
	let mut overhead = [0u8; DATAGRAM_OVERHEAD];
	initiator
		.datagram_encrypt(&message[..], &mut buffer, &mut overhead)
		.unwrap();
	assert_ne!(buffer, &message[..]);

	responder.datagram_decrypt(&mut buffer, &overhead).unwrap();
	assert_eq!(buffer, &message[..]);
}

#[test]
fn test_datagrams_arrive_in_any_order() {
	let (mut initiator, mut responder) = keyed_pair_test_runner(&[0u8; 32]);

	let mut sent = Vec::new();
	for payload in [b"A", b"B", b"C"].iter() {
		let mut buffer = [0u8; 1];
		let mut overhead = [0u8; DATAGRAM_OVERHEAD];
		initiator
			.datagram_encrypt(&payload[..], &mut buffer, &mut overhead)
			.unwrap();
		sent.push((buffer, overhead));
	}

	// Deliver C, then A, then B
	for &idx in &[2usize, 0, 1] {
		let (mut buffer, overhead) = sent[idx];
		responder.datagram_decrypt(&mut buffer, &overhead).unwrap();
		assert_eq!(buffer[0], [b'A', b'B', b'C'][idx]);
	}
}

#[test]
fn test_captured_datagram_replay_rejected() {
	let (mut initiator, mut responder) = keyed_pair_test_runner(&[0u8; 32]);

	let payload: Vec<u8> = (0x00u8..0x20).collect();
	let mut buffer = vec![0u8; payload.len()];
	let mut overhead = [0u8; DATAGRAM_OVERHEAD];
	initiator
		.datagram_encrypt(&payload, &mut buffer, &mut overhead)
		.unwrap();

	let captured = buffer.clone();

	responder.datagram_decrypt(&mut buffer, &overhead).unwrap();
	assert_eq!(buffer, payload);

	let mut replayed = captured;
	assert!(responder.datagram_decrypt(&mut replayed, &overhead).is_err());
}

#[test]
fn test_mismatched_session_keys_fail() {
	let key_a = [0u8; 32];
	let mut key_b = [0u8; 32];
	key_b[0] = 0x01;

	let mut initiator = Session::new();
	let mut responder = Session::new();
	initiator.key(Role::Initiator, &key_a).unwrap();
	responder.key(Role::Responder, &key_b).unwrap();

	let mut buffer = [0u8; 16];
	let mut overhead = [0u8; DATAGRAM_OVERHEAD];
	initiator
		.datagram_encrypt(&[0u8; 16], &mut buffer, &mut overhead)
		.unwrap();
	assert!(responder.datagram_decrypt(&mut buffer, &overhead).is_err());

	let mut overhead = [0u8; STREAM_OVERHEAD];
	initiator
		.stream_encrypt(&[0u8; 16], &mut buffer, &mut overhead)
		.unwrap();
	assert!(responder.stream_decrypt(&mut buffer, &overhead).is_err());
}

#[test]
fn test_ordered_stream_of_random_messages() {
	let (mut initiator, mut responder) = keyed_pair_test_runner(&[0u8; 32]);

	let mut sent = Vec::new();
	for _ in 0..10 {
		let mut plaintext = vec![0u8; 1024];
		calico::util::secure_rand_bytes(&mut plaintext).unwrap();

		let mut buffer = vec![0u8; plaintext.len()];
		let mut overhead = [0u8; STREAM_OVERHEAD];
		initiator
			.stream_encrypt(&plaintext, &mut buffer, &mut overhead)
			.unwrap();
		sent.push((plaintext, buffer, overhead));
	}

	// A swapped pair fails on the out-of-order message
	{
		let mut out_of_order = sent[1].1.clone();
		assert!(responder
			.stream_decrypt(&mut out_of_order, &sent[1].2)
			.is_err());
	}

	// In-order delivery yields every plaintext
	for (plaintext, ciphertext, overhead) in sent.iter() {
		let mut buffer = ciphertext.clone();
		responder.stream_decrypt(&mut buffer, overhead).unwrap();
		assert_eq!(&buffer, plaintext);
	}
}

#[test]
fn test_bit_flip_then_restore() {
	let (mut initiator, mut responder) = keyed_pair_test_runner(&[0x6eu8; 32]);

	let plaintext = [0x2du8; 100];
	let mut buffer = [0u8; 100];
	let mut overhead = [0u8; DATAGRAM_OVERHEAD];
	initiator
		.datagram_encrypt(&plaintext, &mut buffer, &mut overhead)
		.unwrap();

	// Flip bit 0 of byte 0 of the ciphertext
	buffer[0] ^= 1;
	assert!(responder.datagram_decrypt(&mut buffer, &overhead).is_err());

	// Flip it back; nothing about the failed attempt lingers
	buffer[0] ^= 1;
	responder.datagram_decrypt(&mut buffer, &overhead).unwrap();
	assert_eq!(buffer[..], plaintext[..]);
}

#[test]
fn test_teardown_on_never_keyed_session() {
	let mut session = Session::new();
	session.teardown();
	drop(session);
}

#[test]
fn test_channels_are_independent() {
	let (mut initiator, mut responder) = keyed_pair_test_runner(&[0x77u8; 32]);

	// Interleave datagram and stream traffic; neither channel disturbs the
	// other's counters.
	for round in 0u8..8 {
		let payload = [round; 32];

		let mut dgram = [0u8; 32];
		let mut dgram_overhead = [0u8; DATAGRAM_OVERHEAD];
		initiator
			.datagram_encrypt(&payload, &mut dgram, &mut dgram_overhead)
			.unwrap();

		let mut stream = [0u8; 32];
		let mut stream_overhead = [0u8; STREAM_OVERHEAD];
		initiator
			.stream_encrypt(&payload, &mut stream, &mut stream_overhead)
			.unwrap();

		// Their ciphertexts differ: different sub-keys protect them
		assert_ne!(dgram, stream);

		responder
			.datagram_decrypt(&mut dgram, &dgram_overhead)
			.unwrap();
		responder
			.stream_decrypt(&mut stream, &stream_overhead)
			.unwrap();
		assert_eq!(dgram, payload);
		assert_eq!(stream, payload);
	}
}
