//! Integration test for the full frame pipeline: encode, concatenate,
//! split, dispatch, decode.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use meridian_core::Vec3;
use meridian_wire::sync::{ActorUpdateCommand, HitImpulse};
use meridian_wire::{
    decode_sync_batch, encode_sync_batch, ActorState, ActorSubState, ActorSyncRecord, ActorUpdate,
    ActorUpdateMsg, BufferPool, ByteReader, Frame, FrameBuilder, Opcode, StateSync, SyncKind,
    WireError, WireValue,
};

fn random_state_sync(rng: &mut StdRng) -> StateSync {
    let animation = rng.gen::<u8>();
    StateSync {
        state: ActorState::from_raw(rng.gen_range(0..8)).unwrap(),
        sub_state: ActorSubState::from_raw(rng.gen_range(0..4)).unwrap(),
        position: Vec3::new(
            f32::from(rng.gen_range(-3000i16..3000)) / 10.0,
            f32::from(rng.gen_range(-3000i16..3000)) / 10.0,
            f32::from(rng.gen_range(-3000i16..3000)) / 10.0,
        ),
        rotation: rng.gen_range(-3600..3600),
        animation,
        anim_overrides: (animation > 127).then(|| [rng.gen_range(0.0..4.0), rng.gen()]),
        speed: Vec3::new(
            f32::from(rng.gen_range(-100i16..100)) / 10.0,
            f32::from(rng.gen_range(-100i16..100)) / 10.0,
            0.0,
        ),
        sync_mode: 2,
        facing: rng.gen_range(-3600..3600),
        tilt: rng.gen_range(-2000..2000),
        hit: rng.gen_bool(0.3).then(|| HitImpulse {
            attacker_id: rng.gen(),
            stagger: rng.gen(),
        }),
        emote: rng.gen_bool(0.3).then(|| "Cheer".to_string()),
        sync_number: rng.gen(),
        ..StateSync::default()
    }
}

#[test]
fn test_concatenated_stream_splits_and_dispatches() {
    let pool = BufferPool::new();

    let mut ping = FrameBuilder::open(Opcode::Ping);
    ping.payload().write_i32(1234);

    let update = ActorUpdateMsg::Snapshot(ActorUpdate {
        actor_id: 77,
        name: Some("Kaida".to_string()),
        level: Some(50),
        motion: StateSync {
            state: ActorState::Walk,
            position: Vec3::new(10.0, 0.0, -4.5),
            sync_mode: 2,
            sync_number: 1,
            ..StateSync::default()
        },
        ..ActorUpdate::default()
    });

    let batch_entries = vec![
        (
            1,
            ActorSyncRecord::Movement(StateSync {
                sync_mode: 2,
                sync_number: 5,
                ..StateSync::default()
            }),
        ),
        (
            2,
            ActorSyncRecord::Movement(StateSync {
                position: Vec3::new(1.0, 2.0, 3.0),
                sync_mode: 2,
                sync_number: 6,
                ..StateSync::default()
            }),
        ),
    ];

    let mut stream = ping.finish();
    stream.extend_from_slice(&update.to_frame());
    stream.extend_from_slice(&encode_sync_batch(&pool, &batch_entries));

    let mut rest: &[u8] = &stream;
    let mut opcodes = Vec::new();
    while !rest.is_empty() {
        let (frame, remaining) = Frame::split(rest).unwrap();
        match frame.opcode().unwrap() {
            Opcode::Ping => {
                assert_eq!(frame.reader().read_i32().unwrap(), 1234);
            }
            Opcode::ActorUpdate => {
                assert_eq!(ActorUpdateMsg::from_frame(&frame).unwrap(), update);
            }
            Opcode::ActorSync => {
                let batch = decode_sync_batch(&frame, |_| SyncKind::Movement).unwrap();
                assert_eq!(batch.entries, batch_entries);
                assert_eq!(batch.skipped, 0);
            }
            other => panic!("unexpected opcode {other:?}"),
        }
        opcodes.push(frame.opcode().unwrap());
        rest = remaining;
    }
    assert_eq!(
        opcodes,
        vec![Opcode::Ping, Opcode::ActorUpdate, Opcode::ActorSync]
    );
}

#[test]
fn test_truncated_tail_reported_without_consuming() {
    let mut frame = FrameBuilder::open(Opcode::Pong);
    frame.payload().write_i32(9);
    let bytes = frame.finish();

    // Every strict prefix of a frame must split to an error, leaving the
    // caller free to retry once more bytes arrive.
    for end in 0..bytes.len() {
        assert!(Frame::split(&bytes[..end]).is_err(), "prefix {end}");
    }
    assert!(Frame::split(&bytes).is_ok());
}

#[test]
fn test_unknown_opcode_drops_frame_not_stream() {
    let mut stream = vec![0x02, 0x00, 0xFF, 0x7F, 0xAA, 0xBB]; // opcode 0x7FFF
    let mut pong = FrameBuilder::open(Opcode::Pong);
    pong.payload().write_i32(3);
    stream.extend_from_slice(&pong.finish());

    let (unknown, rest) = Frame::split(&stream).unwrap();
    assert_eq!(unknown.opcode().unwrap_err(), WireError::UnknownOpcode(0x7FFF));

    let (pong_frame, rest) = Frame::split(rest).unwrap();
    assert_eq!(pong_frame.opcode().unwrap(), Opcode::Pong);
    assert!(rest.is_empty());
}

#[test]
fn test_unknown_command_names_its_opcode() {
    let mut frame = FrameBuilder::open(Opcode::ActorUpdate);
    frame.payload().write_u8(0xEE);
    let bytes = frame.finish();

    let (frame, _) = Frame::split(&bytes).unwrap();
    let mut reader = frame.reader();
    assert_eq!(
        frame
            .read_command::<ActorUpdateCommand>(&mut reader)
            .unwrap_err(),
        WireError::UnknownCommand {
            opcode: Opcode::ActorUpdate as u16,
            command: 0xEE,
        }
    );
}

#[test]
fn test_randomized_batch_roundtrips() {
    let mut rng = StdRng::seed_from_u64(0x4D45_5249);
    let pool = BufferPool::new();

    for _ in 0..50 {
        let entries: Vec<(i32, ActorSyncRecord)> = (0..rng.gen_range(0..20))
            .map(|id| (id, ActorSyncRecord::Movement(random_state_sync(&mut rng))))
            .collect();

        let bytes = encode_sync_batch(&pool, &entries);
        let (frame, rest) = Frame::split(&bytes).unwrap();
        assert!(rest.is_empty());

        let batch = decode_sync_batch(&frame, |_| SyncKind::Movement).unwrap();
        assert_eq!(batch.skipped, 0);
        assert_eq!(batch.entries.len(), entries.len());
        for ((_, decoded), (_, original)) in batch.entries.iter().zip(&entries) {
            let (decoded, original) = (decoded.base(), original.base());
            // Position and speed pass through a x10 fixed-point codec;
            // everything else round-trips exactly.
            assert!(decoded.position.approx_eq(original.position, 0.05));
            assert!(decoded.speed.approx_eq(original.speed, 0.05));
            assert_eq!(decoded.rotation, original.rotation);
            assert_eq!(decoded.animation, original.animation);
            assert_eq!(decoded.anim_overrides, original.anim_overrides);
            assert_eq!(decoded.hit, original.hit);
            assert_eq!(decoded.emote, original.emote);
            assert_eq!(decoded.sync_number, original.sync_number);
        }
    }
    assert_eq!(pool.outstanding(), 0);
}

#[test]
fn test_manual_stream_matches_typed_encode() {
    // A pong frame built by hand, byte for byte.
    let mut frame = FrameBuilder::open(Opcode::Pong);
    Opcode::Pong.write(frame.payload()); // echo the opcode back as payload
    let bytes = frame.finish();
    assert_eq!(bytes, vec![0x02, 0x00, 0x02, 0x00, 0x02, 0x00]);

    let mut reader = ByteReader::new(&bytes[4..]);
    assert_eq!(reader.read_value::<Opcode>().unwrap(), Opcode::Pong);
}
