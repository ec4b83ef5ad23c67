#![allow(clippy::unwrap_used, clippy::expect_used)]

use proptest::prelude::*;
use rustyshare::{
    channel::{TrySendError, channel},
    rtp::{Depacketizer, Fragment, Packetizer},
    tcp::PacketParser,
};

/// A NAL header and a body with no zero bytes, so no start code can hide
/// inside it.
fn nal() -> impl Strategy<Value = Vec<u8>> {
    (0x01u8..=0x7f, prop::collection::vec(1u8..=255, 1..4000)).prop_map(|(header, body)| {
        let mut v = vec![header];
        v.extend(body);
        v
    })
}

proptest! {
    #[test]
    fn fu_a_round_trip(nal in nal(), mtu in 1usize..1500) {
        let mut annexb = vec![0, 0, 1];
        annexb.extend_from_slice(&nal);

        let mut depacketizer = Depacketizer::new();
        let mut buf = vec![0u8; mtu + 2];
        let mut closed = 0;
        for chunk in Packetizer::new(mtu, &annexb) {
            prop_assert!(chunk.payload.len() <= mtu);
            let n = chunk.write_into(&mut buf);
            if depacketizer.push(&Fragment::new(&buf[..n])) {
                closed += 1;
            }
        }
        prop_assert_eq!(closed, 1);
        prop_assert_eq!(depacketizer.take(), annexb);
    }

    #[test]
    fn channel_holds_exactly_its_capacity(capacity in 0usize..64) {
        let (tx, rx) = channel::<usize>(capacity);
        let effective = capacity.max(1);
        for i in 0..effective {
            prop_assert!(tx.try_send(i).is_ok());
        }
        prop_assert!(matches!(tx.try_send(effective), Err(TrySendError::Full(_))));
        for i in 0..effective {
            prop_assert_eq!(rx.try_receive(), Some(i));
        }
        prop_assert_eq!(rx.try_receive(), None);
    }

    #[test]
    fn parser_ignores_chunk_boundaries(
        frames in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..300), 1..8),
        cuts in prop::collection::vec(1usize..64, 1..32),
    ) {
        let mut wire = Vec::new();
        for f in &frames {
            wire.extend_from_slice(&(f.len() as u32).to_le_bytes());
            wire.extend_from_slice(f);
        }

        let mut parser = PacketParser::new();
        let mut got = Vec::new();
        let mut rest = &wire[..];
        let mut cut = cuts.iter().cycle();
        while !rest.is_empty() {
            let n = (*cut.next().unwrap()).min(rest.len());
            let (head, tail) = rest.split_at(n);
            got.extend(parser.update(head).unwrap().into_iter().map(|u| u.data().to_vec()));
            rest = tail;
        }
        prop_assert_eq!(got, frames);
    }
}
