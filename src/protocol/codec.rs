use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::core::{Error, FCS_SIZE, MAX_FRAME_LENGTH};
use crate::layout::PacketLayout;
use crate::util::frame_check_sequence;
use super::message::{PacketHeader, PacketMetadata, RadioMessage};

/// Radio frame codec
///
/// Frames are delimited by the leading length byte, which counts every byte
/// after itself including the little-endian FCS. Header groups are written
/// and read in the order fixed by the layout; the codec never inspects a
/// group's contents.
#[derive(Debug, Clone, Copy)]
pub struct FrameCodec {
    layout: PacketLayout,
}

impl FrameCodec {
    /// Creates a codec for one build layout
    pub fn new(layout: PacketLayout) -> Self {
        FrameCodec { layout }
    }

    pub fn layout(&self) -> &PacketLayout {
        &self.layout
    }
}

impl Decoder for FrameCodec {
    type Item = RadioMessage;
    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.is_empty() {
            // Need the length byte
            return Ok(None);
        }

        let length = src[0] as usize;
        let min_length = self.layout.frame_length(0);
        if length < min_length || length > MAX_FRAME_LENGTH {
            tracing::warn!(length, min_length, "dropping frame with invalid length");
            src.advance(1);
            return Err(Error::codec(format!(
                "invalid frame length {}, expected {}..={}",
                length, min_length, MAX_FRAME_LENGTH
            )));
        }

        if src.len() < 1 + length {
            // Need more data to read full frame
            src.reserve(1 + length - src.len());
            return Ok(None);
        }

        let frame = src.split_to(1 + length).freeze();

        // Everything after the length byte is covered by the FCS
        let fcs_offset = 1 + length - FCS_SIZE;
        let expected = frame_check_sequence(&frame[1..fcs_offset]);
        let actual = u16::from_le_bytes([frame[fcs_offset], frame[fcs_offset + 1]]);
        if expected != actual {
            tracing::warn!(expected, actual, "dropping frame with bad FCS");
            return Err(Error::CrcMismatch { expected, actual });
        }

        let mut body = frame.slice(..fcs_offset - self.layout.footer_size());
        let header = PacketHeader::decode(self.layout.header(), &mut body)?;
        let payload = body;

        let max = self.layout.max_payload_length(false);
        if payload.len() > max {
            tracing::warn!(payload = payload.len(), max, "dropping frame with oversized payload");
            return Err(Error::PayloadTooLong { length: payload.len(), max });
        }

        tracing::trace!(length, payload = payload.len(), "decoded frame");

        Ok(Some(RadioMessage {
            header,
            payload,
            metadata: PacketMetadata::for_layout(self.layout.metadata()),
        }))
    }
}

impl Encoder<RadioMessage> for FrameCodec {
    type Error = Error;

    fn encode(&mut self, item: RadioMessage, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let max = self.layout.max_payload_length(item.is_timestamped());
        if item.payload.len() > max {
            return Err(Error::PayloadTooLong {
                length: item.payload.len(),
                max,
            });
        }

        let length = self.layout.frame_length(item.payload.len());
        let mut header = item.header;
        header.radio.length = length as u8;

        let start = dst.len();
        dst.reserve(1 + length);

        if let Err(e) = header.encode(self.layout.header(), dst) {
            dst.truncate(start);
            return Err(e);
        }
        dst.extend_from_slice(&item.payload);

        let fcs = frame_check_sequence(&dst[start + 1..]);
        dst.put_u16_le(fcs);

        tracing::trace!(length, payload = item.payload.len(), "encoded frame");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{FrameFlags, RadioConfig};
    use crate::protocol::message::{ActiveMessageHeader, FlagsMetadata, NetworkHeader};
    use bytes::Bytes;
    use futures::StreamExt;
    use rand::Rng;
    use tokio_util::codec::FramedRead;

    fn layout(frames: FrameFlags) -> PacketLayout {
        PacketLayout::compose(&RadioConfig::default().with_frames(frames)).unwrap()
    }

    fn random_message(layout: &PacketLayout, rng: &mut impl Rng) -> RadioMessage {
        let len = rng.gen_range(0..=layout.max_payload_length(false));
        let payload: Vec<u8> = (0..len).map(|_| rng.gen()).collect();
        let mut message = RadioMessage::new(layout, payload);

        let ieee154 = &mut message.header.ieee154;
        ieee154.fcf = rng.gen();
        ieee154.dsn = rng.gen();
        ieee154.dest_pan = rng.gen();
        ieee154.dest = rng.gen();
        ieee154.src = rng.gen();
        if message.header.network.is_some() {
            message.header.network = Some(NetworkHeader { network: rng.gen() });
        }
        if message.header.am.is_some() {
            message.header.am = Some(ActiveMessageHeader { am_type: rng.gen() });
        }
        message
    }

    #[test]
    fn test_codec_round_trip() {
        let mut rng = rand::thread_rng();
        for bits in 0..4u8 {
            let layout = layout(FrameFlags {
                raw_frames: bits & 1 != 0,
                raw_link_frames: bits & 2 != 0,
                ..FrameFlags::default()
            });
            let mut codec = FrameCodec::new(layout);

            for _ in 0..32 {
                let message = random_message(&layout, &mut rng);
                let mut bytes = BytesMut::new();
                codec.encode(message.clone(), &mut bytes).unwrap();
                assert_eq!(bytes.len(), 1 + layout.frame_length(message.payload.len()));

                let decoded = codec.decode(&mut bytes).unwrap().expect("complete frame");
                assert_eq!(decoded.header.ieee154, message.header.ieee154);
                assert_eq!(decoded.header.network, message.header.network);
                assert_eq!(decoded.header.am, message.header.am);
                assert_eq!(decoded.header.radio.length as usize, layout.frame_length(message.payload.len()));
                assert_eq!(decoded.payload, message.payload);
                assert!(bytes.is_empty());
            }
        }
    }

    #[test]
    fn test_encode_reference_frame() {
        let layout = layout(FrameFlags::default());
        let mut codec = FrameCodec::new(layout);

        let mut message = RadioMessage::new(&layout, Bytes::from_static(&[0xDE, 0xAD]));
        message.header.ieee154.dsn = 0x2A;
        message.header.ieee154.dest_pan = 0x0022;
        message.header.ieee154.src = 0x0001;
        message.header.am = Some(ActiveMessageHeader { am_type: 0x06 });

        let mut bytes = BytesMut::new();
        codec.encode(message, &mut bytes).unwrap();
        assert_eq!(
            &bytes[..],
            &[
                0x0F, 0x41, 0x88, 0x2A, 0x22, 0x00, 0xFF, 0xFF, 0x01, 0x00, 0x3F, 0x06, 0xDE,
                0xAD, 0x98, 0x28,
            ]
        );
    }

    #[test]
    fn test_partial_frame_waits() {
        let layout = layout(FrameFlags::default());
        let mut codec = FrameCodec::new(layout);

        let mut full = BytesMut::new();
        codec.encode(RadioMessage::new(&layout, &b"abc"[..]), &mut full).unwrap();

        let mut partial = BytesMut::from(&full[..full.len() - 1]);
        assert!(codec.decode(&mut partial).unwrap().is_none());
        assert_eq!(partial.len(), full.len() - 1);

        partial.extend_from_slice(&full[full.len() - 1..]);
        assert!(codec.decode(&mut partial).unwrap().is_some());
    }

    #[test]
    fn test_corrupted_frame_rejected() {
        let layout = layout(FrameFlags::default());
        let mut codec = FrameCodec::new(layout);

        let mut bytes = BytesMut::new();
        codec.encode(RadioMessage::new(&layout, &b"payload"[..]), &mut bytes).unwrap();
        bytes[5] ^= 0x10;

        let err = codec.decode(&mut bytes).unwrap_err();
        assert!(matches!(err, Error::CrcMismatch { .. }));
    }

    #[test]
    fn test_short_frame_rejected() {
        let layout = layout(FrameFlags::default());
        let mut codec = FrameCodec::new(layout);

        // Length byte too small to hold the header and FCS
        let mut bytes = BytesMut::from(&[0x05u8, 0, 0, 0, 0, 0][..]);
        let err = codec.decode(&mut bytes).unwrap_err();
        assert!(matches!(err, Error::Codec(_)));
    }

    #[test]
    fn test_timestamped_payload_cap() {
        let layout = layout(FrameFlags { footer_timestamp: true, ..FrameFlags::default() });
        let mut codec = FrameCodec::new(layout);
        let max = layout.max_payload_length(false);

        // Full length is fine without a timestamp
        let mut bytes = BytesMut::new();
        codec.encode(RadioMessage::new(&layout, vec![0u8; max]), &mut bytes).unwrap();

        // ...but a time stamped send of the same size is refused, not truncated
        let mut message = RadioMessage::new(&layout, vec![0u8; max]);
        message.metadata.flags.set(FlagsMetadata::TIME_SYNC);
        let mut bytes = BytesMut::new();
        let err = codec.encode(message.clone(), &mut bytes).unwrap_err();
        assert!(matches!(
            err,
            Error::PayloadTooLong { length, max: capped } if length == max && capped == max - 4
        ));
        assert!(bytes.is_empty());

        message.payload = Bytes::from(vec![0u8; max - 4]);
        codec.encode(message, &mut bytes).unwrap();
        assert_eq!(bytes.len(), 1 + layout.frame_length(max - 4));
    }

    #[test]
    fn test_payload_over_max_rejected() {
        let layout = layout(FrameFlags::default());
        let mut codec = FrameCodec::new(layout);
        let message = RadioMessage::new(&layout, vec![0u8; layout.max_payload_length(false) + 1]);
        let mut bytes = BytesMut::new();
        assert!(matches!(
            codec.encode(message, &mut bytes),
            Err(Error::PayloadTooLong { .. })
        ));
    }

    #[test]
    fn test_oversized_received_payload_rejected() {
        let layout = layout(FrameFlags::default());
        let max = layout.max_payload_length(false);

        // A peer configured with a larger payload limit
        let wide = PacketLayout::compose(&RadioConfig::default().with_max_payload(max + 8)).unwrap();
        let mut bytes = BytesMut::new();
        FrameCodec::new(wide)
            .encode(RadioMessage::new(&wide, vec![0x55u8; max + 1]), &mut bytes)
            .unwrap();
        let frame_len = bytes.len();

        let mut codec = FrameCodec::new(layout);
        let err = codec.decode(&mut bytes).unwrap_err();
        assert!(matches!(
            err,
            Error::PayloadTooLong { length, max: limit } if length == max + 1 && limit == max
        ));
        // The whole frame is consumed so the stream can resynchronize
        assert!(bytes.is_empty());
        assert_eq!(frame_len, 1 + layout.frame_length(max + 1));

        let mut bytes = BytesMut::new();
        FrameCodec::new(wide)
            .encode(RadioMessage::new(&wide, vec![0x55u8; max]), &mut bytes)
            .unwrap();
        assert_eq!(codec.decode(&mut bytes).unwrap().map(|m| m.payload.len()), Some(max));
    }

    #[test]
    fn test_framed_sink() {
        use futures::SinkExt;
        use tokio_util::codec::FramedWrite;

        let layout = layout(FrameFlags { raw_link_frames: true, ..FrameFlags::default() });
        let mut wire = Vec::new();

        tokio_test::block_on(async {
            let mut sink = FramedWrite::new(&mut wire, FrameCodec::new(layout));
            sink.send(RadioMessage::new(&layout, &b"one"[..])).await.unwrap();
            sink.send(RadioMessage::new(&layout, &b"two"[..])).await.unwrap();
        });

        let frame_len = 1 + layout.frame_length(3);
        assert_eq!(wire.len(), 2 * frame_len);
        assert_eq!(wire[0] as usize, frame_len - 1);
        assert_eq!(&wire[layout.payload_offset()..layout.payload_offset() + 3], b"one");
    }

    #[tokio::test]
    async fn test_framed_stream() {
        let layout = layout(FrameFlags::default());
        let mut codec = FrameCodec::new(layout);

        let mut stream_bytes = BytesMut::new();
        for i in 0..3u8 {
            let mut message = RadioMessage::new(&layout, vec![i; i as usize + 1]);
            message.header.ieee154.dsn = i;
            codec.encode(message, &mut stream_bytes).unwrap();
        }

        let stream_bytes = stream_bytes.freeze();
        let mut frames = FramedRead::new(&stream_bytes[..], codec);
        let mut seen = 0u8;
        while let Some(frame) = frames.next().await {
            let frame = frame.unwrap();
            assert_eq!(frame.header.ieee154.dsn, seen);
            assert_eq!(frame.payload.len(), seen as usize + 1);
            seen += 1;
        }
        assert_eq!(seen, 3);
    }
}
