use futures::{SinkExt, StreamExt};
use rfstack::protocol::{FlagsMetadata, FrameCodec, RadioMessage};
use rfstack::{time, PacketLayout, RadioConfig};
use tokio_util::codec::{FramedRead, FramedWrite};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    // Optional JSON configuration path, otherwise the build configuration
    let config = match std::env::args().nth(1) {
        Some(path) => {
            let text = match std::fs::read_to_string(&path) {
                Ok(text) => text,
                Err(e) => {
                    eprintln!("Cannot read {}: {}", path, e);
                    return;
                }
            };
            match RadioConfig::from_json(&text) {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("Invalid configuration: {}", e);
                    return;
                }
            }
        }
        None => RadioConfig::BUILD,
    };

    let layout = match PacketLayout::build(&config) {
        Ok(layout) => layout,
        Err(e) => {
            eprintln!("Layout error: {}", e);
            return;
        }
    };
    let timing = match time::derive(&config.clock) {
        Ok(timing) => timing,
        Err(e) => {
            eprintln!("Timing error: {}", e);
            return;
        }
    };

    println!("Packet layout:");
    for (region, groups) in [
        ("header", layout.header().groups()),
        ("footer", layout.footer().groups()),
        ("metadata", layout.metadata().groups()),
    ] {
        println!("- {}:", region);
        for group in groups {
            println!("  {:>3} +{:<2} {}", group.offset, group.size, group.layer);
        }
    }
    println!("- max payload: {}", layout.max_payload_length(false));
    println!("- max time stamped payload: {}", layout.max_payload_length(true));

    println!("\nAlarm timing:");
    println!("- ticks per microsecond: {}", timing.ticks_per_microsecond());
    println!("- log2 ticks per millisecond: {}", timing.log2_ticks_per_millisecond());
    println!("- ticks per second: {}", timing.ticks_per_second());

    // Push two frames through the codec and read them back
    let mut wire = Vec::new();
    {
        let mut sink = FramedWrite::new(&mut wire, FrameCodec::new(layout));
        let mut message = RadioMessage::new(&layout, &b"hello"[..]);
        message.header.ieee154.src = 0x0001;
        if let Err(e) = sink.send(message).await {
            eprintln!("Encode error: {}", e);
            return;
        }

        let mut message = RadioMessage::new(&layout, &b"sync"[..]);
        message.metadata.flags.set(FlagsMetadata::TIME_SYNC);
        if let Err(e) = sink.send(message).await {
            eprintln!("Encode error: {}", e);
            return;
        }
    }

    println!("\nFrames on air ({} bytes):", wire.len());
    let mut frames = FramedRead::new(&wire[..], FrameCodec::new(layout));
    while let Some(frame) = frames.next().await {
        match frame {
            Ok(frame) => println!(
                "  length={} src={:#06x} payload={:?}",
                frame.header.radio.length,
                frame.header.ieee154.src,
                frame.payload
            ),
            Err(e) => eprintln!("Decode error: {}", e),
        }
    }
}
