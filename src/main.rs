//! Command line front end for `textframe`.
//!
//! Parses CLI arguments and runs one offline tunnel operation.

mod cli;

use clap::Parser;
use cli::{Cli, Command};
use textframe::{
    Classified,
    FileCounterStore,
    PayloadCodec,
    ReplyKind,
    RequestId,
    RequestSequencer,
    TunnelConfig,
    TunnelError,
    TunnelKey,
    classifier::{OuterStatus, is_error_code},
    classify,
};

fn main() -> Result<(), TunnelError> {
    // Applications embedding the library should install their own subscriber.
    tracing_subscriber::fmt::init();

    match Cli::parse().command {
        Command::Fragment {
            request_id,
            packet_size,
            status,
            text,
        } => fragment(request_id, packet_size, status, &text),
        Command::Classify { text } => {
            describe(&text);
            Ok(())
        }
        Command::Encode { key, text } => {
            let key = TunnelKey::from_hex(&key)?;
            println!("{}", PayloadCodec::new().encode(text.as_bytes(), &key)?);
            Ok(())
        }
        Command::Decode { key, text } => {
            let key = TunnelKey::from_hex(&key)?;
            println!("{}", PayloadCodec::new().decode_to_string(&text, &key)?);
            Ok(())
        }
        Command::Counter { path, set } => {
            let mut sequencer = RequestSequencer::open(FileCounterStore::new(path))?;
            if let Some(value) = set {
                sequencer.resync(value)?;
            }
            println!("{}", sequencer.peek());
            Ok(())
        }
    }
}

fn fragment(
    request_id: u32,
    packet_size: usize,
    status: Option<u16>,
    text: &str,
) -> Result<(), TunnelError> {
    let fragmenter = TunnelConfig::default().packet_size(packet_size).fragmenter()?;
    let kind = match status {
        None => ReplyKind::Request,
        Some(code) if is_error_code(code) => ReplyKind::Error {
            status: code,
            encrypted: OuterStatus::new(code).is_encrypted(),
        },
        Some(_) => ReplyKind::Success,
    };
    let batch = fragmenter.fragment_as(text, RequestId::new(request_id)?, kind)?;
    for line in batch.to_wire() {
        println!("{line}");
    }
    Ok(())
}

fn describe(text: &str) {
    match classify(text) {
        Classified::Acknowledgment(ack) => {
            println!("acknowledgment: request {} fragment {}", ack.request_id(), ack.index());
        }
        Classified::FirstFragment(first) => println!(
            "first fragment: request {} of {} fragments, {:?}, {} payload chars",
            first.request_id(),
            first.total(),
            first.kind(),
            first.payload().len()
        ),
        Classified::ContinuationFragment(rest) => println!(
            "continuation: fragment {}, {} payload chars",
            rest.index(),
            rest.payload().len()
        ),
        Classified::Unrecognized => println!("unrecognized"),
    }
}
