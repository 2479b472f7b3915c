//! Command line interface for the `textframe` binary.
//!
//! The binary exposes the offline parts of the tunnel for inspection:
//! fragmenting text into wire messages, classifying a received message and
//! running the payload codec by hand.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Command line arguments for the `textframe` binary.
#[derive(Debug, Parser)]
#[command(name = "textframe", version, about = "Inspect text tunnel framing")]
pub struct Cli {
    /// Operation to perform.
    #[command(subcommand)]
    pub command: Command,
}

/// Operations offered by the binary.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Split text into wire fragments, one per line.
    Fragment {
        /// Request identifier placed in the header.
        #[arg(short, long, default_value_t = 0)]
        request_id: u32,
        /// Maximum characters per fragment.
        #[arg(short, long, default_value_t = 306)]
        packet_size: usize,
        /// Mark the first fragment as a reply with this status code.
        /// Codes of 400 and above produce an error reply.
        #[arg(long)]
        status: Option<u16>,
        /// Text to fragment.
        text: String,
    },
    /// Describe how a received message would be interpreted.
    Classify {
        /// Received message text.
        text: String,
    },
    /// Compress, encrypt and armour a payload.
    Encode {
        /// 256-bit key as 64 hexadecimal digits.
        #[arg(short, long)]
        key: String,
        /// Plaintext payload.
        text: String,
    },
    /// Reverse `encode`.
    Decode {
        /// 256-bit key as 64 hexadecimal digits.
        #[arg(short, long)]
        key: String,
        /// Armoured payload.
        text: String,
    },
    /// Show or set the persisted request counter.
    Counter {
        /// File holding the counter.
        path: PathBuf,
        /// Value to store.
        #[arg(long)]
        set: Option<u32>,
    },
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::{Cli, Command};

    #[test]
    fn parses_fragment_options() {
        let cli = Cli::parse_from([
            "textframe",
            "fragment",
            "--request-id",
            "42",
            "--packet-size",
            "160",
            "hello",
        ]);
        let Command::Fragment {
            request_id,
            packet_size,
            status,
            text,
        } = cli.command
        else {
            panic!("expected fragment command");
        };
        assert_eq!(request_id, 42);
        assert_eq!(packet_size, 160);
        assert_eq!(status, None);
        assert_eq!(text, "hello");
    }

    #[test]
    fn counter_set_is_optional() {
        let cli = Cli::parse_from(["textframe", "counter", "state/counter"]);
        assert!(matches!(cli.command, Command::Counter { set: None, .. }));
    }
}
