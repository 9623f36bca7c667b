/*!
Inspect command - display CBOR data in various formats
*/

use super::io::{Input, Output};
use super::json;
use anyhow::Context;
use cbor_value::Decoder;
use clap::Parser;
use std::io::Write;
use tracing::debug;

/// Inspect and display CBOR data
#[derive(Parser, Debug)]
#[command(about = "Inspect and display CBOR information", long_about = None)]
pub struct Command {
    /// Output format
    #[arg(
        long,
        default_value = "diag",
        value_name = "FORMAT",
        help = "Output format: diag/diagnostic (human-readable), json (lossy), hex"
    )]
    format: OutputFormat,

    /// Output file (default: stdout)
    #[arg(short = 'o', long)]
    output: Option<Output>,

    /// Input CBOR file (use '-' for stdin)
    input: Input,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    /// CBOR Diagnostic Notation
    #[value(alias = "diagnostic")]
    Diag,
    /// JSON format (lossy - loses CBOR tags, types, etc.)
    Json,
    /// The encoded bytes of each item as hexadecimal
    Hex,
}

impl Command {
    pub fn exec(self) -> anyhow::Result<()> {
        let data = self.input.read_all()?;
        let mut out = self.output.unwrap_or_default().writer()?;

        // One line per top-level item of the sequence
        let mut decoder = Decoder::new(&data);
        let mut count = 0usize;
        while !decoder.is_exhausted() {
            let start = decoder.offset();
            let value = decoder
                .decode_value()
                .with_context(|| format!("Failed to decode item {count} at offset {start}"))?;
            match self.format {
                OutputFormat::Diag => writeln!(out, "{value}")?,
                OutputFormat::Json => {
                    writeln!(out, "{}", serde_json::to_string_pretty(&json::to_json(&value))?)?
                }
                OutputFormat::Hex => writeln!(out, "{}", hex::encode(&data[start..decoder.offset()]))?,
            }
            count += 1;
        }
        debug!("Decoded {count} item(s) from {} bytes", data.len());

        out.flush()?;
        Ok(())
    }
}
