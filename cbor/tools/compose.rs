/*!
Compose command - convert text formats to CBOR
*/

use crate::io::{Input, Output};
use crate::json;
use anyhow::Context;
use cbor_value::{Decoder, Encoder};
use clap::Parser;
use tracing::debug;

/// Input format for compose command
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum InputFormat {
    /// JSON format (lossy - no tags, limited types)
    Json,
    /// Hexadecimal text, whitespace ignored
    Hex,
}

/// Convert text formats to CBOR binary
#[derive(Parser, Debug)]
#[command(
    about = "Convert text formats to CBOR binary",
    long_about = "Parse JSON or hex text and write the equivalent CBOR binary.\n\n\
                  JSON input may hold several whitespace-separated documents, which are\n\
                  written as a CBOR sequence. Hex input is checked to be well-formed CBOR."
)]
pub struct Command {
    /// Input format
    #[arg(
        long,
        default_value = "json",
        value_name = "FORMAT",
        help = "Input format: json (lossy), hex"
    )]
    format: InputFormat,

    /// Encode JSON objects as tag 275 records rather than plain maps
    #[arg(long)]
    records: bool,

    /// Output file (default: stdout)
    #[arg(short = 'o', long)]
    output: Option<Output>,

    /// Input file (use '-' for stdin)
    input: Input,
}

impl Command {
    pub fn exec(self) -> anyhow::Result<()> {
        let text = self.input.read_to_string()?;

        let data = match self.format {
            InputFormat::Json => {
                let mut encoder = Encoder::new();
                for doc in serde_json::Deserializer::from_str(&text).into_iter::<serde_json::Value>() {
                    let value = json::from_json(doc.context("Failed to parse JSON")?, self.records)?;
                    encoder.emit(&value)?;
                }
                encoder.build()
            }
            InputFormat::Hex => {
                let digits: String = text.split_whitespace().collect();
                let data = hex::decode(digits).context("Failed to parse hex")?;
                for (idx, item) in Decoder::new(&data).enumerate() {
                    item.with_context(|| format!("Item {idx} is not well-formed CBOR"))?;
                }
                data
            }
        };
        debug!("Composed {} bytes", data.len());

        self.output.unwrap_or_default().write_all(&data)?;
        Ok(())
    }
}
