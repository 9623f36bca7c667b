/*!
CBOR Tools - A CLI for working with CBOR data

# Commands

- `inspect`: Display every item of a CBOR sequence as diagnostic notation, JSON or hex
- `compose`: Convert JSON or hex text to CBOR binary

# Examples

```bash
# Inspect a CBOR file as diagnostic notation
cbor inspect data.cbor

# Inspect as JSON (lossy)
cbor inspect --format json data.cbor

# Show the bytes of each top-level item
cbor inspect --format hex data.cbor

# Convert JSON to CBOR, with objects as tag 275 records
echo '{"name": "Alice", "age": 30}' | cbor compose --records -o data.cbor -

# Round-trip test
cbor compose --format hex hex.txt | cbor inspect -
```
*/

use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, filter::LevelFilter};

mod compose;
mod inspect;
mod io;
mod json;

/// A CLI tool for working with CBOR data
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "A CLI tool for inspecting and composing CBOR data",
    long_about = "CBOR Tools decodes CBOR (Concise Binary Object Representation) data into \
                  human-readable forms and builds CBOR from JSON or hex text.\n\n\
                  Log verbosity follows --log-level, or RUST_LOG when set."
)]
struct Cli {
    /// Minimum level of log events written to stderr
    #[arg(long, global = true, default_value = "warn", value_name = "LEVEL")]
    log_level: LevelFilter,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Inspect and display CBOR data in various formats
    Inspect(inspect::Command),

    /// Convert JSON or hex text to CBOR binary
    Compose(compose::Command),
}

fn init_logger(level: LevelFilter) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(level.into())
                .from_env_lossy(),
        )
        .with_target(level > LevelFilter::INFO)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logger(cli.log_level);

    match cli.command {
        Commands::Inspect(args) => args.exec(),
        Commands::Compose(args) => args.exec(),
    }
}
