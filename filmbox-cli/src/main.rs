use anyhow::Result;
use clap::{Parser, Subcommand};
use filmbox_cli::commands;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "filmbox")]
#[command(about = "Filmbox - Box data into optical frames and recover it from captures", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode a payload and render it as a frame image
    Encode {
        /// Format configuration (JSON)
        #[arg(short, long)]
        config: String,

        /// Payload file, or - for stdin
        #[arg(short, long)]
        input: String,

        /// Output PNG file
        #[arg(short, long)]
        output: String,

        /// Horizontal placement of the frame inside the canvas
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        offset_x: i64,

        /// Vertical placement of the frame inside the canvas
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        offset_y: i64,
    },

    /// Track a frame image and recover its payload
    Decode {
        /// Format configuration (JSON)
        #[arg(short, long)]
        config: String,

        /// Frame image to decode
        #[arg(short, long)]
        input: String,

        /// Locate corner marks before sampling
        #[arg(long)]
        analog: bool,

        /// Output file for the payload (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Show how many payload bytes fit in a frame
    Capacity {
        /// Format configuration (JSON)
        #[arg(short, long)]
        config: String,
    },

    /// Validate and print the frame layout
    Inspect {
        /// Format configuration (JSON)
        #[arg(short, long)]
        config: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    // Execute command
    match cli.command {
        Commands::Encode {
            config,
            input,
            output,
            offset_x,
            offset_y,
        } => commands::encode::execute(&config, &input, &output, offset_x, offset_y),

        Commands::Decode {
            config,
            input,
            analog,
            output,
        } => commands::decode::execute(&config, &input, analog, output.as_deref()),

        Commands::Capacity { config } => commands::capacity::execute(&config),

        Commands::Inspect { config } => commands::inspect::execute(&config),
    }
}
