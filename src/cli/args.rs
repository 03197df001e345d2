use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "kv-pem")]
#[command(version)]
#[command(about = "Turn key vault secrets, keys and certificates into PEM files")]
#[command(long_about = None)]
pub struct Cli {
    /// Enable verbose logging (repeat for more verbosity: -v INFO, -vv DEBUG, -vvv TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress log output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output raw tab-separated values (no formatting)
    #[arg(short, long, global = true)]
    pub raw: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch the objects described in a YAML file and write them under the target path
    Mount {
        /// YAML file holding the objects array
        #[arg(long)]
        objects: PathBuf,

        /// Directory holding the vault bundles
        #[arg(long, env = "KV_PEM_SOURCE")]
        source: PathBuf,

        /// Directory the files are written to
        #[arg(long)]
        target_path: PathBuf,

        /// Reorder PKCS#12 certificates as leaf, intermediates, root
        #[arg(long, env = "CONSTRUCT_PEM_CHAIN")]
        construct_pem_chain: bool,

        /// Permissions of written files, in octal
        #[arg(long, default_value = "0644", value_parser = parse_file_mode)]
        file_mode: u32,
    },
    /// Order the certificates of a PEM bundle from leaf to root
    Chain {
        /// PEM file to read (stdin when omitted)
        file: Option<PathBuf>,

        /// List subjects and key identifiers instead of printing PEM
        #[arg(short, long)]
        list: bool,
    },
    /// Convert a base64 PKCS#12 secret into PEM keys and certificates
    ConvertPfx {
        /// File holding the base64 value (stdin when omitted)
        file: Option<PathBuf>,

        /// Reorder certificates as leaf, intermediates, root
        #[arg(long, env = "CONSTRUCT_PEM_CHAIN")]
        construct_pem_chain: bool,
    },
    /// Rebuild the public key PEM of a vault key bundle or JSON web key
    PublicKey {
        /// JSON file to read (stdin when omitted)
        file: Option<PathBuf>,
    },
    /// Generate shell completion scripts
    Completion {
        #[command(subcommand)]
        command: CompletionCommands,
    },
}

#[derive(Subcommand)]
pub enum CompletionCommands {
    /// Generate bash completion script
    Bash,
    /// Generate zsh completion script
    Zsh,
    /// Generate fish completion script
    Fish,
    /// Generate PowerShell completion script
    PowerShell,
}

impl CompletionCommands {
    pub fn shell(&self) -> Shell {
        match self {
            CompletionCommands::Bash => Shell::Bash,
            CompletionCommands::Zsh => Shell::Zsh,
            CompletionCommands::Fish => Shell::Fish,
            CompletionCommands::PowerShell => Shell::PowerShell,
        }
    }
}

fn parse_file_mode(value: &str) -> Result<u32, String> {
    let digits = value.trim_start_matches("0o");
    let mode = u32::from_str_radix(digits, 8)
        .map_err(|e| format!("'{value}' is not an octal file mode: {e}"))?;
    if mode > 0o7777 {
        return Err(format!("'{value}' is out of range for a file mode"));
    }
    Ok(mode)
}
