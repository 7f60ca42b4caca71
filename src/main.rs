use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use ocicrypt_args::config::{get_user_pkcs11_config, OcicryptPaths};
use ocicrypt_args::display::{format_pkcs11_config, format_summary, OutputFormat};
use ocicrypt_args::{create_crypto_config, create_decrypt_crypto_config, Descriptor, EncArgs};

#[derive(Parser)]
#[command(
    name = "ocicrypt-args",
    version,
    about = "Build OCI image layer crypto configs from command line arguments",
    long_about = "ocicrypt-args decodes the recipient, key and password arguments used \
                  by image encryption tools and prints a summary of the resulting \
                  crypto config. Key material itself is never printed."
)]
struct Cli {
    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the config for encrypting layers
    Encrypt {
        #[command(flatten)]
        args: EncArgs,

        /// JSON file with the descriptor of an encrypted layer
        #[arg(long = "descriptor", value_name = "FILE")]
        descriptors: Vec<String>,
    },

    /// Build the config for decrypting layers
    Decrypt {
        #[command(flatten)]
        args: EncArgs,

        /// JSON file with the descriptor of an encrypted layer
        #[arg(long = "descriptor", value_name = "FILE")]
        descriptors: Vec<String>,
    },

    /// Show the effective PKCS11 module configuration
    #[command(name = "pkcs11-config")]
    Pkcs11Config,
}

fn load_descriptors(files: &[String]) -> Result<Vec<Descriptor>> {
    Ok(files
        .iter()
        .map(Descriptor::from_json_file)
        .collect::<Result<Vec<_>, _>>()?)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("ocicrypt_args=warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Encrypt { args, descriptors } => {
            let descs = load_descriptors(&descriptors)?;
            let cc = create_crypto_config(&args, &descs)?;
            println!("{}", format_summary(&cc.summary(), cli.format)?);
        }
        Commands::Decrypt { args, descriptors } => {
            let descs = load_descriptors(&descriptors)?;
            let cc = create_decrypt_crypto_config(&args, &descs)?;
            println!("{}", format_summary(&cc.summary(), cli.format)?);
        }
        Commands::Pkcs11Config => {
            let paths = OcicryptPaths::new();
            match paths.config_file() {
                Some(file) => tracing::info!("reading {}", file.display()),
                None => tracing::info!("no ocicrypt config file, using defaults"),
            }
            let config = get_user_pkcs11_config(&paths)?;
            println!("{}", format_pkcs11_config(&config, cli.format)?);
        }
    }

    Ok(())
}
