//! Splice CLI
//!
//! Command-line interface for the splice shader preprocessor

mod commands;

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use splice_core::{Result, init_tracing};
use std::io;
use std::path::PathBuf;
use tracing::error;

use commands::build::BuildArgs;

#[derive(Parser)]
#[command(name = "splice")]
#[command(about = "splice: shader import inlining with #line provenance")]
#[command(version = splice_core::VERSION)]
#[command(
    long_about = "splice expands @import directives in GLSL-style shaders into a single\n\
compilable source, with #line directives pointing back at the original files.\n\
\n\
Examples:\n  \
splice build shaders/                 # Build every shader under shaders/\n  \
splice build main.frag --stdout       # Print one expanded shader\n  \
splice build . -D QUALITY=2 --emit-map  # Inject a define and write source maps\n  \
splice config init --format yaml      # Create splice.yaml"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file path
    #[arg(
        short,
        long,
        global = true,
        env = "SPLICE_CONFIG",
        help = "Path to configuration file (.splicerc.json/.splicerc.toml/splice.yaml)"
    )]
    config: Option<PathBuf>,

    /// Verbose output (can be used multiple times for increased verbosity)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Generate shell completion script
    #[arg(
        long,
        value_enum,
        help = "Generate completion script for specified shell"
    )]
    generate_completion: Option<Shell>,
}

#[derive(Subcommand)]
enum Commands {
    /// Expand imports and write compilable shaders
    Build {
        /// Files or directories to build
        #[arg(help = "Shader files or directories (default: current directory)")]
        paths: Vec<PathBuf>,

        /// Output directory
        #[arg(
            short,
            long,
            conflicts_with = "stdout",
            help = "Output directory (default: splice-generated)"
        )]
        output: Option<PathBuf>,

        /// Extra defines, injected after #version
        #[arg(
            short = 'D',
            long = "define",
            value_name = "NAME[=VALUE]",
            value_parser = parse_define_arg,
            help = "Define a macro (can be used multiple times)"
        )]
        defines: Vec<(String, Option<String>)>,

        /// Namespace for references without one
        #[arg(long, help = "Default namespace (overrides config)")]
        namespace: Option<String>,

        /// Sub-directory for bare import names
        #[arg(long, help = "Directory for bare import names (overrides config)")]
        include_dir: Option<String>,

        /// Namespace roots
        #[arg(
            long = "root",
            value_name = "NS=DIR",
            value_parser = parse_root_arg,
            help = "Map a namespace to a directory (can be used multiple times)"
        )]
        roots: Vec<(String, PathBuf)>,

        #[arg(long, help = "Do not emit #line directives")]
        no_line_directives: bool,

        #[arg(long, help = "Keep non-ASCII characters in the output")]
        keep_unicode: bool,

        #[arg(long, help = "Write <file>.map.json next to each output")]
        emit_map: bool,

        #[arg(long, help = "Print results to stdout instead of writing files")]
        stdout: bool,

        /// Concurrent builds
        #[arg(
            short = 'j',
            long,
            help = "Number of shaders built at once (default: number of CPU cores)"
        )]
        jobs: Option<usize>,
    },

    /// Configuration file management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Show version information
    #[command(alias = "ver")]
    Version {
        /// Show detailed version information
        #[arg(long, help = "Show detailed version and build information")]
        detailed: bool,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Initialize a new configuration file
    Init {
        /// Configuration file format
        #[arg(long, default_value = "json", help = "Configuration file format")]
        format: ConfigFormat,

        /// Overwrite existing configuration file
        #[arg(long, help = "Overwrite existing configuration file")]
        force: bool,
    },

    /// Show current configuration
    Show {
        #[arg(long, default_value = "json", help = "Format to print the configuration in")]
        format: ConfigFormat,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ConfigFormat {
    /// JSON configuration format
    Json,
    /// TOML configuration format
    Toml,
    /// YAML configuration format
    Yaml,
}

impl From<ConfigFormat> for splice_core::ConfigFormat {
    fn from(format: ConfigFormat) -> Self {
        match format {
            ConfigFormat::Json => Self::Json,
            ConfigFormat::Toml => Self::Toml,
            ConfigFormat::Yaml => Self::Yaml,
        }
    }
}

/// Parse a `-D NAME[=VALUE]` argument
fn parse_define_arg(s: &str) -> std::result::Result<(String, Option<String>), String> {
    splice_core::parse_define(s).map_err(|e| e.to_string())
}

/// Parse a `--root NS=DIR` argument
fn parse_root_arg(s: &str) -> std::result::Result<(String, PathBuf), String> {
    match s.split_once('=') {
        Some((ns, dir)) if !ns.is_empty() && !dir.is_empty() => {
            Ok((ns.to_string(), PathBuf::from(dir)))
        }
        _ => Err(format!("Invalid root '{s}'. Expected 'NAMESPACE=DIR'")),
    }
}

fn main() -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(num_cpus::get())
        .enable_all()
        .build()?;

    runtime.block_on(async_main())
}

async fn async_main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(shell) = cli.generate_completion {
        generate_completion_script(shell);
        return Ok(());
    }

    // Initialize tracing based on verbosity
    let log_level = match cli.verbose {
        0 => "splice=error",
        1 => "splice=warn",
        2 => "splice=info",
        3 => "splice=debug",
        _ => "splice=trace",
    };
    unsafe {
        std::env::set_var("RUST_LOG", log_level);
    }
    init_tracing();

    match run_command(cli).await {
        Ok(()) => Ok(()),
        Err(e) => {
            error!("splice failed: {}", e);
            std::process::exit(1);
        }
    }
}

fn generate_completion_script(shell: Shell) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut io::stdout());
}

async fn run_command(cli: Cli) -> Result<()> {
    match cli.command {
        Some(Commands::Build {
            paths,
            output,
            defines,
            namespace,
            include_dir,
            roots,
            no_line_directives,
            keep_unicode,
            emit_map,
            stdout,
            jobs,
        }) => {
            let paths = if paths.is_empty() {
                vec![PathBuf::from(".")]
            } else {
                paths
            };
            commands::build::build_command(BuildArgs {
                paths,
                output,
                defines,
                namespace,
                include_dir,
                roots,
                no_line_directives,
                keep_unicode,
                emit_map,
                stdout,
                jobs: jobs.unwrap_or_else(num_cpus::get).max(1),
                config_path: cli.config,
            })
            .await
        }

        Some(Commands::Config { action }) => match action {
            ConfigAction::Init { format, force } => {
                commands::config::init_command(format.into(), force).await
            }
            ConfigAction::Show { format } => {
                commands::config::show_command(format.into(), cli.config).await
            }
        },

        Some(Commands::Version { detailed }) => {
            if detailed {
                println!("splice {}", splice_core::VERSION);
                println!("Build information:");
                println!("  Target: {}", std::env::consts::ARCH);
                println!("  OS: {}", std::env::consts::OS);
                println!("  Core: {} {}", splice_core::NAME, splice_core::VERSION);
            } else {
                println!("{}", splice_core::VERSION);
            }
            Ok(())
        }

        None => {
            let mut cmd = Cli::command();
            cmd.print_help()?;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_root_arguments() {
        assert_eq!(
            parse_root_arg("engine=../engine/glsl").unwrap(),
            ("engine".to_string(), PathBuf::from("../engine/glsl"))
        );
        assert!(parse_root_arg("engine").is_err());
        assert!(parse_root_arg("=dir").is_err());
    }

    #[test]
    fn parses_define_arguments() {
        assert_eq!(
            parse_define_arg("MAX_LIGHTS=8").unwrap(),
            ("MAX_LIGHTS".to_string(), Some("8".to_string()))
        );
        assert!(parse_define_arg("bad name").is_err());
    }
}
