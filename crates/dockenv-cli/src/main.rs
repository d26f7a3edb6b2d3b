mod commands;

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use commands::{CommandError, EXIT_FAILURE};
use dockenv_core::InstallOptions;
use dockenv_runtime::{check_docker_prereqs, format_missing, select_runtime, DockerRuntime};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

#[derive(Debug, Parser)]
#[command(
    name = "dockenv",
    version,
    about = "Install ordered container environments from layered configuration"
)]
struct Cli {
    /// Container runtime used to pull images and run containers.
    #[arg(long, default_value = "docker", value_parser = ["docker", "mock"], global = true)]
    runtime: String,

    /// Output results as structured JSON.
    #[arg(long, default_value_t = false, global = true)]
    json: bool,

    /// Enable verbose (debug) logging output.
    #[arg(short, long, default_value_t = false, global = true)]
    verbose: bool,

    /// Enable trace-level logging (more detailed than --verbose).
    #[arg(long, default_value_t = false, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Pull every image, then replace each container in priority order.
    Install {
        /// Path to the environment configuration file.
        #[arg(default_value = "dockenv.toml")]
        config: PathBuf,
        /// Pause between removing a container and starting it again.
        #[arg(long)]
        settle_delay_ms: Option<u64>,
    },
    /// Validate a configuration and print the install plan without running it.
    Check {
        /// Path to the environment configuration file.
        #[arg(default_value = "dockenv.toml")]
        config: PathBuf,
    },
    /// Print the merged configuration as JSON.
    Show {
        /// Path to the environment configuration file.
        #[arg(default_value = "dockenv.toml")]
        config: PathBuf,
    },
    /// Generate shell completions for bash, zsh, fish, elvish, or powershell.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
    /// Generate man pages in the specified directory.
    ManPages {
        /// Output directory for man pages.
        #[arg(default_value = "man")]
        dir: PathBuf,
    },
}

fn main() -> ExitCode {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let msg = info.to_string();
        if msg.contains("Broken pipe")
            || msg.contains("broken pipe")
            || msg.contains("os error 32")
            || msg.contains("failed printing to stdout")
        {
            std::process::exit(0);
        }
        default_hook(info);
    }));

    let cli = Cli::parse();

    let default_level = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("DOCKENV_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let json_output = cli.json;

    let needs_runtime = matches!(cli.command, Commands::Install { .. });
    if needs_runtime
        && cli.runtime == "docker"
        && std::env::var("DOCKENV_SKIP_PREREQS").as_deref() != Ok("1")
    {
        let missing = check_docker_prereqs(DockerRuntime::new().binary());
        if !missing.is_empty() {
            eprintln!("error: {}", format_missing(&missing));
            return ExitCode::from(EXIT_FAILURE);
        }
    }

    let runtime = match select_runtime(&cli.runtime) {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(EXIT_FAILURE);
        }
    };

    let result = match cli.command {
        Commands::Install {
            config,
            settle_delay_ms,
        } => commands::install::run(
            runtime.as_ref(),
            &config,
            InstallOptions {
                settle_delay: settle_delay_ms.map(Duration::from_millis),
            },
            json_output,
        ),
        Commands::Check { config } => commands::check::run(
            runtime.as_ref(),
            &config,
            InstallOptions::default(),
            json_output,
        ),
        Commands::Show { config } => commands::show::run(&config),
        Commands::Completions { shell } => commands::completions::run::<Cli>(shell),
        Commands::ManPages { dir } => commands::man_pages::run::<Cli>(&dir),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(CommandError {
            code,
            message,
            details,
        }) => {
            eprintln!("error: {message}");
            for detail in details {
                eprintln!("  - {detail}");
            }
            ExitCode::from(code)
        }
    }
}
