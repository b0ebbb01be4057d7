use clap::{Parser, Subcommand};
use pwa_press::compile::{DirectorySink, compile};
use pwa_press::imaging::select_backend;
use pwa_press::resolve::{IdentityResolver, NoGroups};
use pwa_press::{config, output};
use std::path::PathBuf;

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup — trivial, called exactly once
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "pwa-press")]
#[command(about = "Progressive Web App asset generator")]
#[command(long_about = "\
Progressive Web App asset generator

One declarative pwa.toml describes your web manifest, service worker, and
favicon set. One build pass turns it into the files a browser needs.

Project structure:

  my-site/
  ├── pwa.toml                     # Declarative PWA configuration
  ├── assets/
  │   ├── icon.png                 # Icon source (large PNG)
  │   ├── icon.svg                 # Vector source (passed through as-is)
  │   └── sw.js                    # Your service worker logic
  └── public/                      # Build output (--output)
      ├── site.webmanifest
      ├── sw.js                    # Generated rules + your script
      ├── favicon.ico, favicon-*.png, apple-touch-icon.png, icon-*.png
      └── pwa/                     # Derived manifest icons

Artifacts are deterministic: the same pwa.toml always produces the same
bytes, and nothing is written unless the whole build succeeds.

Run 'pwa-press gen-config' to generate a documented pwa.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Project directory containing pwa.toml (sources resolve against it)
    #[arg(long, default_value = ".", global = true)]
    source: PathBuf,

    /// Output directory for generated artifacts
    #[arg(long, default_value = "public", global = true)]
    output: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a full build pass: validate, build, write
    Build,
    /// Validate pwa.toml without building
    Check,
    /// Print a stock pwa.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::Build => {
            let pwa_config = config::load_config(&cli.source)?;
            init_thread_pool(&pwa_config.processing);
            let backend = select_backend(pwa_config.image_backend);
            let mut sink = DirectorySink::new(&cli.output);
            let summary = compile(
                &pwa_config,
                &cli.source,
                &*backend,
                &IdentityResolver,
                &NoGroups,
                &mut sink,
            )?;
            output::print_build_output(&summary);
            println!("==> Build complete: {}", cli.output.display());
        }
        Command::Check => {
            println!("==> Checking {}", cli.source.display());
            config::load_config(&cli.source)?;
            println!("==> Configuration is valid");
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores — user can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let workers = config::effective_workers(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .build_global()
        .ok();
}
