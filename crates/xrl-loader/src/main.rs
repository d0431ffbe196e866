//! xrl-info: inspect runtime discovery and negotiation from the command line.
//!
//! - `manifests`: list the manifests the search considers
//! - `runtime`: load the active runtime and print what it negotiated
//! - `smoke`: also create an instance, query it and destroy it

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use xrl_loader::abi::{InstanceCreateInfo, InstanceProperties, CURRENT_API_VERSION};
use xrl_loader::config::LOG_ENV;
use xrl_loader::{FilesystemManifests, Loader, LoaderConfig, LoaderError};

#[derive(Parser, Debug)]
#[command(name = "xrl-info")]
#[command(about = "Runtime discovery and negotiation diagnostics")]
struct Args {
    /// Use this runtime manifest instead of searching
    #[arg(long, value_name = "PATH", global = true)]
    runtime_json: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List candidate runtime manifests in search order
    Manifests,
    /// Load the runtime and report the negotiated versions and extensions
    Runtime,
    /// Create and destroy an instance against the runtime
    Smoke,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let fallback = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let mut config = LoaderConfig::from_env();
    if let Some(path) = args.runtime_json {
        config.runtime_json_override = Some(path);
    }

    match args.command {
        Command::Manifests => list_manifests(config),
        Command::Runtime => show_runtime(config)?,
        Command::Smoke => smoke(config)?,
    }
    Ok(())
}

fn list_manifests(config: LoaderConfig) {
    let source = FilesystemManifests::new(config);
    for path in source.candidate_paths() {
        let state = if path.is_file() { "found" } else { "missing" };
        println!("{state:>8}  {}", path.display());
    }
    for manifest in source.discover() {
        match manifest {
            Ok(m) => println!(
                "runtime   {} -> {}",
                m.name.as_deref().unwrap_or("<unnamed>"),
                m.library_path.display()
            ),
            Err(e) => println!("invalid   {e}"),
        }
    }
}

fn show_runtime(config: LoaderConfig) -> Result<(), LoaderError> {
    let loader = Loader::new(config);
    let session = loader.load_runtime("xrl-info")?;

    println!("manifest:          {}", session.manifest_path().display());
    if let Some(name) = session.runtime_name() {
        println!("name:              {name}");
    }
    println!("interface version: {}", session.interface_version());
    println!("api version:       {}", session.api_version());

    let mut extensions = Vec::new();
    session.instance_extension_properties(&mut extensions)?;
    println!("extensions:        {}", extensions.len());
    for ext in &extensions {
        println!("  {} (v{})", ext.name, ext.version);
    }

    loader.unload_runtime("xrl-info");
    Ok(())
}

fn smoke(config: LoaderConfig) -> Result<(), LoaderError> {
    let loader = Loader::new(config);
    let session = loader.load_runtime("xrCreateInstance")?;

    let info = InstanceCreateInfo::new("xrl-info", CURRENT_API_VERSION);
    let instance = session.create_instance(&info)?;
    println!("created instance {:#x}", instance.raw());

    let table = loader.dispatch_table(instance).ok_or(LoaderError::InstanceLost)?;
    let mut props = InstanceProperties::empty();
    LoaderError::check(unsafe { (table.get_instance_properties)(instance, &mut props) })?;
    println!("runtime:          {} {}", props.runtime_name(), props.runtime_version);

    session.destroy_instance(instance);
    println!("destroyed instance");

    drop(session);
    loader.unload_runtime("xrDestroyInstance");
    Ok(())
}
