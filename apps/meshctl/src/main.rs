use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use figment::providers::{Env, Format, Yaml};
use figment::Figment;
use mesh_settings::catalog;
use mesh_settings::infra::{EffectiveUidGuard, SysfsBackend};
use mesh_settings::{Config, Report, Session, SettingsDispatcher, SysfsLayout, Target};
use tracing_subscriber::EnvFilter;

const PROGRAM: &str = "meshctl";

/// Read and change batman-adv mesh settings
#[derive(Debug, Parser)]
#[command(name = PROGRAM, version)]
struct Cli {
    /// Mesh interface (defaults to the configured one, usually bat0)
    #[arg(short = 'm', long = "meshif", value_name = "IFACE", global = true)]
    meshif: Option<String>,

    /// Address a VLAN on top of the mesh interface
    #[arg(long, value_name = "VID", global = true)]
    vid: Option<u16>,

    /// YAML configuration file
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Debug, Subcommand)]
enum CliCommand {
    /// List known settings
    List {
        /// Print the catalog as JSON
        #[arg(long)]
        json: bool,
    },

    /// `<setting> [-h] [value [secondary]]`
    #[command(external_subcommand)]
    Setting(Vec<String>),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_tracing(cli.verbose);

    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error - {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn setup_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    let mut figment = Figment::new();
    if let Some(path) = path {
        figment = figment.merge(Yaml::file(path));
    }
    figment
        .merge(Env::prefixed("MESHCTL_").only(&["sysfs_root", "family_name", "mesh_iface"]))
        .extract()
        .context("failed to load configuration")
}

fn run(cli: Cli) -> Result<ExitCode> {
    let config = load_config(cli.config.as_ref())?;
    tracing::debug!(?config, "configuration loaded");

    let argv = match cli.command {
        CliCommand::List { json } => return list(json),
        CliCommand::Setting(argv) => argv,
    };

    let Some(command) = argv.first() else {
        anyhow::bail!("no setting given");
    };
    let Some(descriptor) = catalog::find(command) else {
        eprintln!("Error - unknown setting: {command}");
        return Ok(ExitCode::FAILURE);
    };

    let target = Target {
        mesh_iface: cli.meshif.unwrap_or_else(|| config.mesh_iface.clone()),
        vid: cli.vid,
    };

    let mut session = match Session::open(&target.mesh_iface, &config) {
        Ok(session) => session,
        Err(err) => {
            tracing::warn!(iface = %target.mesh_iface, error = %err, "netlink unavailable, using sysfs only");
            Session::without_transport()
        }
    };

    let layout = SysfsLayout::new(config.sysfs_root.clone());
    let privileges = EffectiveUidGuard::new();
    let mut stderr = io::stderr();
    let mut dispatcher =
        SettingsDispatcher::new(&mut session, &SysfsBackend, &privileges, &layout, &mut stderr)
            .with_program(PROGRAM);

    match dispatcher.handle(descriptor, &target, &argv) {
        Ok(Report::Value(value)) => {
            println!("{value}");
            Ok(ExitCode::SUCCESS)
        }
        Ok(Report::Help | Report::Written) => Ok(ExitCode::SUCCESS),
        Err(_) => Ok(ExitCode::FAILURE),
    }
}

fn list(json: bool) -> Result<ExitCode> {
    let summaries = catalog::summaries();
    if json {
        let rendered =
            serde_json::to_string_pretty(&summaries).context("failed to render settings")?;
        println!("{rendered}");
        return Ok(ExitCode::SUCCESS);
    }

    for summary in &summaries {
        let backends = match (summary.netlink_read, summary.sysfs_entry) {
            (true, Some(_)) => "netlink, sysfs",
            (true, None) => "netlink",
            (false, Some(_)) => "sysfs",
            (false, None) => "-",
        };
        let scope = if summary.per_vlan { "mesh, vlan" } else { "mesh" };
        println!("{:<24} {:<6} {:<16} {}", summary.name, summary.abbr, backends, scope);
    }
    Ok(ExitCode::SUCCESS)
}
