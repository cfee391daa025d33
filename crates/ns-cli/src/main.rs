use clap::{Parser, Subcommand};
use color_eyre::Result;
use color_eyre::eyre::WrapErr;
use env_logger::Env;
use log::info;
use ns_core::{
    CanvasTransform, EditorConfig, MAX_FLAT_HOSTS, MAX_FLAT_SWITCHES, MAX_HOSTS_PER_SUBNET,
    MAX_SUBNETS, SpringLayout, Topology, generate_flat, generate_subnet, layout_topology,
    load_topology, save_topology, topology,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Build, normalize, and run network topologies for the emulator
#[derive(Parser, Debug)]
#[command(name = "netsketch", author, version, about, long_about = None)]
struct Args {
    /// Editor configuration JSON (layout tuning, emulator command)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a topology procedurally
    Generate {
        #[command(subcommand)]
        shape: Shape,
    },

    /// Validate a topology file and re-emit it in canonical form
    Canonicalize {
        file: PathBuf,

        /// Write here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the canvas coordinates the editor would assign to each node
    Layout { file: PathBuf },

    /// Validate a topology file and hand it to the emulator
    Run { file: PathBuf },
}

#[derive(Subcommand, Debug)]
enum Shape {
    /// Every host wired to one switch
    Flat {
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_FLAT_HOSTS)))]
        hosts: u32,

        /// Accepted for compatibility; only s1 is wired
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_FLAT_SWITCHES)))]
        switches: u32,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Subnet switches with their hosts, all wired to a central switch
    Subnet {
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_SUBNETS)))]
        subnets: u32,

        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_HOSTS_PER_SUBNET)))]
        hosts_per_subnet: u32,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Debug, Serialize)]
struct Coord {
    x: f64,
    y: f64,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = match &args.config {
        Some(path) => EditorConfig::load(path)?,
        None => EditorConfig::default(),
    };

    match args.command {
        Command::Generate { shape } => {
            let (topology, output) = match shape {
                Shape::Flat {
                    hosts,
                    switches,
                    output,
                } => (generate_flat(hosts, switches), output),
                Shape::Subnet {
                    subnets,
                    hosts_per_subnet,
                    output,
                } => (generate_subnet(subnets, hosts_per_subnet), output),
            };
            emit(&topology, output.as_deref())
        }
        Command::Canonicalize { file, output } => {
            let topology = load_topology(&file)?;
            emit(&topology, output.as_deref())
        }
        Command::Layout { file } => {
            let topology = load_topology(&file)?;
            let coords = layout_coords(&topology, &config);
            let json = serde_json::to_string_pretty(&coords).wrap_err("Failed to encode layout")?;
            println!("{json}");
            Ok(())
        }
        Command::Run { file } => {
            load_topology(&file)?;
            let mut child = ns_core::launch(&config.emulator, &file)?;
            let status = child.wait().wrap_err("Failed to wait for the emulator")?;
            info!("Emulator exited with {status}");
            Ok(())
        }
    }
}

/// Write canonical text to `output`, or stdout if none.
fn emit(topology: &Topology, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            let written = save_topology(path, topology)?;
            info!("Wrote {}", written.display());
        }
        None => {
            std::io::stdout()
                .write_all(&topology::save(topology))
                .wrap_err("Failed to write to stdout")?;
        }
    }
    Ok(())
}

fn layout_coords(topology: &Topology, config: &EditorConfig) -> BTreeMap<String, Coord> {
    let engine = SpringLayout::new(config.layout.clone());
    let transform: CanvasTransform = config.layout.transform;
    layout_topology(&engine, topology, transform)
        .into_iter()
        .map(|(name, p)| (name.to_string(), Coord { x: p.x, y: p.y }))
        .collect()
}
