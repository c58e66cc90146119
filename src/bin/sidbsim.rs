// SPDX-FileCopyrightText: Copyright (c) 2024 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0

//! Command line front end for exact SiDB layout simulation.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use serde::Serialize;
use sidbsim::cluster::Linkage;
use sidbsim::error::SimulationError;
use sidbsim::ground_state_space::{ground_state_space_with_landscape, GroundStateSpaceParams};
use sidbsim::layout::{ExternalPotentials, PotentialLandscape, SidbLayout};
use sidbsim::physics::SimulationParameters;
use sidbsim::sim::{clustercomplete_with_stats, exhaustive_ground_state_simulation, ClusterCompleteParams, SimulationResult};

#[derive(Parser)]
#[command(name = "sidbsim", about = "sidbsim: exact physical simulation of SiDB layouts")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Find all physically valid charge distributions with ClusterComplete.
    Simulate(SimulateArgs),

    /// Construct the Ground State Space and report how much of the charge
    /// space it prunes.
    Gss(GssArgs),

    /// Enumerate all charge distributions exhaustively.
    ///
    /// Only feasible for small layouts.
    Exhaustive(ExhaustiveArgs),
}

/// Physical parameters shared by all subcommands.
#[derive(Parser, Debug)]
struct PhysicsArgs {
    /// Layout JSON with `sidbs` (SiQAD coordinates) and optional `defects`.
    layout: PathBuf,

    /// Number of charge states: 2 (negative, neutral) or 3 (with positive).
    #[clap(long, default_value_t = 3)]
    base: u8,

    /// (-/0) charge transition level in eV.
    #[clap(long, default_value_t = -0.32, allow_negative_numbers = true)]
    mu_minus: f64,

    /// Relative permittivity.
    #[clap(long, default_value_t = 5.6)]
    epsilon_r: f64,

    /// Thomas-Fermi screening length in nm.
    #[clap(long, default_value_t = 5.0)]
    lambda_tf: f64,

    /// Potential applied to every SiDB in V.
    #[clap(long, default_value_t = 0.0, allow_negative_numbers = true)]
    global_potential: f64,
}

impl PhysicsArgs {
    fn simulation_parameters(&self) -> SimulationParameters {
        SimulationParameters {
            base: self.base,
            mu_minus: self.mu_minus,
            epsilon_r: self.epsilon_r,
            lambda_tf: self.lambda_tf,
            ..Default::default()
        }
    }

    fn external_potentials(&self) -> ExternalPotentials {
        ExternalPotentials {
            global: self.global_potential,
            ..Default::default()
        }
    }
}

#[derive(Parser, Debug)]
struct SimulateArgs {
    #[command(flatten)]
    physics: PhysicsArgs,

    /// Worker threads. Defaults to the available parallelism.
    #[clap(long)]
    threads: Option<usize>,

    /// Largest cluster for which validity witnesses are partitioned.
    #[clap(long, default_value_t = 6)]
    witness_limit: usize,

    /// Cap on the witnesses shared between charge states during partitioning.
    #[clap(long, default_value_t = 6)]
    overlap_limit: usize,

    /// Linkage of the agglomerative clustering.
    #[clap(long, value_enum, default_value_t = Linkage::MinimumVariance)]
    linkage: Linkage,

    /// Seed for distributing the initial work over the threads.
    #[clap(long)]
    seed: Option<u64>,

    /// Report Ground State Space statistics.
    #[clap(long)]
    report_gss: bool,

    /// Write the result as JSON to this path instead of stdout.
    #[clap(long)]
    output: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct GssArgs {
    #[command(flatten)]
    physics: PhysicsArgs,

    #[clap(long, default_value_t = 12)]
    witness_limit: usize,

    #[clap(long, default_value_t = 6)]
    overlap_limit: usize,

    #[clap(long, value_enum, default_value_t = Linkage::MinimumVariance)]
    linkage: Linkage,
}

#[derive(Parser, Debug)]
struct ExhaustiveArgs {
    #[command(flatten)]
    physics: PhysicsArgs,

    #[clap(long)]
    output: Option<PathBuf>,
}

#[derive(Serialize)]
struct ChargeDistributionReport {
    charges: String,
    charge_index: u64,
    system_energy: f64,
    ground_state: bool,
}

#[derive(Serialize)]
struct SimulationReport<'a> {
    algorithm_name: &'a str,
    runtime_seconds: f64,
    simulation_parameters: &'a SimulationParameters,
    additional_simulation_parameters: &'a indexmap::IndexMap<String, f64>,
    charge_distributions: Vec<ChargeDistributionReport>,
}

impl<'a> SimulationReport<'a> {
    fn new(result: &'a SimulationResult) -> Self {
        let base = result.simulation_parameters.base;
        let min_energy = result.minimum_energy();
        let charge_distributions = result
            .sorted_by_energy()
            .into_iter()
            .map(|cd| ChargeDistributionReport {
                charges: cd.charge_string(),
                charge_index: cd.charge_index(base),
                system_energy: cd.system_energy,
                ground_state: min_energy
                    .is_some_and(|e| cd.system_energy - e < sidbsim::physics::POP_STABILITY_ERR),
            })
            .collect();
        Self {
            algorithm_name: &result.algorithm_name,
            runtime_seconds: result.simulation_runtime.as_secs_f64(),
            simulation_parameters: &result.simulation_parameters,
            additional_simulation_parameters: &result.additional_simulation_parameters,
            charge_distributions,
        }
    }
}

fn load_layout(path: &Path) -> Result<SidbLayout, SimulationError> {
    let layout = SidbLayout::load_json(path)?;
    clilog::info!(
        "loaded {} SiDBs and {} defects from {}",
        layout.num_sidbs(),
        layout.defects.len(),
        path.display()
    );
    Ok(layout)
}

fn write_result(result: &SimulationResult, output: Option<&Path>) -> Result<(), SimulationError> {
    clilog::info!(
        "{}: {} physically valid charge distributions in {:.4} s",
        result.algorithm_name,
        result.num_charge_distributions(),
        result.simulation_runtime.as_secs_f64()
    );
    if let Some(e) = result.minimum_energy() {
        clilog::info!("ground state energy: {:.10} eV", e);
    }
    let report = SimulationReport::new(result);
    match output {
        Some(path) => {
            let file = std::fs::File::create(path)?;
            serde_json::to_writer_pretty(std::io::BufWriter::new(file), &report)?;
            clilog::info!("result written to {}", path.display());
        }
        None => println!("{}", serde_json::to_string_pretty(&report)?),
    }
    Ok(())
}

fn cmd_simulate(args: SimulateArgs) -> Result<(), SimulationError> {
    let layout = load_layout(&args.physics.layout)?;
    let defaults = ClusterCompleteParams::default();
    let params = ClusterCompleteParams {
        simulation_parameters: args.physics.simulation_parameters(),
        global_potential: args.physics.global_potential,
        validity_witness_partitioning_max_cluster_size_gss: args.witness_limit,
        num_overlapping_witnesses_limit_gss: args.overlap_limit,
        available_threads: args.threads.unwrap_or(defaults.available_threads),
        report_gss_stats: args.report_gss,
        seed: args.seed,
        linkage: args.linkage,
        ..defaults
    };
    let (result, stats) = clustercomplete_with_stats(&layout, &params)?;
    clilog::debug!("unfolding statistics: {:?}", stats);
    write_result(&result, args.output.as_deref())
}

fn cmd_gss(args: GssArgs) -> Result<(), SimulationError> {
    let layout = load_layout(&args.physics.layout)?;
    let params = GroundStateSpaceParams {
        simulation_parameters: args.physics.simulation_parameters(),
        witness_partitioning_max_cluster_size: args.witness_limit,
        num_overlapping_witnesses_limit: args.overlap_limit,
        linkage: args.linkage,
    };
    let landscape = PotentialLandscape::with_external_potentials(
        &layout,
        &params.simulation_parameters,
        &args.physics.external_potentials(),
    )?;
    ground_state_space_with_landscape(&landscape, &params)?.report();
    Ok(())
}

fn cmd_exhaustive(args: ExhaustiveArgs) -> Result<(), SimulationError> {
    let layout = load_layout(&args.physics.layout)?;
    let result = exhaustive_ground_state_simulation(
        &layout,
        &args.physics.simulation_parameters(),
        &args.physics.external_potentials(),
    )?;
    write_result(&result, args.output.as_deref())
}

fn main() {
    clilog::init_stderr_color_debug();
    let cli = Cli::parse();

    let res = match cli.command {
        Commands::Simulate(args) => {
            clilog::info!("sidbsim simulate args:\n{:#?}", args);
            cmd_simulate(args)
        }
        Commands::Gss(args) => {
            clilog::info!("sidbsim gss args:\n{:#?}", args);
            cmd_gss(args)
        }
        Commands::Exhaustive(args) => {
            clilog::info!("sidbsim exhaustive args:\n{:#?}", args);
            cmd_exhaustive(args)
        }
    };
    if let Err(e) = res {
        clilog::error!("{}", e);
        std::process::exit(1);
    }
}
