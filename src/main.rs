//! batplot - Plot batsim simulation outputs.
//!
//! Draws Gantt charts, power, energy and queue metrics of one or more
//! simulation runs as stacked panels, plots the distribution of probed
//! energy values, and checks job allocations against a workload.

mod display;
mod error;
mod histogram;
mod layout;
mod plot;
mod records;
mod render;
mod summary;
mod verify;

use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};
use env_logger::Env;
use layout::{Features, Plan, PlotConfig, SourceLists};
use log::info;
use records::TimeWindow;
use std::path::PathBuf;

/// Plot and check the outputs of batsim simulations
#[derive(Parser, Debug)]
#[command(name = "batplot")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Draw time-series panels of one or more simulation runs
    Plot(PlotArgs),
    /// Plot the distribution of energy values found in a probe log
    Histogram(HistogramArgs),
    /// Check job allocations against the desired allocations of a workload
    Verify(VerifyArgs),
}

#[derive(Args, Debug)]
struct PlotArgs {
    /// Job records (jobs.csv), one per instance
    #[arg(short = 'j', long = "jobsCSV", num_args = 1..)]
    jobs_csv: Vec<PathBuf>,

    /// Power-state changes (pstate_changes.csv), one per job file
    #[arg(short = 'p', long = "pstatesCSV", num_args = 1..)]
    pstates_csv: Vec<PathBuf>,

    /// Energy traces (consumed_energy.csv), one per instance
    #[arg(short = 'e', long = "energyCSV", num_args = 1..)]
    energy_csv: Vec<PathBuf>,

    /// Liquid load horizon traces, one per instance
    #[arg(short = 'l', long = "llhCSV", num_args = 1..)]
    llh_csv: Vec<PathBuf>,

    /// Display names of the instances
    #[arg(long, num_args = 1.., default_value = "Unnamed")]
    names: Vec<String>,

    /// Draw one Gantt chart per instance (requires jobsCSV)
    #[arg(long)]
    gantt: bool,

    /// Draw instantaneous power (requires energyCSV)
    #[arg(long)]
    power: bool,

    /// Draw cumulative energy (requires energyCSV)
    #[arg(long)]
    energy: bool,

    /// Draw the liquid load horizon against job waiting times (requires llhCSV)
    #[arg(long)]
    llh: bool,

    /// Draw the load in queue (requires llhCSV)
    #[arg(long)]
    load_in_queue: bool,

    /// Draw the number of jobs in queue (requires llhCSV)
    #[arg(long)]
    nb_jobs_in_queue: bool,

    /// Draw the size of the priority job (requires llhCSV)
    #[arg(long)]
    priority_job_size: bool,

    /// Draw the expected waiting time of the priority job (requires llhCSV)
    #[arg(long)]
    priority_job_expected_waiting_time: bool,

    /// Draw whether the priority job is expected to start soon (requires llhCSV)
    #[arg(long)]
    priority_job_starting_expected_soon: bool,

    /// Power states of switched-off machines
    #[arg(long, num_args = 1.., allow_negative_numbers = true)]
    off: Vec<i32>,

    /// Power states of machines switching on
    #[arg(long, num_args = 1.., allow_negative_numbers = true)]
    switchon: Vec<i32>,

    /// Power states of machines switching off
    #[arg(long, num_args = 1.., allow_negative_numbers = true)]
    switchoff: Vec<i32>,

    /// Draw a horizontal line at this LLH value
    #[arg(long)]
    llh_bound: Option<f64>,

    /// Draw a horizontal line at this priority job waiting time
    #[arg(long)]
    priority_job_waiting_time_bound: Option<f64>,

    /// Only plot data between MIN and MAX (inclusive)
    #[arg(long, num_args = 2, value_names = ["MIN", "MAX"], allow_negative_numbers = true)]
    time_window: Option<Vec<f64>>,

    /// Where the plots end and the legend column starts (0-1)
    #[arg(long)]
    force_right_adjust: Option<f64>,

    /// Print per-instance statistics
    #[arg(long)]
    summary: bool,

    /// Write the figure as SVG instead of showing it in the terminal
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,
}

impl PlotArgs {
    fn into_config(self) -> Result<PlotConfig> {
        let window = match self.time_window.as_deref() {
            Some(&[min, max]) => {
                if min > max {
                    bail!("time window minimum ({}) exceeds its maximum ({})", min, max);
                }
                TimeWindow::new(Some(min), Some(max))
            }
            _ => TimeWindow::default(),
        };

        Ok(PlotConfig {
            features: Features {
                gantt: self.gantt,
                power: self.power,
                energy: self.energy,
                llh: self.llh,
                load_in_queue: self.load_in_queue,
                nb_jobs_in_queue: self.nb_jobs_in_queue,
                priority_job_size: self.priority_job_size,
                priority_job_waiting_time: self.priority_job_expected_waiting_time,
                priority_job_imminence: self.priority_job_starting_expected_soon,
            },
            sources: SourceLists {
                jobs: self.jobs_csv,
                pstates: self.pstates_csv,
                energy: self.energy_csv,
                llh: self.llh_csv,
            },
            names: self.names,
            off: self.off.into_iter().collect(),
            switch_on: self.switchon.into_iter().collect(),
            switch_off: self.switchoff.into_iter().collect(),
            llh_bound: self.llh_bound,
            priority_wait_bound: self.priority_job_waiting_time_bound,
            window,
            force_right_adjust: self.force_right_adjust,
            summary: self.summary,
        })
    }
}

#[derive(Args, Debug)]
struct HistogramArgs {
    /// Simulation log holding probe events
    #[arg(default_value = "energy_data.csv")]
    input: PathBuf,

    /// Write the histogram as SVG instead of showing it in the terminal
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct VerifyArgs {
    /// Job records produced by the simulation
    #[arg(long)]
    jobs: PathBuf,

    /// Workload whose jobs carry a desired_allocation in their extra data
    #[arg(long)]
    workload: PathBuf,
}

fn run_plot(args: PlotArgs) -> Result<()> {
    let output = args.output.clone();
    let config = args.into_config()?;

    let panel_plan = match layout::plan(&config)? {
        Plan::Nothing => {
            info!("Nothing to draw");
            return Ok(());
        }
        Plan::Draw(panel_plan) => panel_plan,
    };
    info!(
        "Drawing {} panel(s) for {} instance(s)",
        panel_plan.panel_count(),
        panel_plan.instances.len()
    );

    let data = records::load_instances(&panel_plan, &config)?;
    let figure = render::render(&panel_plan, &config, &data);

    match output {
        Some(path) => plot::write_svg(&figure, &path)?,
        None => display::show_figure(&figure)?,
    }

    if config.summary {
        summary::print_summary(&data, config.window);
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match cli.command {
        Command::Plot(args) => run_plot(args),
        Command::Histogram(args) => {
            histogram::run(&args.input, args.output.as_deref());
            Ok(())
        }
        Command::Verify(args) => verify::run(&args.jobs, &args.workload),
    }
}
