//! # Gain Tuning
//!
//! Runs the simulated car over the configured track once for every
//! combination of the given drive controller gain factors, and ranks the
//! combinations by accumulated line following error.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::{cmp::Ordering, fs::File};

use color_eyre::{eyre::WrapErr, Result};
use log::info;
use serde::Serialize;
use structopt::StructOpt;

use car_lib::{
    drive_ctrl::DriveCtrlParams,
    nav_ctrl::NavCtrlParams,
    sim::{gain_cost, RunSummary, SimParams},
};
use util::{
    logger::{logger_init, LevelFilter},
    session::Session,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Drive controller gain tuning over the simulated track.
#[derive(Debug, StructOpt)]
#[structopt(name = "gain_tune")]
struct Opt {
    /// Proportional gain factors to try.
    #[structopt(long, use_delimiter = true, default_value = "0.35,0.7,1.4")]
    kp: Vec<f64>,

    /// Integral gain factors to try.
    #[structopt(long, use_delimiter = true, default_value = "0.0")]
    ki: Vec<f64>,

    /// Derivative gain factors to try.
    #[structopt(long, use_delimiter = true, default_value = "7.0,14.0,28.0")]
    kd: Vec<f64>,

    /// Cycle limit of each run.
    #[structopt(long, default_value = "1000")]
    cycles: u64,
}

/// One evaluated gain combination.
#[derive(Debug, Serialize)]
struct Trial {
    k_p_factor: f64,
    k_i_factor: f64,
    k_d_factor: f64,
    summary: RunSummary,
}

// ---------------------------------------------------------------------------
// MAIN
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    color_eyre::install()?;

    let opt = Opt::from_args();

    // ---- EARLY INITIALISATION ----

    let session = Session::new("gain_tune", "sessions").wrap_err("Failed to create the session")?;

    logger_init(LevelFilter::Info, &session).wrap_err("Failed to initialise logging")?;

    info!("Gain Tuning\n");

    // ---- LOAD PARAMETERS ----

    let nav_params: NavCtrlParams =
        util::params::load("nav_ctrl.toml").wrap_err("Could not load nav_ctrl params")?;

    let sim_params: SimParams =
        util::params::load("sim.toml").wrap_err("Could not load sim params")?;

    // ---- TRIALS ----

    let mut trials = Vec::new();

    for &k_p_factor in opt.kp.iter() {
        for &k_i_factor in opt.ki.iter() {
            for &k_d_factor in opt.kd.iter() {
                let drive_ctrl = DriveCtrlParams {
                    k_p_factor,
                    k_i_factor,
                    k_d_factor,
                    ..nav_params.drive_ctrl
                };

                let summary = gain_cost(
                    drive_ctrl,
                    nav_params.clone(),
                    sim_params.clone(),
                    opt.cycles,
                )
                .wrap_err("Simulated run failed")?;

                info!(
                    "kp {:6.3} ki {:6.3} kd {:6.3}: err {:9.4} m, max {:.4} m, {:?}",
                    k_p_factor,
                    k_i_factor,
                    k_d_factor,
                    summary.abs_err_m,
                    summary.max_offset_m,
                    summary.state
                );

                trials.push(Trial {
                    k_p_factor,
                    k_i_factor,
                    k_d_factor,
                    summary,
                });
            }
        }
    }

    // ---- RESULTS ----

    trials.sort_by(|a, b| {
        a.summary
            .abs_err_m
            .partial_cmp(&b.summary.abs_err_m)
            .unwrap_or(Ordering::Equal)
    });

    if let Some(best) = trials.first() {
        info!(
            "Best of {}: kp {} ki {} kd {} (err {:.4} m)",
            trials.len(),
            best.k_p_factor,
            best.k_i_factor,
            best.k_d_factor,
            best.summary.abs_err_m
        );
    }

    let path = session.arch_root.join("gain_tune.json");
    let file = File::create(&path).wrap_err("Failed to create the results file")?;
    serde_json::to_writer_pretty(file, &trials).wrap_err("Failed to write the results")?;
    info!("Results written to {:?}", path);

    Ok(())
}
