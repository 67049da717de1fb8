//! Main car executable entry point.
//!
//! # Architecture
//!
//! The general execution methodology consists of:
//!
//!     - Initialise all modules
//!     - Main loop:
//!         - Line sensor acquisition
//!         - Navigation control processing
//!         - Motor demands
//!         - Simulation step
//!         - Telemetry
//!
//! The car hardware is stood in for by the simulation, which owns the
//! encoder side of the shared odometry counters.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{eyre::WrapErr, Report};
use log::{debug, info, warn};
use std::thread;
use std::time::{Duration, Instant};
use structopt::StructOpt;

// Internal
use car_lib::{
    data_store::DataStore,
    hw::{Actuator, DriveCmd, SensorArray},
    nav_ctrl::{InputData, NavCmd, NavState},
    odom::TickRate,
    params::ExecParams,
    sim::{SimCar, SimParams},
    tm::{TmFrame, TmWriter},
};
use util::{
    logger::{logger_init, LevelFilter},
    module::State,
    session::Session,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Line following car executable.
#[derive(Debug, StructOpt)]
#[structopt(name = "car_exec")]
struct Opt {
    /// Override the number of cycles to run for.
    #[structopt(long)]
    cycles: Option<u64>,

    /// Disable writing telemetry to the session archive.
    #[structopt(long = "no-tm")]
    no_tm: bool,

    /// Run cycles back to back instead of at the target cycle period.
    #[structopt(long)]
    fast: bool,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    let opt = Opt::from_args();

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new("car_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Debug, &session).wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Line Follower Car Executable\n");
    info!("Session directory: {:?}\n", session.session_root);
    debug!("CLI arguments: {:?}", opt);

    // ---- LOAD PARAMETERS ----

    let exec_params: ExecParams =
        util::params::load("car_exec.toml").wrap_err("Could not load exec params")?;

    let sim_params: SimParams =
        util::params::load("sim.toml").wrap_err("Could not load sim params")?;

    info!("Exec parameters loaded");

    let max_cycles = opt.cycles.unwrap_or(exec_params.max_cycles);
    let tm_enabled = exec_params.tm_enabled && !opt.no_tm;

    // ---- INITIALISE DATASTORE ----

    info!("Initialising modules...");

    let mut ds = DataStore::default();

    // ---- INITIALISE MODULES ----

    ds.nav_ctrl
        .init("nav_ctrl.toml", &session)
        .wrap_err("Failed to initialise NavCtrl")?;
    info!("NavCtrl init complete");

    ds.tick_rate = TickRate::new(exec_params.rate_bin_s);

    // The simulated encoders tick the same counters NavCtrl reads
    let mut car = SimCar::new(sim_params, ds.nav_ctrl.odometry());
    info!("SimCar initialised");

    let mut tm_writer = if tm_enabled {
        let path = session.arch_root.join("tm.txt");
        let w = TmWriter::new(&path, exec_params.tm_start_len, exec_params.tm_end_len)
            .wrap_err("Failed to initialise the TmWriter")?;
        info!("Writing telemetry to {:?}", path);
        Some(w)
    } else {
        info!("Telemetry disabled");
        None
    };

    info!("Module initialisation complete\n");

    // ---- MAIN LOOP ----

    info!("Begining main loop\n");

    loop {
        // Get cycle start time
        let cycle_start_instant = Instant::now();

        // Clear items that need wiping at the start of the cycle
        ds.cycle_start();

        let last_cycle = ds.num_cycles + 1 >= max_cycles;

        // ---- DATA INPUT ----

        let reading = car.read().wrap_err("Failed to read the line sensors")?;
        ds.nav_ctrl_input = InputData::new(reading);

        if last_cycle {
            info!("Cycle limit ({}) reached, parking", max_cycles);
            ds.nav_ctrl_input.cmd = Some(NavCmd::Park);
        }

        // ---- CONTROL ALGORITHM PROCESSING ----

        match ds.nav_ctrl.proc(&ds.nav_ctrl_input) {
            Ok((o, r)) => {
                ds.nav_ctrl_output = o;
                ds.nav_ctrl_status_rpt = Some(r);
            }
            Err(e) => {
                // Output was cleared at cycle start so the wheels stop
                warn!("Error during NavCtrl processing: {}", e)
            }
        };

        // ---- MOTOR DEMANDS ----

        car.apply(&ds.nav_ctrl_output).wrap_err("Failed to apply the drive command")?;

        car.step();

        let odom = ds.nav_ctrl.odometry().snapshot();
        if let Some(rates) = ds.tick_rate.update(odom, car.time_s()) {
            debug!(
                "Wheel rates: L {:.1} tps, R {:.1} tps",
                rates.left_tps, rates.right_tps
            );
        }

        // ---- TELEMETRY ----

        if let (Some(w), Some(rpt)) = (tm_writer.as_mut(), ds.nav_ctrl_status_rpt.as_ref()) {
            let frame = TmFrame::new(
                ds.num_cycles,
                car.time_s(),
                ds.nav_ctrl_input.reading,
                rpt,
                &ds.nav_ctrl_output,
                ds.tick_rate.rates(),
            );

            if let Err(e) = w.write(&frame) {
                warn!("TmWriter error: {}", e);
            }
        }

        // ---- CYCLE MANAGEMENT ----

        // Increment cycle counter
        ds.num_cycles += 1;

        if ds.nav_ctrl.state() == NavState::Parked {
            info!(
                "Parked after {} cycles and {} U-turns",
                ds.num_cycles,
                ds.nav_ctrl.turn_count()
            );
            break;
        }

        if opt.fast {
            continue;
        }

        let cycle_dur = Instant::now() - cycle_start_instant;
        let cycle_period = Duration::from_secs_f64(exec_params.cycle_period_s);

        // Get sleep duration
        match cycle_period.checked_sub(cycle_dur) {
            Some(d) => {
                ds.num_consec_cycle_overruns = 0;
                thread::sleep(d);
            }
            None => {
                warn!(
                    "Cycle overran by {:.06} s",
                    cycle_dur.as_secs_f64() - cycle_period.as_secs_f64()
                );
                ds.num_consec_cycle_overruns += 1;
            }
        }
    }

    // ---- SHUTDOWN ----

    // The cycle that parks may have commanded the post U-turn settle
    car.apply(&DriveCmd::stop()).wrap_err("Failed to stop the wheels")?;
    info!("Wheels stopped");

    if let Some(mut w) = tm_writer {
        w.flush().wrap_err("Failed to flush telemetry")?;
    }

    let pose = car.pose();
    info!(
        "Final pose: x {:.3} m, y {:.3} m, heading {:.3} rad",
        pose.x_m, pose.y_m, pose.heading_rad
    );

    info!("End of execution");

    Ok(())
}
