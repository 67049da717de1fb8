//! # Navigation Control Benchmark

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use car_lib::{
    hw::{Actuator, SensorArray},
    line_sense::{centroid, TurnDetParams, TurnDetector},
    nav_ctrl::{InputData, NavCtrl, NavCtrlParams},
    odom::Odometry,
    sim::{SimCar, SimParams},
};
use util::module::State;

fn nav_ctrl_benchmark(c: &mut Criterion) {
    // ---- Build a reading from the simulated track ----

    let odom = Arc::new(Odometry::new());
    let mut car = SimCar::new(
        SimParams {
            initial_offset_m: 0.004,
            ..Default::default()
        },
        odom.clone(),
    );
    let reading = car.read().unwrap();

    // Bench the estimators on their own
    c.bench_function("line_sense::centroid", |b| {
        b.iter(|| centroid(black_box(&reading)))
    });

    let turn_det = TurnDetector::new(TurnDetParams::default());
    c.bench_function("TurnDetector::is_turn", |b| {
        b.iter(|| turn_det.is_turn(black_box(&reading)))
    });

    // Bench a full following cycle
    let mut nav_ctrl = NavCtrl::new(NavCtrlParams::default(), odom.clone()).unwrap();
    let input = InputData::new(reading);

    c.bench_function("NavCtrl::proc", |b| {
        b.iter(|| nav_ctrl.proc(black_box(&input)).unwrap())
    });

    // Bench a closed loop cycle including the simulation
    let mut nav_ctrl = NavCtrl::new(NavCtrlParams::default(), odom.clone()).unwrap();

    c.bench_function("NavCtrl::proc::closed_loop", |b| {
        b.iter(|| {
            let input = InputData::new(car.read().unwrap());
            let (cmd, _) = nav_ctrl.proc(&input).unwrap();
            car.apply(&cmd).unwrap();
            car.step();
        })
    });
}

criterion_group!(benches, nav_ctrl_benchmark);
criterion_main!(benches);
