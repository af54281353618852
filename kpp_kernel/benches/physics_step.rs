//! Hot-path micro-benchmark for the per-tick physics integrator.
//!
//! Measures throughput of `PhysicsEngine::step` alone, and with the floater
//! count scaled up, in the shape of `pid_benchmark.rs`: one `bench_function`
//! per stage plus a scaling sweep.

use criterion::{Criterion, criterion_group, criterion_main};

use kpp_common::config::{HypothesisParams, PhysicsParams};
use kpp_common::sim::chain::ChainState;
use kpp_common::sim::control::HypothesisFlags;
use kpp_common::sim::floater::{FillState, Floater, FloaterGeometry};

use kpp_kernel::physics::PhysicsEngine;

const FLYWHEEL_INERTIA: f64 = 500.0;

fn geometry() -> FloaterGeometry {
    FloaterGeometry {
        volume: 0.3,
        area: 0.5,
        drag_coefficient: 0.8,
        container_mass: 20.0,
    }
}

fn floaters(count: usize) -> Vec<Floater> {
    (0..count)
        .map(|i| {
            let angle = (i as f64) * std::f64::consts::TAU / count as f64;
            let mut f = Floater::new(i as u32, angle, geometry());
            f.fill_state = if i % 2 == 0 { FillState::Light } else { FillState::Heavy };
            f
        })
        .collect()
}

fn bench_single_floater_step(c: &mut Criterion) {
    let params = PhysicsParams::default();
    let hyp_params = HypothesisParams::default();
    let hyp_flags = HypothesisFlags::default();

    c.bench_function("physics_step_one_floater", |b| {
        b.iter_batched(
            || (ChainState::new(1.0), floaters(1)),
            |(mut chain, mut fl)| {
                PhysicsEngine::step(&mut chain, &mut fl, &params, &hyp_params, &hyp_flags, FLYWHEEL_INERTIA, 0.0)
            },
            criterion::BatchSize::SmallInput,
        );
    });
}

fn bench_step_scales_with_floater_count(c: &mut Criterion) {
    let params = PhysicsParams::default();
    let hyp_params = HypothesisParams::default();
    let hyp_flags = HypothesisFlags::default();

    let mut group = c.benchmark_group("physics_step_by_floater_count");
    for &count in &[2usize, 8, 16, 32] {
        group.bench_function(format!("floaters_{count}"), |b| {
            b.iter_batched(
                || (ChainState::new(1.0), floaters(count)),
                |(mut chain, mut fl)| {
                    PhysicsEngine::step(&mut chain, &mut fl, &params, &hyp_params, &hyp_flags, FLYWHEEL_INERTIA, 0.0)
                },
                criterion::BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

fn bench_step_with_hypotheses_enabled(c: &mut Criterion) {
    let params = PhysicsParams::default();
    let hyp_params = HypothesisParams::default();
    let hyp_flags = HypothesisFlags {
        h1_nanobubbles: true,
        h2_thermal: true,
        ..HypothesisFlags::default()
    };

    c.bench_function("physics_step_with_hypotheses", |b| {
        b.iter_batched(
            || (ChainState::new(1.0), floaters(8)),
            |(mut chain, mut fl)| {
                PhysicsEngine::step(&mut chain, &mut fl, &params, &hyp_params, &hyp_flags, FLYWHEEL_INERTIA, 0.0)
            },
            criterion::BatchSize::SmallInput,
        );
    });
}

criterion_group!(
    benches,
    bench_single_floater_step,
    bench_step_scales_with_floater_count,
    bench_step_with_hypotheses_enabled,
);
criterion_main!(benches);
