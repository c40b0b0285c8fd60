//! Actuation policy micro-benchmark.
//!
//! Measures `ActuationPolicy::decide` over synthetic sensor traces, with and
//! without the foam probe channel, as a function of trace length.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};

use verdant_common::control_unit::config::ControlConfig;
use verdant_common::control_unit::state::ValvePosition;
use verdant_control_unit::control::policy::ActuationPolicy;

/// Conductivity and aux voltage sweeping across both thresholds.
fn trace(len: usize) -> Vec<(f64, f64)> {
    (0..len)
        .map(|i| {
            let phase = i as f64 * 0.05;
            (900.0 + 120.0 * phase.sin(), 1.1 + 0.3 * (phase * 0.7).cos())
        })
        .collect()
}

/// Replay a trace through the policy, tracking the valve like the loop does.
#[inline(never)]
fn replay(policy: &ActuationPolicy, trace: &[(f64, f64)], with_aux: bool) -> (u64, u64) {
    let mut valve = ValvePosition::Open;
    let mut doses = 0;
    let mut moves = 0;
    for &(conductivity, aux) in trace {
        let decision = policy.decide(conductivity, with_aux.then_some(aux), valve);
        if decision.dose {
            doses += 1;
        }
        if let Some(target) = decision.valve {
            valve = target;
            moves += 1;
        }
    }
    (doses, moves)
}

fn bench_policy(c: &mut Criterion) {
    let policy = ActuationPolicy::from_config(&ControlConfig::default());
    let mut group = c.benchmark_group("policy_decide");
    group.significance_level(0.01);

    for &len in &[1usize, 100, 10_000] {
        let samples = trace(len);
        group.bench_with_input(BenchmarkId::new("with_aux", len), &samples, |b, s| {
            b.iter(|| replay(black_box(&policy), black_box(s), true));
        });
        group.bench_with_input(BenchmarkId::new("dosing_only", len), &samples, |b, s| {
            b.iter(|| replay(black_box(&policy), black_box(s), false));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_policy);
criterion_main!(benches);
