use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use vitals_core::motion::MotionDetector;
use vitals_core::vitals::VitalEstimator;
use vitals_traits::InertialSample;

// Generate a synthetic PPG trace: pulse sine plus white noise on both channels
fn synth_ppg(n: usize, bpm: f32, noise_amp: f32, seed: u32) -> Vec<(u32, u32)> {
    // tiny PRNG
    let mut state = seed.max(1);
    let mut next_f32 = || {
        let mut x = state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        state = x;
        (x as f32) / (u32::MAX as f32 + 1.0)
    };
    let mut v = Vec::with_capacity(n);
    for i in 0..n {
        let t = i as f32 / 100.0;
        let s = (std::f32::consts::TAU * bpm / 60.0 * t).sin();
        let noise = (next_f32() * 2.0 - 1.0) * noise_amp; // [-amp, +amp]
        let red = 100_000.0 + 2200.0 * s + noise;
        let ir = 100_000.0 + 4000.0 * s + noise;
        v.push((red as u32, ir as u32));
    }
    v
}

fn configure(g: &mut criterion::BenchmarkGroup<'_, criterion::measurement::WallTime>) {
    // Allow quick tweaking without CLI flags (Criterion 0.5):
    //   BENCH_SAMPLE_SIZE=10 BENCH_MEAS_MS=50 cargo bench -p vitals_core --bench ppg_pipeline
    if let Ok(ss) = std::env::var("BENCH_SAMPLE_SIZE") {
        if let Ok(n) = ss.parse::<usize>() {
            g.sample_size(n.max(10));
        }
    } else {
        g.sample_size(50);
    }
    if let Ok(ms) = std::env::var("BENCH_MEAS_MS")
        && let Ok(ms_u64) = ms.parse::<u64>()
    {
        g.measurement_time(std::time::Duration::from_millis(ms_u64));
    }
}

pub fn bench_vital_estimator(c: &mut Criterion) {
    let mut g = c.benchmark_group("vital_estimator");
    configure(&mut g);

    for &noise in &[0.0f32, 150.0, 600.0] {
        let trace = synth_ppg(3_000, 72.0, noise, 0xC0FFEE);
        g.bench_function(format!("update_sample_noise_{noise}"), |b| {
            b.iter_batched(
                VitalEstimator::default,
                |mut v| {
                    for (i, &(red, ir)) in trace.iter().enumerate() {
                        black_box(v.update_sample(black_box(red), black_box(ir), i as u64 * 10_000));
                    }
                },
                BatchSize::LargeInput,
            )
        });
    }
    g.finish();
}

pub fn bench_motion_detector(c: &mut Criterion) {
    let mut g = c.benchmark_group("motion_detector");
    configure(&mut g);

    let samples: Vec<InertialSample> = (0..3_000u32)
        .map(|i| {
            let ax = if i % 50 == 0 { 8192 } else { 0 };
            InertialSample::accel(ax, 0, 16384, i * 10)
        })
        .collect();
    g.bench_function("step_and_fall", |b| {
        b.iter_batched(
            || MotionDetector::new(100.0).unwrap(),
            |mut d| {
                for s in &samples {
                    black_box(d.detect_step(s, s.t_ms));
                    black_box(d.detect_fall(s, s.t_ms));
                }
            },
            BatchSize::LargeInput,
        )
    });
    g.finish();
}

criterion_group!(pipeline, bench_vital_estimator, bench_motion_detector);
criterion_main!(pipeline);
