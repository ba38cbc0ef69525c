use criterion::{black_box, criterion_group, criterion_main, Criterion};
use filmbox_core::render::{render_frame, render_shifted, FrameSymbols};
use filmbox_core::{AnalogParams, FrameDescriptor, FrameTracker, TrackingMode};

fn bench_tracking(c: &mut Criterion) {
    let frame = FrameDescriptor::default_layout(4, 128, 64, 2);
    let symbols = FrameSymbols::patterned(&frame, 1);
    let aligned = render_frame(&frame, &symbols).unwrap();
    let shifted =
        render_shifted(&frame, &symbols, frame.width + 8, frame.height + 8, 3, 2).unwrap();
    let analog = TrackingMode::Analog(AnalogParams::default());

    let mut group = c.benchmark_group("track_frame");

    group.bench_function("simulated", |b| {
        let mut tracker = FrameTracker::new(&frame).unwrap();
        b.iter(|| {
            tracker
                .track_frame(black_box(&aligned.view()), &TrackingMode::Simulated)
                .unwrap()
        });
    });

    group.bench_function("analog", |b| {
        let mut tracker = FrameTracker::new(&frame).unwrap();
        b.iter(|| {
            tracker
                .track_frame(black_box(&shifted.view()), &analog)
                .unwrap()
        });
    });

    group.finish();
}

criterion_group!(benches, bench_tracking);
criterion_main!(benches);
