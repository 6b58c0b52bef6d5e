// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use criterion::{criterion_group, criterion_main, Criterion};
use pacedloop::core::pacer::{FramePacer, PacerConfig, PresentFeedback};
use pacedloop::core::render::{DrawList, Simulation};
use pacedloop::core::surface::Extent;
use pacedloop::demo::BouncingQuads;
use std::hint::black_box;
use std::time::Duration;

fn bench_pacer(c: &mut Criterion) {
    let mut group = c.benchmark_group("Frame Pacer");

    group.bench_function("begin/end frame with present feedback", |b| {
        let mut pacer = FramePacer::new(PacerConfig::default());
        let refresh = pacer.refresh_period();
        let mut now = Duration::ZERO;
        b.iter(|| {
            let plan = pacer.begin_frame(now);
            let submitted = now + Duration::from_millis(9);
            let timing = pacer.end_frame(
                &plan,
                PresentFeedback {
                    submitted_at: submitted,
                    gpu_time: None,
                    actual_present: Some(plan.intended_present.max(submitted)),
                },
            );
            now += refresh * timing.swap_interval;
            black_box(timing);
        });
    });

    group.bench_function("degraded (no feedback)", |b| {
        let mut pacer = FramePacer::new(PacerConfig::default());
        let refresh = pacer.refresh_period();
        let mut now = Duration::ZERO;
        b.iter(|| {
            let plan = pacer.begin_frame(now);
            let timing = pacer.end_frame(
                &plan,
                PresentFeedback {
                    submitted_at: now + Duration::from_millis(4),
                    gpu_time: None,
                    actual_present: None,
                },
            );
            now += refresh;
            black_box(timing);
        });
    });

    group.bench_function("should_render", |b| {
        let pacer = FramePacer::new(PacerConfig::default());
        b.iter(|| black_box(pacer.should_render(black_box(Duration::from_millis(17)))));
    });

    group.finish();
}

fn bench_draw(c: &mut Criterion) {
    let mut sim = BouncingQuads::new(64);
    let mut list = DrawList::new();
    let extent = Extent::new(1920, 1080);

    c.bench_function("BouncingQuads draw (64 quads)", |b| {
        b.iter(|| {
            list.reset();
            sim.draw(extent, &mut list);
            black_box(list.len());
        });
    });
}

criterion_group!(benches, bench_pacer, bench_draw);
criterion_main!(benches);
