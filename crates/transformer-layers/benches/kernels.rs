// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Benchmarks for the masked-softmax kernel and the feed-forward pipeline.

use criterion::{criterion_group, criterion_main, Criterion};
use tensor_core::{DType, Device, Shape, Tensor};
use transformer_layers::kernels::masked_softmax;
use transformer_layers::{ActivationKind, FeedForward, NoopProfiler};

fn filled(dims: Vec<usize>, value: f32) -> Tensor {
    let mut t = Tensor::zeros(Shape::new(dims), DType::F32, Device::cpu()).unwrap();
    t.fill_f32(value);
    t
}

fn bench_masked_softmax(c: &mut Criterion) {
    let (batch, heads, seq) = (1, 8, 128);
    let template = filled(vec![batch, heads, seq, seq], 0.5);
    let mask = filled(vec![batch, seq, seq], 0.0);
    let scaler = 1.0 / (64.0f32).sqrt();

    c.bench_function("masked_softmax_8h_128", |b| {
        b.iter(|| {
            let mut scores = template.clone();
            masked_softmax(&mut scores, &mask.view(), scaler).unwrap();
            scores
        });
    });
}

fn bench_feed_forward(c: &mut Criterion) {
    let (model_dim, d_ff) = (256, 1024);
    let layer = FeedForward::new(
        filled(vec![model_dim, d_ff], 0.01),
        filled(vec![d_ff], 0.1),
        filled(vec![d_ff, model_dim], 0.01),
        filled(vec![model_dim], 0.1),
        filled(vec![model_dim], 1.0),
        filled(vec![model_dim], 0.0),
        ActivationKind::Relu,
    )
    .unwrap();
    let input = filled(vec![1, 32, model_dim], 0.5);

    c.bench_function("feed_forward_1x32x256", |b| {
        b.iter(|| {
            let mut output = Tensor::empty(DType::F32, Device::cpu());
            layer.forward(&input, &mut output, false, &NoopProfiler).unwrap();
            output
        });
    });
}

criterion_group!(benches, bench_masked_softmax, bench_feed_forward);
criterion_main!(benches);
