use criterion::{Criterion, black_box, criterion_group, criterion_main};
use rand::SeedableRng;
use rand::rngs::StdRng;

use twolayer_nn::{Batch, Dimensions, Network, forward_backward_into, forward_backward_prop};

fn setup(dims: Dimensions, m: usize) -> (Batch, Network) {
    let mut rng = StdRng::seed_from_u64(0);
    let batch = Batch::random(m, dims.input_dim, dims.output_dim, &mut rng).unwrap();
    let net = Network::new_with_rng(dims, &mut rng).unwrap();
    (batch, net)
}

fn forward_backward_bench(c: &mut Criterion) {
    let dims = Dimensions::from([784, 128, 10]);
    let (batch, net) = setup(dims, 64);
    let layout = dims.layout();
    let mut scratch = net.scratch(batch.len());
    let mut grad = vec![0.0; layout.len()];

    c.bench_function("forward_backward_into_784_128_10_m64", |b| {
        b.iter(|| {
            let cost = forward_backward_into(
                black_box(&batch),
                black_box(net.params()),
                &layout,
                &mut scratch,
                &mut grad,
            );
            black_box(cost);
        })
    });
}

fn reference_configuration_bench(c: &mut Criterion) {
    let dims = Dimensions::from([10, 5, 10]);
    let (batch, net) = setup(dims, 20);

    c.bench_function("forward_backward_prop_10_5_10_m20", |b| {
        b.iter(|| {
            let out = forward_backward_prop(black_box(&batch), black_box(net.params()), dims);
            black_box(out);
        })
    });
}

criterion_group!(benches, forward_backward_bench, reference_configuration_bench);
criterion_main!(benches);
