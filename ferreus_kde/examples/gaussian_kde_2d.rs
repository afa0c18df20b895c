use ferreus_kde::progress::{ProgressMsg, closure_sink};
use ferreus_kde::{FastKde, KdeParams, generate_random_points, max_relative_error, naive_kde};
use ferreus_kde_utils::kernels::GaussianKernel;
use std::time::Instant;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Optional output file for the density estimates, one per line
    let output_path = std::env::args().nth(1);

    // Define reference points uniformly in [0, 1]^2 and estimate the density at them
    let dim = 2usize;
    let num_points = 20_000usize;
    let points = generate_random_points(num_points, dim, Some(42));

    let kernel = GaussianKernel::new(0.01);
    let params = KdeParams::builder().relative_error(0.01).build();

    // Print progress events as the run goes
    let (sink, listener) = closure_sink(16, |msg| match msg {
        ProgressMsg::TreesBuilt {
            num_query_nodes,
            elapsed_secs,
            ..
        } => println!("Built tree with {num_query_nodes} nodes in {elapsed_secs:.3}s"),
        ProgressMsg::TraversalFinished { elapsed_secs, .. } => {
            println!("Traversal finished in {elapsed_secs:.3}s")
        }
        _ => {}
    });

    let start = Instant::now();
    let results = FastKde::builder(points.clone(), kernel, params)
        .progress_callback(sink)
        .build()?
        .compute();
    let fast_secs = start.elapsed().as_secs_f64();
    listener.join().expect("progress listener panicked");

    // Compare against the exhaustive sum
    let start = Instant::now();
    let exact = naive_kde(&points, &points, &kernel);
    let naive_secs = start.elapsed().as_secs_f64();

    let counts = results.prune_counts;
    println!("Dual-tree: {fast_secs:.3}s, naive: {naive_secs:.3}s");
    println!(
        "Max relative error: {:.3e} (allowed {})",
        max_relative_error(&results.density_estimates, &exact),
        params.relative_error
    );
    println!(
        "Prunes: exclusion {}, finite difference {}, base cases {}",
        counts.exclusion, counts.finite_difference, counts.base_cases
    );
    println!(
        "Series: far-field to local {}, far-field {}, local {}",
        counts.farfield_to_local, counts.farfield, counts.local
    );

    if let Some(path) = output_path {
        results.save_density_estimates(&path)?;
        println!("Wrote density estimates to {path}");
    }

    Ok(())
}
