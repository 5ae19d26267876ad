use anyhow::Context;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use model_flattener::Model;
use model_flattener::config::CliArgs;

fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    // Init tracing
    let filter = if args.verbose {
        EnvFilter::new("model_flattener=debug")
    } else {
        EnvFilter::new("model_flattener=info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut model = Model::new();
    if let Err(e) = model.open(&args.input, &args.properties()) {
        error!(%e, "Import failed");
        return Err(anyhow::anyhow!(e))
            .with_context(|| format!("failed to open {}", args.input.display()));
    }

    let streams = model.streams();
    let bounds = model.bounds();
    println!(
        "Bounds: [{:.4}, {:.4}, {:.4}] - [{:.4}, {:.4}, {:.4}]",
        bounds.min.x, bounds.min.y, bounds.min.z, bounds.max.x, bounds.max.y, bounds.max.z
    );
    println!("Scale: {:.6}", model.normalization().scale);
    for desc in model.buffer_descriptors() {
        println!(
            "{:>10}: {} x {}",
            desc.role.as_str(),
            desc.element_count(),
            desc.components()
        );
    }
    if !streams.is_aligned() {
        println!("Note: streams are not aligned (meshes carry different attributes)");
    }

    if let Some(ref dump) = args.dump {
        model
            .dump_streams(dump)
            .with_context(|| format!("failed to write {}", dump.display()))?;
        info!(path = %dump.display(), "Streams written");
    }

    Ok(())
}
