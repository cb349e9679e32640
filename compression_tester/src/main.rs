use anyhow::{Context, bail};
use pca_engine::core_modules::utils::image_helper::image_helper;
use pca_engine::worker::{PcaRequest, PcaResponse, PcaWorker};
use std::env;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    // --- 1. Argument Parsing & Setup ---
    let args: Vec<String> = env::args().collect();
    if args.len() < 4 {
        println!("Usage: compression_tester <input_image_path> <output_image_path> <num_components>");
        return Ok(());
    }
    let input_path = &args[1];
    let output_path = &args[2];
    let num_components: usize = args[3]
        .parse()
        .context("num_components must be a positive integer")?;

    // --- 2. Image Decoding ---
    let img = image::open(input_path)
        .with_context(|| format!("failed to open {input_path}"))?
        .to_rgba8();
    let (width, height) = img.dimensions();
    println!(
        "Loaded {input_path}: {width}x{height}, compressing with {num_components} component(s)"
    );

    // --- 3. Worker Setup & Compression ---
    let worker = PcaWorker::new();
    let request = PcaRequest {
        image_data: img.into_raw(),
        num_components,
        width,
        height,
    };

    let response = worker
        .process(request)
        .await
        .map_err(|e| anyhow::anyhow!(e))?;

    // --- 4. Result Handling & Encoding ---
    match response {
        PcaResponse::Success {
            result,
            analysis,
            elapsed_secs,
            ..
        } => {
            image_helper::save(output_path.clone(), width, height, &result)
                .context("failed to encode output image")?;
            println!("Wrote {output_path} in {elapsed_secs:.2}s");
            println!(
                "Top eigenvalues (red): {:?}",
                &analysis.red.eig_vals[..analysis.red.eig_vals.len().min(3)]
            );
            println!(
                "Explained variance R/G/B: {:.3} / {:.3} / {:.3}",
                analysis.red.explained_variance,
                analysis.green.explained_variance,
                analysis.blue.explained_variance
            );
            Ok(())
        }
        PcaResponse::Error { error } => bail!("compression failed: {error}"),
    }
}
