// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::env;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use parking_lot::Mutex;
use streamwood::config::{load_and_validate_config, Config};
use streamwood::engine::{
    PipeOptions, QueuingStrategy, ReadableStream, WritableStream, WritableStreamDefaultController,
};
use streamwood::errors::StreamError;
use streamwood::traits::UnderlyingSink;
use streamwood::transformers::TransformerFactory;
use tracing_subscriber::EnvFilter;

/// Sink that keeps every chunk it receives, in order.
struct CollectingSink {
    chunks: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl UnderlyingSink<String> for CollectingSink {
    async fn write(
        &self,
        chunk: String,
        _controller: &WritableStreamDefaultController<String>,
    ) -> Result<(), StreamError> {
        self.chunks.lock().push(chunk);
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        eprintln!("Usage: {} <config1.yaml> [config2.yaml ...] <input_text>", args[0]);
        eprintln!("Example: {} configs/text-pipeline.yaml \"hello stream world\"", args[0]);
        std::process::exit(1);
    }

    // The last argument is the input text
    let input_text = &args[args.len() - 1];
    let config_files = &args[1..args.len() - 1];

    println!("🌊 Streamwood Pipeline Demo");
    println!("═══════════════════════════");
    println!("Input: \"{}\"", input_text);
    println!("Config files: {:?}", config_files);

    for (i, config_file) in config_files.iter().enumerate() {
        if i > 0 {
            println!("\n{}", "─".repeat(80));
        }
        if let Err(e) = run_single_config(config_file, input_text).await {
            eprintln!("❌ Failed to run {}: {:#}", config_file, e);
        }
    }

    Ok(())
}

async fn run_single_config(config_file: &str, input_text: &str) -> anyhow::Result<()> {
    let config = load_and_validate_config(config_file)
        .with_context(|| format!("loading configuration from {}", config_file))?;

    println!("\n📋 Configuration: {}", config_file);
    println!(
        "📥 Readable: {:?}, high_water_mark={}",
        config.readable.kind,
        config.readable.high_water_mark_or_default()
    );
    println!(
        "📤 Writable: {:?}, high_water_mark={}",
        config.writable.kind,
        config.writable.high_water_mark_or_default()
    );
    println!("🔄 Transforms:");
    for transform in &config.transforms {
        println!("   • {} ({})", transform.id, transform.transformer);
    }

    let start_time = Instant::now();
    let output = run_pipeline(&config, input_text).await?;

    println!("\n📊 Results ({:?}):", start_time.elapsed());
    for chunk in &output {
        println!("   {}", chunk);
    }
    println!("🔢 Chunks collected: {}", output.len());
    Ok(())
}

/// Split `input_text` into word chunks, push them through every configured
/// transform and collect what comes out the far end.
async fn run_pipeline(config: &Config, input_text: &str) -> anyhow::Result<Vec<String>> {
    let words: Vec<String> = input_text.split_whitespace().map(str::to_string).collect();
    let readable_strategy = QueuingStrategy::from_config(
        &config.readable,
        config.readable.kind.default_high_water_mark(),
    );
    let mut stream = ReadableStream::from_iter_with_strategy(words, readable_strategy);

    // Intermediate links always propagate shutdown, or the final pipe could
    // never finish.
    for transform_config in &config.transforms {
        let transform =
            TransformerFactory::create_transform_stream(transform_config).map_err(|e| anyhow!(e))?;
        stream = stream
            .pipe_through(&transform, PipeOptions::default())
            .with_context(|| format!("connecting transform '{}'", transform_config.id))?;
    }

    let chunks = Arc::new(Mutex::new(Vec::new()));
    let writable_strategy = QueuingStrategy::from_config(
        &config.writable,
        config.writable.kind.default_high_water_mark(),
    );
    let destination = WritableStream::new(
        CollectingSink {
            chunks: Arc::clone(&chunks),
        },
        writable_strategy,
    );

    stream
        .pipe_to(&destination, PipeOptions::from(&config.pipe))
        .await
        .context("pipeline failed")?;

    let collected = chunks.lock().clone();
    Ok(collected)
}
