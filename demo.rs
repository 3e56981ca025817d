use anyhow::{Context, Result};
use clap::Parser;
use ring_buffer::CircularBuffer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Walks a circular buffer through fill, resize, overwrite and drain.
#[derive(Parser)]
#[command(name = "ring_buffer_demo")]
#[command(version)]
struct Cli {
    /// Initial capacity
    #[arg(short, long, default_value_t = 3)]
    capacity: usize,

    /// Capacity to resize to after the first fill
    #[arg(short, long, default_value_t = 5)]
    resize: usize,

    /// Tracing filter, overrides RUST_LOG
    #[arg(long, value_name = "FILTER")]
    log: Option<String>,

    /// Values to write
    #[arg(default_values_t = [1, 2, 3, 4, 5, 6])]
    values: Vec<i32>,
}

fn init_tracing(filter: Option<&str>) {
    let filter = match filter {
        Some(filter) => EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("warn")),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .compact()
        .with_writer(std::io::stderr);

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}

fn show(buffer: &CircularBuffer<i32>) -> Result<()> {
    let mut line = String::from("Buffer:");
    let mut append = |v: &i32| line.push_str(&format!(" {v}"));
    buffer.print(Some(&mut append))?;
    println!("{line}");
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log.as_deref());

    let mut buffer = CircularBuffer::new(cli.capacity)
        .with_context(|| format!("creating buffer of capacity {}", cli.capacity))?;

    let split = cli.capacity.min(cli.values.len());
    let (first, rest) = cli.values.split_at(split);

    buffer.extend(first.iter().copied());
    show(&buffer)?;

    println!("Resizing buffer to {}", cli.resize);
    buffer
        .resize(cli.resize)
        .with_context(|| format!("resizing buffer to {}", cli.resize))?;
    show(&buffer)?;

    for &v in rest {
        if let Some(evicted) = buffer.write(v) {
            println!("Overwrote: {evicted}");
        }
    }
    show(&buffer)?;

    for _ in 0..3 {
        match buffer.read() {
            Ok(v) => println!("Read: {v}"),
            Err(err) => {
                println!("Read failed: {err}");
                break;
            }
        }
    }
    show(&buffer)?;

    Ok(())
}
