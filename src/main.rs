use anyhow::Context;
use openscope::render::RasterSurface;
use openscope::{
    AnalyserInput, AnalyserNode, DrawBatch, EventLoop, Pacing, Sampler, ScopeRenderer,
    ScopeSettings, SignalSource,
};
use std::cell::RefCell;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

const TONE_HZ: f32 = 220.0;
const TONE_AMPLITUDE: f32 = 0.6;
const TONE_BLOCK: usize = 128;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let mut args = std::env::args_os().skip(1).map(PathBuf::from);
    let settings = args
        .next()
        .map(|path| ScopeSettings::load_or_default(&path))
        .unwrap_or_default();
    let output = args.next().unwrap_or_else(|| PathBuf::from("openscope.ppm"));
    info!("[scope] settings: {settings:?}");

    let node = AnalyserNode::new(settings.buffer_len, settings.sample_rate);
    let sample_rate = node.sample_rate();
    let running = Arc::new(AtomicBool::new(true));
    let tone = spawn_test_tone(node.input(), sample_rate, Arc::clone(&running))?;

    let sampler = Rc::new(RefCell::new(Sampler::new(node)));
    let renderer = Rc::new(RefCell::new(
        ScopeRenderer::new(
            RasterSurface::new(settings.width as usize, settings.height as usize),
            Some(settings.scaling),
        )
        .with_sample_rate(sample_rate),
    ));

    let host = Rc::new(EventLoop::new(settings.refresh_rate, Pacing::RealTime));
    let batch = DrawBatch::with_fps(host.clone(), settings.fps);
    {
        let (sampler, renderer) = (Rc::clone(&sampler), Rc::clone(&renderer));
        batch.add(move || {
            let mut sampler = sampler.borrow_mut();
            renderer.borrow_mut().draw(&sampler.sample());
        });
    }

    let run_length = Duration::try_from_secs_f32(settings.run_seconds)
        .with_context(|| format!("invalid run length {}s", settings.run_seconds))?;
    batch.start();
    host.run_for(run_length);
    batch.stop();
    info!(
        "[scope] drew {} frames in {:.1}s ({:?})",
        batch.cycles(),
        settings.run_seconds,
        batch.cadence()
    );

    running.store(false, Ordering::Relaxed);
    if tone.join().is_err() {
        anyhow::bail!("test tone thread panicked");
    }

    let file = File::create(&output).with_context(|| format!("creating {}", output.display()))?;
    renderer
        .borrow()
        .surface()
        .write_ppm(BufWriter::new(file))
        .with_context(|| format!("writing {}", output.display()))?;
    info!("[scope] last frame written to {}", output.display());
    Ok(())
}

/// Stand-in for the external synth: a sine fed in real-time-sized blocks.
fn spawn_test_tone(
    input: AnalyserInput,
    sample_rate: f32,
    running: Arc<AtomicBool>,
) -> anyhow::Result<thread::JoinHandle<()>> {
    let block_period = Duration::from_secs_f32(TONE_BLOCK as f32 / sample_rate);
    thread::Builder::new()
        .name("openscope-test-tone".into())
        .spawn(move || {
            let step = std::f32::consts::TAU * TONE_HZ / sample_rate;
            let mut phase = 0.0f32;
            let mut block = [0.0f32; TONE_BLOCK];
            while running.load(Ordering::Relaxed) {
                for sample in block.iter_mut() {
                    *sample = TONE_AMPLITUDE * phase.sin();
                    phase = (phase + step) % std::f32::consts::TAU;
                }
                input.write(&block);
                thread::sleep(block_period);
            }
        })
        .context("spawning test tone thread")
}
