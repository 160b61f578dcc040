use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use tracing::info;

use fractour_core::{frames_per_segment, Bounds, FractalKind, TourPlan, Viewport};
use fractour_render::{export_png, Palette};

use fractour_app::{AppPreferences, Session, TourState};

#[derive(Parser, Debug)]
#[command(name = "fractour", version, about = "Explore escape-time fractals and render zoom tours")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render one image (PNG or JPEG by extension).
    Render(RenderArgs),
    /// Print the complex coordinate under a pixel.
    Pick(PickArgs),
    /// Render a keyframe tour as numbered PNG frames.
    Tour(TourArgs),
}

/// Flags shared by every subcommand; each one overrides the saved preferences.
#[derive(Args, Debug)]
struct ViewArgs {
    /// Canvas width in pixels.
    #[arg(long)]
    width: Option<f32>,
    /// Canvas height in pixels.
    #[arg(long)]
    height: Option<f32>,
    /// mandelbrot, julia or newton.
    #[arg(long)]
    fractal: Option<FractalKind>,
    /// grayscale, rainbow, ice, fire or newtonColor.
    #[arg(long)]
    palette: Option<Palette>,
    /// Real part of the Julia constant.
    #[arg(long, allow_hyphen_values = true)]
    julia_re: Option<f64>,
    /// Imaginary part of the Julia constant.
    #[arg(long, allow_hyphen_values = true)]
    julia_im: Option<f64>,
    /// Fixed iteration budget instead of the zoom-adaptive one.
    #[arg(long)]
    iterations: Option<u32>,
    /// Region to show as `x_min,x_max,y_min,y_max`.
    #[arg(long, num_args = 4, value_delimiter = ',', allow_hyphen_values = true)]
    bounds: Option<Vec<f64>>,
    /// Saved view JSON to start from (bounds, fractal, palette).
    #[arg(long)]
    view: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct RenderArgs {
    #[command(flatten)]
    view: ViewArgs,
    /// Output image path; defaults to the configured output directory.
    #[arg(long)]
    out: Option<PathBuf>,
    /// Also write the view as JSON next to the image.
    #[arg(long, default_value_t = false)]
    save_view: bool,
}

#[derive(Args, Debug)]
struct PickArgs {
    #[command(flatten)]
    view: ViewArgs,
    /// Pixel column.
    x: f32,
    /// Pixel row.
    y: f32,
}

#[derive(Args, Debug)]
struct TourArgs {
    #[command(flatten)]
    view: ViewArgs,
    /// Keyframe list JSON.
    #[arg(long)]
    keyframes: PathBuf,
    /// Directory for `frame_00000.png`, `frame_00001.png`, ...
    #[arg(long)]
    out_dir: Option<PathBuf>,
    /// Seconds of animation between consecutive keyframes.
    #[arg(long)]
    seconds: Option<f64>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut prefs = AppPreferences::load();
    match cli.cmd {
        Command::Render(args) => cmd_render(&mut prefs, args),
        Command::Pick(args) => cmd_pick(&mut prefs, args),
        Command::Tour(args) => cmd_tour(&mut prefs, args),
    }
}

/// Apply the flags to the preferences, then build a session on them.
fn open_session(prefs: &mut AppPreferences, args: &ViewArgs) -> anyhow::Result<Session> {
    if let Some(w) = args.width {
        prefs.canvas_width = w;
    }
    if let Some(h) = args.height {
        prefs.canvas_height = h;
    }
    if let Some(kind) = args.fractal {
        prefs.fractal = kind;
    }
    if let Some(palette) = args.palette {
        prefs.palette = palette;
    }
    if let Some(re) = args.julia_re {
        prefs.julia_c_re = re;
    }
    if let Some(im) = args.julia_im {
        prefs.julia_c_im = im;
    }
    if let Some(n) = args.iterations {
        prefs.base_iterations = n;
        prefs.iterations_per_doubling = 0;
        prefs.max_iterations = n;
    }
    if prefs.canvas_width < 1.0 || prefs.canvas_height < 1.0 {
        anyhow::bail!(
            "canvas must be at least 1×1, got {}×{}",
            prefs.canvas_width,
            prefs.canvas_height
        );
    }

    let mut session = Session::new(prefs);
    if let Some(path) = &args.view {
        session
            .load_view(path)
            .with_context(|| format!("load view '{}'", path.display()))?;
        // Flags win over the file.
        if let Some(kind) = args.fractal {
            session.set_fractal(kind);
        }
        if let Some(palette) = args.palette {
            session.set_palette(palette);
        }
    }
    if let Some(b) = &args.bounds {
        let bounds = Bounds::new(b[0], b[1], b[2], b[3]);
        let viewport = Viewport::new(bounds, prefs.canvas_width, prefs.canvas_height)?;
        session.set_viewport(viewport);
    }
    Ok(session)
}

fn cmd_render(prefs: &mut AppPreferences, args: RenderArgs) -> anyhow::Result<()> {
    let session = open_session(prefs, &args.view)?;
    let out = match args.out {
        Some(path) => path,
        None => {
            let kind = session.painter().fractal.kind();
            prefs.output_directory().join(format!("{kind}.png"))
        }
    };

    session
        .export(&out)
        .with_context(|| format!("export '{}'", out.display()))?;
    if args.save_view {
        let view_path = out.with_extension("json");
        session
            .save_view(&view_path)
            .with_context(|| format!("save view '{}'", view_path.display()))?;
    }
    eprintln!("wrote {}", out.display());
    Ok(())
}

fn cmd_pick(prefs: &mut AppPreferences, args: PickArgs) -> anyhow::Result<()> {
    let mut session = open_session(prefs, &args.view)?;
    let (_, c) = session.pick(args.x, args.y);
    println!("{c}");
    Ok(())
}

fn cmd_tour(prefs: &mut AppPreferences, args: TourArgs) -> anyhow::Result<()> {
    if let Some(seconds) = args.seconds {
        prefs.seconds_per_segment = seconds;
    }
    // Frames go to disk, so playback does not need to wait.
    prefs.playback_delay_ms = 0;

    let mut session = open_session(prefs, &args.view)?;
    session
        .load_keyframes(&args.keyframes)
        .with_context(|| format!("load keyframes '{}'", args.keyframes.display()))?;
    if !session.start_tour() {
        anyhow::bail!("a tour needs at least two keyframes");
    }

    let step = Duration::from_millis(250);
    while session.tour_state() == TourState::Rendering {
        eprint!("\rrendering {:>5.1}%", session.tour().progress() * 100.0);
        session.tour().wait_while_rendering(step);
    }
    eprintln!();

    let frames = session
        .tour()
        .frames()
        .context("tour render was cancelled")?;
    session.stop_tour();

    let settings = session.tour().settings();
    let per_segment = frames_per_segment(settings.fps, settings.seconds_per_segment);
    let plan = TourPlan::build(session.keyframes(), per_segment)
        .context("a tour needs at least two keyframes")?;
    let viewport = session.viewport();
    let viewports = plan.viewports(viewport.width, viewport.height);

    let out_dir = args
        .out_dir
        .unwrap_or_else(|| prefs.output_directory().join("tour"));
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("create output dir '{}'", out_dir.display()))?;

    let painter = session.painter();
    for (index, (frame, vp)) in frames.iter().zip(&viewports).enumerate() {
        let path = frame_path(&out_dir, index);
        export_png(frame, &path, &painter.metadata(vp))
            .with_context(|| format!("write frame '{}'", path.display()))?;
    }
    info!(frames = frames.len(), dir = %out_dir.display(), "Tour written");
    eprintln!("wrote {} frames to {}", frames.len(), out_dir.display());
    Ok(())
}

fn frame_path(dir: &Path, index: usize) -> PathBuf {
    dir.join(format!("frame_{index:05}.png"))
}
