use fractour_core::{
    is_interior, AnyFractal, Bounds, Complex, Fractal, FractalKind, Julia, KeyframeStore,
    Mandelbrot, Newton, Selection, TourPlan, UndoStack, Viewport,
};

/// Evaluate every pixel of a viewport into a flat row-major Vec.
fn render_grid<F: Fractal>(fractal: &F, viewport: &Viewport, max_iter: u32) -> Vec<f64> {
    let (w, h) = viewport.pixel_size();
    let mut values = Vec::with_capacity((w * h) as usize);
    for py in 0..h {
        for px in 0..w {
            let c = viewport.pixel_to_complex(px as f32, py as f32);
            values.push(fractal.evaluate(c, max_iter));
        }
    }
    values
}

fn split(values: &[f64]) -> (usize, usize) {
    let interior = values.iter().filter(|v| is_interior(**v)).count();
    (values.len() - interior, interior)
}

#[test]
fn headless_mandelbrot_render() {
    let viewport = Viewport::default_mandelbrot(100.0, 100.0);
    let values = render_grid(&Mandelbrot::default(), &viewport, 256);

    assert_eq!(values.len(), 100 * 100);
    let (escaped, interior) = split(&values);
    assert!(escaped > 0, "should have some escaped points");
    assert!(interior > 0, "should have some interior points");
    assert!(values.iter().all(|v| (0.0..=1.0).contains(v)));
}

#[test]
fn headless_render_is_deterministic() {
    let viewport = Viewport::default_mandelbrot(80.0, 60.0);
    let run1 = render_grid(&Mandelbrot::default(), &viewport, 200);
    let run2 = render_grid(&Mandelbrot::default(), &viewport, 200);
    assert_eq!(run1, run2, "two identical renders must produce identical results");
}

#[test]
fn headless_julia_and_newton_renders() {
    let viewport = Viewport::default_centered(100.0, 100.0);

    // c inside the main cardioid gives a filled Julia set with a solid interior.
    let julia = Julia::with_c(Complex::new(-0.5, 0.1));
    let (escaped, interior) = split(&render_grid(&julia, &viewport, 300));
    assert!(escaped > 0 && interior > 0);

    // Almost every start point converges to a root; only a thin set does not.
    let newton = render_grid(&Newton::default(), &viewport, 64);
    let (converged, _) = split(&newton);
    assert!(converged > 8_000, "{converged}");
}

#[test]
fn any_fractal_matches_concrete_evaluator() {
    let viewport = Viewport::default_mandelbrot(40.0, 30.0);
    let c = Complex::new(-0.8, 0.156);
    let via_enum = render_grid(&AnyFractal::from_kind(FractalKind::Julia, c), &viewport, 100);
    let direct = render_grid(&Julia::with_c(c), &viewport, 100);
    assert_eq!(via_enum, direct);
}

#[test]
fn zoom_pan_undo_walkthrough() {
    let mut vp = Viewport::new(Bounds::DEFAULT, 900.0, 600.0).unwrap();
    let mut undo = UndoStack::default();

    let pick = vp.pixel_to_complex(0.0, 300.0);
    assert!((pick.re + 2.0).abs() < 1e-12 && pick.im.abs() < 1e-12);

    let zoom = vp
        .selection_bounds(Selection::new(200.0, 150.0, 400.0, 300.0))
        .unwrap();
    undo.save(vp);
    vp.set_bounds(zoom);
    assert!((vp.aspect_ratio() - 1.5).abs() < 1e-9);
    assert!((vp.x_min + 4.0 / 3.0).abs() < 1e-12);

    undo.save(vp);
    vp.pan_pixels(-40.0, 0.0);
    assert!(vp.x_min > zoom.x_min);

    vp = undo.undo().unwrap();
    assert_eq!(vp.bounds(), zoom);
    vp = undo.undo().unwrap();
    assert_eq!(vp.bounds(), Bounds::DEFAULT);
    assert!(!undo.can_undo());
}

#[test]
fn keyframes_feed_tour_plan() {
    let mut store = KeyframeStore::new();
    store.add(Some("Overview"), Bounds::DEFAULT);
    store.add(None, Bounds::new(-0.75, -0.7, 0.1, 0.1333));
    store.add(None, Bounds::new(-0.74, -0.73, 0.12, 0.127));

    let plan = TourPlan::build(store.as_slice(), 5).unwrap();
    assert_eq!(plan.len(), 10);
    assert_eq!(plan.frames()[0].bounds, Bounds::DEFAULT);
    assert_eq!(plan.final_bounds(), store.last().map(|k| k.bounds));
    assert!(plan.frames().iter().all(|f| f.bounds.is_valid()));
}
