use domainplot_core::{domain_color, ColorParams, Complex, Expression, Rgb, Viewport};

/// Color every pixel of a `width × height` image and collect into a flat Vec.
fn render_grid(expr: &Expression, viewport: &Viewport, width: u32, height: u32) -> Vec<Rgb> {
    let params = ColorParams::default();
    let mut stack = expr.scratch();
    let mut pixels = Vec::with_capacity((width * height) as usize);
    for row in 0..height {
        for col in 0..width {
            let z = viewport.pixel_to_complex(col as f64, row as f64, width, height);
            let color = match expr.eval_with(z, &mut stack) {
                Ok(w) => domain_color(w, &params),
                Err(_) => Rgb::UNDEFINED,
            };
            pixels.push(color);
        }
    }
    pixels
}

#[test]
fn identity_top_left_pixel() {
    let expr = Expression::parse("z").unwrap();
    let viewport = Viewport::new(1.0, -1.0, 1.0, -1.0).unwrap();

    let z = viewport.pixel_to_complex(0.0, 0.0, 2, 2);
    assert_eq!(z, Complex::new(-1.0, 1.0));
    assert_eq!(expr.eval(z).unwrap(), Complex::new(-1.0, 1.0));

    let pixels = render_grid(&expr, &viewport, 2, 2);
    assert_eq!(pixels.len(), 4);
    assert_eq!(
        pixels[0],
        domain_color(Complex::new(-1.0, 1.0), &ColorParams::default())
    );
}

#[test]
fn pole_renders_as_undefined() {
    // The centre of an odd-sized image over a symmetric viewport is exactly 0.
    let expr = Expression::parse("1 z /").unwrap();
    let viewport = Viewport::new(1.0, -1.0, 1.0, -1.0).unwrap();

    let pixels = render_grid(&expr, &viewport, 4, 4);
    let centre = pixels[2 * 4 + 2];
    assert_eq!(centre, Rgb::UNDEFINED);
    assert!(pixels.iter().filter(|&&p| p == Rgb::UNDEFINED).count() == 1);
}

#[test]
fn headless_render_is_deterministic() {
    let expr = Expression::parse("z sin z 2 ^ /").unwrap();
    let viewport = Viewport::centered(3.0).unwrap();

    let run1 = render_grid(&expr, &viewport, 64, 48);
    let run2 = render_grid(&expr, &viewport, 64, 48);

    assert_eq!(run1, run2, "two identical renders must produce identical images");
}

#[test]
fn image_has_varied_hues() {
    let expr = Expression::parse("z").unwrap();
    let viewport = Viewport::centered(2.0).unwrap();

    let pixels = render_grid(&expr, &viewport, 32, 32);
    let reddish = pixels.iter().filter(|p| p.r > p.g && p.r > p.b).count();
    let bluish = pixels.iter().filter(|p| p.b > p.r && p.b > p.g).count();
    assert!(reddish > 0, "negative reals should be red");
    assert!(bluish > 0, "some of the plane should be blue");
}
