#![cfg(target_arch = "wasm32")]

use av1_player_wasm::particles::{ParticleField, FLOOR, PARTICLE_COUNT, RESET_HEIGHT};
use av1_player_wasm::scene::{CameraRig, Viewport};
use glam::Vec3;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

fn approx_eq(a: f32, b: f32, eps: f32) -> bool {
    (a - b).abs() < eps
}

#[wasm_bindgen_test]
fn resize_keeps_vertical_framing() {
    // Two different aspect ratios
    let wide = Viewport::new(1920.0, 1080.0, 1.0);
    let tall = Viewport::new(1080.0, 1920.0, 2.0);

    let mut cam = CameraRig::new(wide.aspect());
    let p = Vec3::new(0.0, 150.0, 30.0);
    let y_wide = cam.projection().project_point3(cam.view().transform_point3(p)).y;

    cam.set_aspect(tall.aspect());
    let y_tall = cam.projection().project_point3(cam.view().transform_point3(p)).y;

    // Vertical FOV is fixed, so NDC y doesn't depend on aspect.
    assert!(approx_eq(y_wide, y_tall, 1e-5), "{y_wide} vs {y_tall}");
    assert_eq!(tall.physical_size(), (2160, 3840));
}

#[wasm_bindgen_test]
fn full_field_stays_in_band() {
    let mut field = ParticleField::new(PARTICLE_COUNT, &mut SmallRng::seed_from_u64(42));
    // Let every point that spawned above the band fall into it.
    for _ in 0..400 {
        field.step();
    }
    for _ in 0..600 {
        field.step();
        for i in 0..field.len() {
            let y = field.height(i);
            assert!(y >= FLOOR && y <= RESET_HEIGHT, "point {i} at {y}");
            assert!(field.velocities()[i] >= 0.0);
        }
    }
    assert_eq!(field.positions().len(), PARTICLE_COUNT * 3);
}
