//! Demo host: bouncing point lights over procedurally generated
//! sprites, rendered through the 2-bit indexed pipeline and blitted to
//! a macroquad window.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use ::rand::{thread_rng, Rng};
use macroquad::prelude::*;
use tracing_subscriber::EnvFilter;

use quadtone::{
    palette, shader, AtlasManifest, Display, DrawSpriteOpts, IndexedImage, LightSet, SpriteDef,
    Tracked, TriangleInfo,
};

const SCREEN_W: usize = 533;
const SCREEN_H: usize = 300;

/// A bouncing point light the light set tracks.
struct Glow {
    state: Mutex<GlowState>,
    alive: AtomicBool,
    size: f64,
}

struct GlowState {
    x: f64,
    y: f64,
    vx: f64,
    vy: f64,
}

impl Glow {
    fn step(&self, dt: f64) {
        let mut s = self.state.lock().unwrap();
        s.x += s.vx * dt;
        s.y += s.vy * dt;
        if s.x < 0.0 || s.x > SCREEN_W as f64 {
            s.vx = -s.vx;
        }
        if s.y < 0.0 || s.y > SCREEN_H as f64 {
            s.vy = -s.vy;
        }
    }

    fn position(&self) -> (f64, f64) {
        let s = self.state.lock().unwrap();
        (s.x, s.y)
    }
}

impl Tracked for Glow {
    fn pos(&self) -> (f64, f64) {
        self.position()
    }

    fn alive(&self) -> bool {
        self.alive.load(Ordering::Relaxed)
    }

    fn size_mod(&self) -> f64 {
        self.size
    }
}

/// Build a two-sprite atlas in memory: a soft disc and a ring.
fn demo_atlas() -> (AtlasManifest, IndexedImage) {
    const CELL: usize = 32;
    let mut image = IndexedImage::new(CELL * 2, CELL, 255);
    for y in 0..CELL {
        for x in 0..CELL {
            let dx = x as f64 - 15.5;
            let dy = y as f64 - 15.5;
            let d = (dx * dx + dy * dy).sqrt();
            if d < 15.0 {
                let v = 255.0 * (1.0 - d / 16.0);
                image.pixels[x + y * image.width] = v.max(1.0) as u8;
            }
            if (9.0..14.0).contains(&d) {
                image.pixels[CELL + x + y * image.width] = 230;
            }
        }
    }
    let manifest = AtlasManifest {
        name: Some("spr".to_string()),
        file: String::new(),
        sprites: vec![SpriteDef {
            width: CELL as i32,
            height: CELL as i32,
            xoffs: 0,
            yoffs: 0,
            xorig: 16,
            yorig: 16,
            names: vec!["one".to_string(), "two".to_string()],
        }],
    };
    (manifest, image)
}

fn window_conf() -> Conf {
    Conf {
        window_title: format!("quadtone v{}", quadtone::VERSION),
        window_width: SCREEN_W as i32 * 2,
        window_height: SCREEN_H as i32 * 2,
        window_resizable: true,
        ..Default::default()
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();

    let palette_name = palette::random_palette_2bit_name();
    tracing::info!(palette = palette_name, "starting demo");

    let mut display = Display::new();
    display.palette = palette::palettes_2bit()[palette_name].clone();
    display.init_buffers(SCREEN_W, SCREEN_H);
    let (manifest, image) = demo_atlas();
    display.add_atlas(&manifest, image);
    let atlas = Arc::clone(&display.atlases["spr"]);

    let mut lights = LightSet {
        min_scale: 0.2,
        max_scale: 1.0,
        min_offset: 0.0,
        max_offset: 1.0,
        ..Default::default()
    };

    let mut rng = thread_rng();
    let mut glows = Vec::new();
    for _ in 0..6 {
        let mut vx = rng.gen_range(8.0..58.0);
        let mut vy = rng.gen_range(8.0..58.0);
        if rng.gen_bool(0.5) {
            vx = -vx;
        }
        if rng.gen_bool(0.5) {
            vy = -vy;
        }
        let glow = Arc::new(Glow {
            state: Mutex::new(GlowState {
                x: 200.0,
                y: 150.0,
                vx,
                vy,
            }),
            alive: AtomicBool::new(true),
            size: rng.gen_range(1.0..3.0),
        });
        lights.track_circle(&glow, rng.gen_range(0.7..1.2), rng.gen_range(50.0..80.0));
        glows.push(glow);
    }

    let mut frame = Image::gen_image_color(SCREEN_W as u16, SCREEN_H as u16, BLANK);
    let texture = Texture2D::from_image(&frame);
    texture.set_filter(FilterMode::Nearest);

    loop {
        let dt = get_frame_time() as f64;
        for glow in &glows {
            glow.step(dt);
        }

        // Reclaim dead sources, then hand the frame a read-only
        // snapshot of the light model.
        lights.prune();
        display.lights = Arc::new(lights.clone());

        display.screen.fill(0);
        display.draw_sprite("spr.one", 130.0, 50.0);
        display.draw_sprite("spr.two", 200.0, 220.0);
        display.draw_sprite_advanced(DrawSpriteOpts {
            name: "spr.one".to_string(),
            dx: 420.0,
            dy: 60.0,
            dw: 96.0,
            dh: 96.0,
            ..Default::default()
        });

        // A lit triangle sampling the disc sprite.
        let tri_shader = shader::tri_shader_indexed(
            Arc::clone(&atlas),
            [(0, 0), (31, 0), (0, 31)],
            Arc::clone(&display.lights),
            Arc::clone(&display.indexizer),
        );
        display.rasterizer.draw_triangle(
            &mut display.screen,
            TriangleInfo {
                shader: tri_shader,
                chunk_bits: 0,
                x0: 40.0,
                y0: 180.0,
                x1: 160.0,
                y1: 200.0,
                x2: 60.0,
                y2: 290.0,
            },
        );

        // Light position markers.
        let w = display.screen.width;
        for glow in &glows {
            let (x, y) = glow.position();
            let x = (x as i32).clamp(1, SCREEN_W as i32 - 2);
            let y = (y as i32).clamp(1, SCREEN_H as i32 - 2);
            for (mx, my) in [(0, 0), (-1, 0), (1, 0), (0, -1), (0, 1)] {
                let idx = (x + mx) as usize + (y + my) as usize * w;
                display.screen.pixels[idx] = 4;
            }
        }

        frame.bytes.copy_from_slice(display.to_rgba());
        texture.update(&frame);

        clear_background(BLACK);
        draw_texture_ex(
            &texture,
            0.0,
            0.0,
            WHITE,
            DrawTextureParams {
                dest_size: Some(vec2(screen_width(), screen_height())),
                ..Default::default()
            },
        );
        draw_text(
            &format!("FPS: {}  palette: {}", get_fps(), palette_name),
            10.0,
            20.0,
            20.0,
            WHITE,
        );

        next_frame().await;
    }
}
