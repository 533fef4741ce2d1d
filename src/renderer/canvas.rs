//! Canvas 2D renderer

use std::collections::HashMap;

use glam::Vec2;
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use super::{WordLabel, sprite_color};
use crate::consts::TILE_SIZE;
use crate::sim::{GameEvent, GameState, SessionState};

const BACKGROUND: &str = "#05060f";
const STAR_COUNT: usize = 80;
const EXPLOSION_SECS: f64 = 0.35;
const SHOT_SECS: f64 = 0.08;

#[derive(Debug, Clone, Copy)]
struct Flash {
    pos: Vec2,
    started: f64,
    color: &'static str,
}

#[derive(Debug, Clone, Copy)]
struct Shot {
    target: Vec2,
    started: f64,
}

pub struct CanvasRenderer {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    /// Logical size in CSS pixels
    pub size: (f32, f32),
    /// Enemy centers from the previous frame, for effects of removed enemies
    last_positions: HashMap<u32, (Vec2, u8)>,
    flashes: Vec<Flash>,
    shots: Vec<Shot>,
    stars: Vec<(f32, f32, f32)>,
}

impl CanvasRenderer {
    pub fn new(canvas: HtmlCanvasElement) -> Result<Self, String> {
        let ctx = canvas
            .get_context("2d")
            .map_err(|e| format!("getContext failed: {:?}", e))?
            .ok_or("2d context unavailable")?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(|_| "not a CanvasRenderingContext2d".to_string())?;

        // Fixed star layout, scaled to whatever the playfield is
        let stars = (0..STAR_COUNT)
            .map(|i| {
                let f = i as f32;
                let x = (f * 0.618_034).fract();
                let y = (f * 0.754_878 + 0.31).fract();
                let r = 0.5 + (f * 0.371).fract() * 1.2;
                (x, y, r)
            })
            .collect();

        Ok(Self {
            canvas,
            ctx,
            size: (0.0, 0.0),
            last_positions: HashMap::new(),
            flashes: Vec::new(),
            shots: Vec::new(),
            stars,
        })
    }

    /// Match the backing store to the element size and device pixel ratio
    pub fn resize(&mut self, width: f32, height: f32, dpr: f64) {
        self.size = (width, height);
        self.canvas.set_width((width as f64 * dpr).round() as u32);
        self.canvas.set_height((height as f64 * dpr).round() as u32);
        let _ = self.ctx.set_transform(dpr, 0.0, 0.0, dpr, 0.0, 0.0);
    }

    fn ship_pos(&self, game: &GameState) -> Vec2 {
        Vec2::new(game.playfield.width / 2.0, game.playfield.height - 24.0)
    }

    /// Turn this frame's events into short-lived effects
    pub fn observe(&mut self, game: &GameState, events: &[GameEvent], time: f64, reduced_motion: bool) {
        for event in events {
            match *event {
                GameEvent::Shot { enemy_id } => {
                    if let Some(enemy) = game.enemies.iter().find(|e| e.id == enemy_id) {
                        let target = enemy.pos + Vec2::splat(TILE_SIZE / 2.0);
                        self.shots.push(Shot { target, started: time });
                    }
                }
                GameEvent::Killed { enemy_id, .. } if !reduced_motion => {
                    if let Some(&(pos, sprite)) = self.last_positions.get(&enemy_id) {
                        self.shots.push(Shot { target: pos, started: time });
                        self.flashes.push(Flash {
                            pos,
                            started: time,
                            color: sprite_color(sprite),
                        });
                    }
                }
                GameEvent::RunStarted => {
                    self.flashes.clear();
                    self.shots.clear();
                }
                _ => {}
            }
        }

        self.last_positions = game
            .enemies
            .iter()
            .map(|e| (e.id, (e.pos + Vec2::splat(TILE_SIZE / 2.0), e.sprite)))
            .collect();
    }

    pub fn render(&mut self, game: &GameState, time: f64) {
        let (w, h) = (game.playfield.width as f64, game.playfield.height as f64);
        let ctx = &self.ctx;

        ctx.set_fill_style_str(BACKGROUND);
        ctx.fill_rect(0.0, 0.0, w, h);

        ctx.set_fill_style_str("#ffffff");
        for &(x, y, r) in &self.stars {
            let drift = if game.status == SessionState::Running {
                (time * 0.01 * r as f64) % h
            } else {
                0.0
            };
            let sy = (y as f64 * h + drift) % h;
            ctx.set_global_alpha(0.3 + r as f64 * 0.3);
            ctx.fill_rect(x as f64 * w, sy, r as f64, r as f64);
        }
        ctx.set_global_alpha(1.0);

        // Danger line
        ctx.set_stroke_style_str("rgba(255, 77, 109, 0.25)");
        ctx.set_line_width(1.0);
        ctx.begin_path();
        ctx.move_to(0.0, game.playfield.failure_y() as f64);
        ctx.line_to(w, game.playfield.failure_y() as f64);
        ctx.stroke();

        self.draw_shots(game, time);
        for enemy in &game.enemies {
            self.draw_enemy(enemy.pos, enemy.sprite);
        }
        // Labels above every tile
        for enemy in &game.enemies {
            self.draw_label(enemy.pos, &WordLabel::of(enemy, game.locked_target));
        }
        self.draw_flashes(time);
        self.draw_ship(self.ship_pos(game));
    }

    fn draw_enemy(&self, pos: Vec2, sprite: u8) {
        let ctx = &self.ctx;
        let (x, y, s) = (pos.x as f64, pos.y as f64, TILE_SIZE as f64);
        ctx.set_fill_style_str(sprite_color(sprite));
        ctx.set_global_alpha(0.85);
        ctx.fill_rect(x + 8.0, y + 8.0, s - 16.0, s - 16.0);
        ctx.set_global_alpha(1.0);
        ctx.set_stroke_style_str("#ffffff");
        ctx.set_line_width(1.5);
        ctx.stroke_rect(x + 8.0, y + 8.0, s - 16.0, s - 16.0);
    }

    fn draw_label(&self, pos: Vec2, label: &WordLabel<'_>) {
        let ctx = &self.ctx;
        ctx.set_font("bold 16px monospace");
        ctx.set_text_baseline("bottom");
        ctx.set_text_align("left");

        let typed_w = ctx.measure_text(label.typed).map(|m| m.width()).unwrap_or(0.0);
        let rest_w = ctx.measure_text(label.rest).map(|m| m.width()).unwrap_or(0.0);
        let total = typed_w + rest_w;
        let cx = pos.x as f64 + TILE_SIZE as f64 / 2.0;
        let x = cx - total / 2.0;
        let y = pos.y as f64 + 4.0;

        ctx.set_fill_style_str("rgba(0, 0, 0, 0.6)");
        ctx.fill_rect(x - 4.0, y - 20.0, total + 8.0, 20.0);

        ctx.set_fill_style_str("#6b7280");
        let _ = ctx.fill_text(label.typed, x, y - 2.0);
        ctx.set_fill_style_str(if label.locked { "#ffd24d" } else { "#ffffff" });
        let _ = ctx.fill_text(label.rest, x + typed_w, y - 2.0);
    }

    fn draw_ship(&self, pos: Vec2) {
        let ctx = &self.ctx;
        let (x, y) = (pos.x as f64, pos.y as f64);
        ctx.set_fill_style_str("#4dd2ff");
        ctx.begin_path();
        ctx.move_to(x, y - 16.0);
        ctx.line_to(x - 14.0, y + 12.0);
        ctx.line_to(x + 14.0, y + 12.0);
        ctx.close_path();
        ctx.fill();
    }

    fn draw_shots(&mut self, game: &GameState, time: f64) {
        self.shots.retain(|s| time - s.started < SHOT_SECS * 1000.0);
        let origin = self.ship_pos(game);
        let ctx = &self.ctx;
        ctx.set_stroke_style_str("#ffd24d");
        ctx.set_line_width(2.0);
        for shot in &self.shots {
            ctx.begin_path();
            ctx.move_to(origin.x as f64, origin.y as f64 - 16.0);
            ctx.line_to(shot.target.x as f64, shot.target.y as f64);
            ctx.stroke();
        }
    }

    fn draw_flashes(&mut self, time: f64) {
        self.flashes
            .retain(|f| time - f.started < EXPLOSION_SECS * 1000.0);
        let ctx = &self.ctx;
        for flash in &self.flashes {
            let t = (time - flash.started) / (EXPLOSION_SECS * 1000.0);
            ctx.set_global_alpha(1.0 - t);
            ctx.set_fill_style_str(flash.color);
            ctx.begin_path();
            let _ = ctx.arc(
                flash.pos.x as f64,
                flash.pos.y as f64,
                8.0 + t * 40.0,
                0.0,
                std::f64::consts::TAU,
            );
            ctx.fill();
        }
        ctx.set_global_alpha(1.0);
    }
}
