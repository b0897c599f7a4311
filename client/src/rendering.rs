use crate::chat::ChatLine;
use crate::map::TileMap;
use crate::reconciler::{RenderEnemy, RenderPlayer, RenderState};
use crate::session::{ConnectionState, FrameStats};
use macroquad::prelude::*;

const BACKGROUND: Color = Color::new(0.17, 0.24, 0.31, 1.0);
const GRID: Color = Color::new(0.20, 0.29, 0.37, 1.0);
const WALL: Color = Color::new(0.50, 0.55, 0.55, 1.0);
const GROUND: Color = Color::new(0.15, 0.68, 0.38, 1.0);
const PLAYER: Color = Color::new(0.91, 0.30, 0.24, 1.0);
const ENEMY: Color = Color::new(0.61, 0.35, 0.71, 1.0);
const PROJECTILE: Color = Color::new(0.95, 0.77, 0.06, 1.0);
const HEALTH: Color = Color::new(0.18, 0.80, 0.44, 1.0);
const MANA: Color = Color::new(0.20, 0.60, 0.86, 1.0);

const PLAYER_RADIUS: f32 = 10.0;
const ENEMY_SIZE: f32 = 20.0;
const PROJECTILE_RADIUS: f32 = 5.0;
const GRID_SPACING: f32 = 50.0;

/// Per-frame information shown in the overlay.
#[derive(Debug, Clone)]
pub struct HudInfo {
    pub connection: ConnectionState,
    pub buffered: usize,
    pub capacity: usize,
    pub last_t: Option<f32>,
    pub stats: FrameStats,
    pub chat: Vec<ChatLine>,
    /// Contents of the chat entry box while it is open.
    pub typing: Option<String>,
}

pub struct Renderer {
    map: Option<TileMap>,
}

impl Renderer {
    pub fn new(map: Option<TileMap>) -> Self {
        Renderer { map }
    }

    pub fn render(&mut self, state: &RenderState, hud: &HudInfo) {
        clear_background(BACKGROUND);

        match &self.map {
            Some(map) => self.draw_map(map),
            None => self.draw_grid(),
        }

        for enemy in state.enemies.values() {
            self.draw_enemy(enemy);
        }

        for player in state.players.values() {
            self.draw_player(player);
        }

        for projectile in &state.projectiles {
            draw_circle(
                projectile.position.x,
                projectile.position.y,
                PROJECTILE_RADIUS,
                PROJECTILE,
            );
        }

        self.draw_hud(hud, state);
    }

    fn draw_map(&self, map: &TileMap) {
        for layer in &map.layers {
            let color = match layer.name.as_str() {
                "Collision" => WALL,
                "Ground" => GROUND,
                _ => continue,
            };

            for (x, y) in map.filled_tiles(layer) {
                draw_rectangle(x, y, map.tilewidth as f32, map.tileheight as f32, color);
            }
        }
    }

    fn draw_grid(&self) {
        let (width, height) = (screen_width(), screen_height());

        let mut x = 0.0;
        while x <= width {
            draw_line(x, 0.0, x, height, 1.0, GRID);
            x += GRID_SPACING;
        }

        let mut y = 0.0;
        while y <= height {
            draw_line(0.0, y, width, y, 1.0, GRID);
            y += GRID_SPACING;
        }
    }

    fn draw_player(&self, player: &RenderPlayer) {
        let (x, y) = (player.position.x, player.position.y);
        draw_circle(x, y, PLAYER_RADIUS, PLAYER);

        let label = if player.name.is_empty() {
            format!("ID:{}", player.id)
        } else {
            player.name.clone()
        };
        let size = measure_text(&label, None, 14, 1.0);
        draw_text(&label, x - size.width / 2.0, y - 35.0, 14.0, WHITE);

        self.draw_bar(x - 15.0, y - 25.0, 30.0, 4.0, player.health_fraction(), RED, HEALTH);
        self.draw_bar(x - 15.0, y - 20.0, 30.0, 4.0, player.mana_fraction(), BACKGROUND, MANA);
    }

    fn draw_enemy(&self, enemy: &RenderEnemy) {
        let (x, y) = (enemy.position.x, enemy.position.y);
        let half = ENEMY_SIZE / 2.0;
        draw_rectangle(x - half, y - half, ENEMY_SIZE, ENEMY_SIZE, ENEMY);
        self.draw_bar(x - half, y - 15.0, ENEMY_SIZE, 3.0, enemy.health_fraction(), RED, HEALTH);
    }

    #[allow(clippy::too_many_arguments)]
    fn draw_bar(&self, x: f32, y: f32, w: f32, h: f32, fill: f32, back: Color, front: Color) {
        draw_rectangle(x, y, w, h, back);
        draw_rectangle(x, y, w * fill, h, front);
    }

    fn draw_hud(&self, hud: &HudInfo, state: &RenderState) {
        let (status, color) = match hud.connection {
            ConnectionState::Connected => ("CONNECTED (WASD to move)", GREEN),
            ConnectionState::Connecting => ("CONNECTING", YELLOW),
            ConnectionState::Disconnected => ("DISCONNECTED", RED),
        };
        draw_rectangle(10.0, 10.0, 8.0, 8.0, color);
        draw_text(status, 24.0, 18.0, 16.0, WHITE);

        let buffer_text = format!(
            "snapshots {}/{}  t {}",
            hud.buffered,
            hud.capacity,
            hud.last_t
                .map(|t| format!("{:.2}", t))
                .unwrap_or_else(|| "-".to_string())
        );
        draw_text(&buffer_text, 10.0, 36.0, 14.0, WHITE);

        let frames_text = format!(
            "frames {} skipped {} frozen {} dropped {}",
            hud.stats.rendered, hud.stats.skipped, hud.stats.frozen, hud.stats.dropped_messages
        );
        draw_text(&frames_text, 10.0, 52.0, 14.0, WHITE);

        let entities_text = format!(
            "{} players  {} enemies  {} projectiles",
            state.players.len(),
            state.enemies.len(),
            state.projectiles.len()
        );
        draw_text(&entities_text, 10.0, 68.0, 14.0, WHITE);

        let line_height = 16.0;
        let mut bottom = screen_height() - 10.0;

        if let Some(text) = &hud.typing {
            draw_rectangle(5.0, bottom - 14.0, screen_width() - 10.0, 18.0, GRID);
            draw_text(&format!("> {}_", text), 10.0, bottom, 14.0, YELLOW);
            bottom -= line_height + 4.0;
        }

        for (i, line) in hud.chat.iter().rev().enumerate() {
            let y = bottom - i as f32 * line_height;
            draw_text(&line.to_string(), 10.0, y, 14.0, WHITE);
        }
    }
}
