/// Visual effects owned by the renderer: particles and short flashes.
///
/// Positions are terminal cells (column, row) as floats so particles can
/// drift smoothly across frames. Nothing here touches the terminal; the
/// renderer reads `particles()` and draws them on top of each frame.

use rand::Rng;

/// RGB triple; faded by the renderer according to remaining life.
pub type Rgb = (u8, u8, u8);

pub const GOLD: [Rgb; 3] = [(255, 215, 80), (255, 170, 40), (255, 240, 160)];
pub const GLOW: [Rgb; 3] = [(80, 200, 255), (120, 160, 255), (190, 240, 255)];
pub const EMBER: [Rgb; 2] = [(255, 90, 60), (255, 140, 90)];

const GLYPHS: [char; 4] = ['*', '+', '.', '·'];
const MAX_PARTICLES: usize = 400;
const BUMP_FRAMES: u32 = 8;
const GRAVITY: f32 = 0.02;

#[derive(Clone, Debug)]
pub struct Particle {
    pub x: f32,
    pub y: f32,
    vx: f32,
    vy: f32,
    life: u32,
    max_life: u32,
    pub ch: char,
    pub color: Rgb,
}

impl Particle {
    /// 1.0 when fresh, approaching 0.0 as it dies.
    pub fn strength(&self) -> f32 {
        self.life as f32 / self.max_life.max(1) as f32
    }
}

/// A wall bump: the blocked cell flashes for a few frames.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BumpFlash {
    pub x: i32,
    pub y: i32,
    pub frames_left: u32,
}

pub struct Effects {
    enabled: bool,
    particles: Vec<Particle>,
    bump: Option<BumpFlash>,
}

impl Effects {
    pub fn new(enabled: bool) -> Self {
        Effects {
            enabled,
            particles: Vec::with_capacity(64),
            bump: None,
        }
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn bump_flash(&self) -> Option<BumpFlash> {
        self.bump
    }

    pub fn clear(&mut self) {
        self.particles.clear();
        self.bump = None;
    }

    /// Radial burst of `count` particles from (x, y).
    pub fn burst<R: Rng + ?Sized>(&mut self, x: f32, y: f32, count: usize, palette: &[Rgb], rng: &mut R) {
        if !self.enabled || palette.is_empty() {
            return;
        }
        for _ in 0..count {
            if self.particles.len() >= MAX_PARTICLES {
                break;
            }
            let angle = rng.gen_range(0.0..std::f32::consts::TAU);
            let speed = rng.gen_range(0.3..1.2);
            let life = rng.gen_range(20..45);
            self.particles.push(Particle {
                x,
                y,
                // terminal cells are about twice as tall as wide
                vx: angle.cos() * speed * 2.0,
                vy: angle.sin() * speed,
                life,
                max_life: life,
                ch: GLYPHS[rng.gen_range(0..GLYPHS.len())],
                color: palette[rng.gen_range(0..palette.len())],
            });
        }
    }

    /// Occasionally spawn a slow floater somewhere in a `w × h` area.
    pub fn ambient<R: Rng + ?Sized>(&mut self, w: usize, h: usize, rng: &mut R) {
        if !self.enabled || w == 0 || h == 0 || !rng.gen_bool(0.15) {
            return;
        }
        if self.particles.len() >= MAX_PARTICLES / 4 {
            return;
        }
        let life = rng.gen_range(60..120);
        self.particles.push(Particle {
            x: rng.gen_range(0.0..w as f32),
            y: h as f32 - 1.0,
            vx: rng.gen_range(-0.1..0.1),
            vy: -rng.gen_range(0.05..0.2),
            life,
            max_life: life,
            ch: '·',
            color: GLOW[rng.gen_range(0..GLOW.len())],
        });
    }

    pub fn bump(&mut self, x: i32, y: i32) {
        self.bump = Some(BumpFlash { x, y, frames_left: BUMP_FRAMES });
    }

    /// Advance one frame.
    pub fn update(&mut self) {
        for p in &mut self.particles {
            p.x += p.vx;
            p.y += p.vy;
            p.vy += GRAVITY;
            p.vx *= 0.96;
            p.life = p.life.saturating_sub(1);
        }
        self.particles.retain(|p| p.life > 0);

        if let Some(flash) = &mut self.bump {
            flash.frames_left = flash.frames_left.saturating_sub(1);
            if flash.frames_left == 0 {
                self.bump = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn burst_spawns_and_expires() {
        let mut fx = Effects::new(true);
        let mut rng = StdRng::seed_from_u64(1);
        fx.burst(10.0, 5.0, 30, &GOLD, &mut rng);
        assert_eq!(fx.particles().len(), 30);
        assert!(fx.particles().iter().all(|p| GOLD.contains(&p.color)));

        for _ in 0..60 {
            fx.update();
        }
        assert!(fx.particles().is_empty());
    }

    #[test]
    fn disabled_effects_spawn_nothing() {
        let mut fx = Effects::new(false);
        let mut rng = StdRng::seed_from_u64(1);
        fx.burst(0.0, 0.0, 10, &GOLD, &mut rng);
        for _ in 0..100 {
            fx.ambient(80, 24, &mut rng);
        }
        assert!(fx.particles().is_empty());
    }

    #[test]
    fn particle_count_is_capped() {
        let mut fx = Effects::new(true);
        let mut rng = StdRng::seed_from_u64(2);
        fx.burst(0.0, 0.0, MAX_PARTICLES * 2, &GLOW, &mut rng);
        assert_eq!(fx.particles().len(), MAX_PARTICLES);
    }

    #[test]
    fn strength_fades() {
        let mut fx = Effects::new(true);
        let mut rng = StdRng::seed_from_u64(3);
        fx.burst(0.0, 0.0, 1, &EMBER, &mut rng);
        assert_eq!(fx.particles()[0].strength(), 1.0);
        fx.update();
        assert!(fx.particles()[0].strength() < 1.0);
    }

    #[test]
    fn bump_flash_times_out() {
        let mut fx = Effects::new(true);
        fx.bump(3, 4);
        assert_eq!(fx.bump_flash().map(|b| (b.x, b.y)), Some((3, 4)));
        for _ in 0..BUMP_FRAMES {
            fx.update();
        }
        assert_eq!(fx.bump_flash(), None);
    }

    #[test]
    fn clear_drops_everything() {
        let mut fx = Effects::new(true);
        let mut rng = StdRng::seed_from_u64(4);
        fx.burst(0.0, 0.0, 5, &GOLD, &mut rng);
        fx.bump(1, 1);
        fx.clear();
        assert!(fx.particles().is_empty());
        assert!(fx.bump_flash().is_none());
    }
}
