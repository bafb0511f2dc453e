use rand::seq::SliceRandom;
use std::time::SystemTime;

/// Particle for celebration animation
#[derive(Debug, Clone)]
pub struct CelebrationParticle {
    pub x: f64,
    pub y: f64,
    pub vel_x: f64,
    pub vel_y: f64,
    pub symbol: char,
    pub color_index: usize,
    pub age: f64,
    pub max_age: f64,
    pub is_text: bool, // Whether this particle is part of text formation
    pub target_x: f64, // Target position for text particles
    pub target_y: f64,
}

impl CelebrationParticle {
    fn new(x: f64, y: f64) -> Self {
        use rand::Rng;
        let mut rng = rand::thread_rng();

        Self {
            x,
            y,
            vel_x: rng.gen_range(-3.0..3.0), // Increased velocity for visible movement
            vel_y: rng.gen_range(-4.0..-1.0),
            symbol: *['✨', '🎉', '⭐', '💫', '🌟', '✓', '🎊']
                .choose(&mut rng)
                .unwrap_or(&'✨'),
            color_index: rng.gen_range(0..7),
            age: 0.0,
            max_age: rng.gen_range(2.0..4.0),
            is_text: false,
            target_x: x,
            target_y: y,
        }
    }

    fn new_text_particle(
        x: f64,
        y: f64,
        target_x: f64,
        target_y: f64,
        symbol: char,
        color: usize,
    ) -> Self {
        use rand::Rng;
        let mut rng = rand::thread_rng();

        Self {
            x,
            y,
            vel_x: (target_x - x) * 1.0, // Increased speed towards target
            vel_y: (target_y - y) * 1.0,
            symbol,
            color_index: color,
            age: 0.0,
            max_age: rng.gen_range(3.0..5.0), // Text particles last longer
            is_text: true,
            target_x,
            target_y,
        }
    }

    fn update(&mut self, dt: f64) -> bool {
        if self.is_text {
            // Text particles move towards target and then stay
            let dist_to_target =
                ((self.target_x - self.x).powi(2) + (self.target_y - self.y).powi(2)).sqrt();
            if dist_to_target > 1.0 {
                self.x += self.vel_x * dt;
                self.y += self.vel_y * dt;
                // Slow down as we approach target
                self.vel_x *= 0.95; // Less aggressive slowdown
                self.vel_y *= 0.95;
            } else {
                // Snap to target and stay there
                self.x = self.target_x;
                self.y = self.target_y;
                self.vel_x = 0.0;
                self.vel_y = 0.0;
            }
        } else {
            // Regular particles with physics
            self.x += self.vel_x * dt;
            self.y += self.vel_y * dt;
            self.vel_y += 15.0 * dt; // Increased gravity for more dramatic fall
        }

        self.age += dt;
        self.age < self.max_age
    }
}

/// Animation state for celebration
#[derive(Debug)]
pub struct CelebrationAnimation {
    pub particles: Vec<CelebrationParticle>,
    pub start_time: SystemTime,
    pub duration: f64, // seconds
    pub is_active: bool,
    pub terminal_width: f64,
    pub terminal_height: f64,
}

impl CelebrationAnimation {
    pub fn new() -> Self {
        Self {
            particles: Vec::new(),
            start_time: SystemTime::now(),
            duration: 3.0, // 3 second celebration
            is_active: false,
            terminal_width: 80.0,
            terminal_height: 24.0,
        }
    }

    pub fn start(&mut self, width: u16, height: u16) {
        use rand::Rng;
        let mut rng = rand::thread_rng();

        self.particles.clear();
        self.start_time = SystemTime::now();
        self.is_active = true;
        self.terminal_width = width as f64;
        self.terminal_height = height as f64;

        let center_x = width as f64 / 2.0;
        let center_y = height as f64 / 2.0;

        // Choose a random encouraging word
        let words = [
            "PERFECT!",
            "AMAZING!",
            "EXCELLENT!",
            "FLAWLESS!",
            "SUPERB!",
            "BRILLIANT!",
        ];
        let chosen_word = words.choose(&mut rng).unwrap_or(&"PERFECT!");

        // Create text particles for the chosen word
        self.create_text_particles(chosen_word, center_x, center_y, &mut rng);

        // Add some decorative particles around the text with more spread
        for _ in 0..25 {
            let offset_x = rng.gen_range(-15.0..15.0);
            let offset_y = rng.gen_range(-8.0..8.0);
            self.particles.push(CelebrationParticle::new(
                center_x + offset_x,
                center_y + offset_y,
            ));
        }
    }

    fn create_text_particles(
        &mut self,
        text: &str,
        center_x: f64,
        center_y: f64,
        rng: &mut rand::rngs::ThreadRng,
    ) {
        use rand::Rng;

        let char_width = 2.0; // Space between characters
        let text_width = (text.len() as f64 - 1.0) * char_width;
        let start_x = center_x - text_width / 2.0;

        for (i, ch) in text.chars().enumerate() {
            if ch != ' ' {
                // Skip spaces
                let target_x = start_x + (i as f64 * char_width);
                let target_y = center_y - 2.0; // Position text above center

                // Start particles from random positions around the center and move to form text
                let start_x = center_x + rng.gen_range(-10.0..10.0);
                let start_y = center_y + rng.gen_range(-5.0..5.0);

                // Use bright colors for text
                let color = rng.gen_range(0..7);

                self.particles.push(CelebrationParticle::new_text_particle(
                    start_x, start_y, target_x, target_y, ch, color,
                ));
            }
        }
    }

    pub fn update(&mut self) {
        if !self.is_active {
            return;
        }

        let elapsed = self.start_time.elapsed().unwrap_or_default().as_secs_f64();
        if elapsed >= self.duration {
            self.is_active = false;
            self.particles.clear();
            return;
        }

        let dt = 0.1; // Fixed timestep for animation
        self.particles.retain_mut(|particle| {
            let still_alive = particle.update(dt);

            // Remove decorative particles that fall off screen (text particles should stay)
            if !particle.is_text {
                // Remove if particle is way off screen (allow some buffer for smooth exit)
                let buffer = 5.0;
                let off_screen = particle.y > self.terminal_height + buffer
                    || particle.x < -buffer
                    || particle.x > self.terminal_width + buffer;
                still_alive && !off_screen
            } else {
                still_alive
            }
        });
    }
}

impl Default for CelebrationAnimation {
    fn default() -> Self {
        Self::new()
    }
}
