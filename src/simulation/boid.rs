//! Boid data model
//!
//! A boid carries an immutable id plus position, velocity and color that the
//! update kernel replaces once per frame. Equality is identity: two boids are
//! the same boid when their ids match, whatever their current state.

use cgmath::Vector2;

/// Identity of a boid, dense in `0..n` within a flock
pub type BoidId = u32;

/// 8-bit RGB color
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// A single flocking agent
#[derive(Clone, Copy, Debug)]
pub struct Boid {
    id: BoidId,
    pub position: Vector2<f64>,
    pub velocity: Vector2<f64>,
    pub color: Color,
}

impl Boid {
    pub fn new(id: BoidId, position: Vector2<f64>, velocity: Vector2<f64>, color: Color) -> Self {
        Self {
            id,
            position,
            velocity,
            color,
        }
    }

    pub fn id(&self) -> BoidId {
        self.id
    }

    /// Speed in units per frame
    pub fn speed(&self) -> f64 {
        (self.velocity.x * self.velocity.x + self.velocity.y * self.velocity.y).sqrt()
    }

    /// Integer pixel the renderer anchors this boid's glyph at
    pub fn pixel(&self) -> (i32, i32) {
        (self.position.x as i32, self.position.y as i32)
    }
}

impl PartialEq for Boid {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Boid {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equality_is_by_id() {
        let a = Boid::new(3, Vector2::new(1.0, 2.0), Vector2::new(0.5, 0.0), Color::new(255, 0, 127));
        let mut b = a;
        b.position = Vector2::new(900.0, 10.0);
        b.velocity = Vector2::new(-1.0, 1.0);
        b.color = Color::new(0, 255, 127);
        assert_eq!(a, b);

        let c = Boid::new(4, a.position, a.velocity, a.color);
        assert_ne!(a, c);
    }

    #[test]
    fn test_pixel_truncates() {
        let boid = Boid::new(0, Vector2::new(10.9, 20.2), Vector2::new(0.0, 0.0), Color::default());
        assert_eq!(boid.pixel(), (10, 20));
    }

    #[test]
    fn test_speed() {
        let boid = Boid::new(0, Vector2::new(0.0, 0.0), Vector2::new(3.0, 4.0), Color::default());
        assert_eq!(boid.speed(), 5.0);
    }
}
