//! Turns a telemetry frame into the network's state vector and a shaped reward.

use crate::telemetry::{Frame, Obstacle, PlayerPosition};

pub const TICK_REWARD: f32 = 0.1;
pub const PASS_BONUS: f32 = 1.0;
pub const GAME_OVER_REWARD: f32 = -1.0;

// stands in for the sentinel's infinite distance inside the state vector
const NO_OBSTACLE_RIGHT_FEATURE: f32 = -1.0e3;

/// Obstacle class as fed to the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObstacleKind {
    Normal,
    Flying,
    Other,
}

impl ObstacleKind {
    pub fn from_label(label: &str) -> Self {
        match label {
            "normal" => ObstacleKind::Normal,
            "flying" => ObstacleKind::Flying,
            _ => ObstacleKind::Other,
        }
    }

    pub fn code(self) -> f32 {
        match self {
            ObstacleKind::Normal => 0.0,
            ObstacleKind::Flying => 1.0,
            ObstacleKind::Other => 2.0,
        }
    }
}

/// The closest obstacle still ahead of the player, or a sentinel at `-inf`.
#[derive(Debug, Clone, PartialEq)]
pub struct NearestObstacle {
    pub right: f32,
    pub bottom: f32,
    pub kind: ObstacleKind,
}

impl NearestObstacle {
    pub fn none() -> Self {
        Self { right: f32::NEG_INFINITY, bottom: 0.0, kind: ObstacleKind::Other }
    }

    pub fn is_none(&self) -> bool {
        self.right == f32::NEG_INFINITY
    }

    /// Among obstacles with `right` below the player's, the one with the largest `right`.
    pub fn select(player: &PlayerPosition, obstacles: &[Obstacle]) -> Self {
        obstacles
            .iter()
            .filter(|obstacle| obstacle.right < player.right)
            .fold(None, |best: Option<&Obstacle>, obstacle| match best {
                Some(current) if current.right >= obstacle.right => Some(current),
                _ => Some(obstacle),
            })
            .map(|obstacle| Self {
                right: obstacle.right,
                bottom: obstacle.bottom,
                kind: ObstacleKind::from_label(&obstacle.kind),
            })
            .unwrap_or_else(Self::none)
    }
}

/// A decoded frame: the obstacle that matters and the state vector built from it.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub nearest: NearestObstacle,
    pub state: Vec<f32>,
}

impl Observation {
    pub fn from_frame(frame: &Frame) -> Self {
        let nearest = NearestObstacle::select(&frame.player, &frame.obstacles);
        let nearest_right = if nearest.right.is_finite() { nearest.right } else { NO_OBSTACLE_RIGHT_FEATURE };

        let state = vec![
            frame.player.bottom,
            frame.player.right,
            nearest_right,
            nearest.bottom,
            nearest.kind.code(),
        ];

        Self { nearest, state }
    }
}

/// Per-tick reward: a small survival bonus, plus a pass bonus whenever the
/// nearest obstacle's `right` drops from one tick to the next.
#[derive(Debug, Clone, Default)]
pub struct RewardShaper {
    prev_nearest_right: Option<f32>,
}

impl RewardShaper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reward(&mut self, nearest_right: f32) -> f32 {
        let passed = self.prev_nearest_right.is_some_and(|prev| nearest_right < prev);
        self.prev_nearest_right = Some(nearest_right);

        if passed { TICK_REWARD + PASS_BONUS } else { TICK_REWARD }
    }

    pub fn clear(&mut self) {
        self.prev_nearest_right = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obstacle(right: f32, bottom: f32, kind: &str) -> Obstacle {
        Obstacle { right, bottom, kind: kind.to_string() }
    }

    fn player(right: f32) -> PlayerPosition {
        PlayerPosition { bottom: 0.0, right }
    }

    #[test]
    fn test_nearest_is_largest_right_behind_player() {
        let obstacles = vec![obstacle(10.0, 0.0, "normal"), obstacle(40.0, 30.0, "flying"), obstacle(5.0, 0.0, "normal")];

        let nearest = NearestObstacle::select(&player(50.0), &obstacles);

        assert_eq!(nearest.right, 40.0);
        assert_eq!(nearest.bottom, 30.0);
        assert_eq!(nearest.kind, ObstacleKind::Flying);
    }

    #[test]
    fn test_nearest_skips_obstacles_at_or_past_player() {
        let obstacles = vec![obstacle(50.0, 0.0, "normal"), obstacle(80.0, 0.0, "normal"), obstacle(20.0, 0.0, "normal")];
        assert_eq!(NearestObstacle::select(&player(50.0), &obstacles).right, 20.0);
    }

    #[test]
    fn test_nearest_sentinel_when_none_eligible() {
        let obstacles = vec![obstacle(60.0, 0.0, "normal")];

        let nearest = NearestObstacle::select(&player(50.0), &obstacles);

        assert!(nearest.is_none());
        assert_eq!(nearest.bottom, 0.0);
        assert_eq!(nearest.kind.code(), 2.0);
        assert!(NearestObstacle::select(&player(50.0), &[]).is_none());
    }

    #[test]
    fn test_obstacle_kind_codes() {
        assert_eq!(ObstacleKind::from_label("normal").code(), 0.0);
        assert_eq!(ObstacleKind::from_label("flying").code(), 1.0);
        assert_eq!(ObstacleKind::from_label("higher").code(), 2.0);
        assert_eq!(ObstacleKind::from_label("none").code(), 2.0);
    }

    #[test]
    fn test_state_vector_layout() {
        let frame = Frame {
            player: PlayerPosition { bottom: 12.0, right: 500.0 },
            obstacles: vec![obstacle(320.0, 45.0, "flying")],
            score: None,
        };

        let observation = Observation::from_frame(&frame);

        assert_eq!(observation.state, vec![12.0, 500.0, 320.0, 45.0, 1.0]);
    }

    #[test]
    fn test_state_vector_is_finite_without_obstacle() {
        let frame = Frame { player: player(500.0), obstacles: vec![], score: None };

        let observation = Observation::from_frame(&frame);

        assert!(observation.nearest.is_none());
        assert!(observation.state.iter().all(|x| x.is_finite()));
        assert_eq!(observation.state[4], 2.0);
    }

    #[test]
    fn test_reward_bonus_on_each_decrease() {
        let mut shaper = RewardShaper::new();

        assert_eq!(shaper.reward(300.0), TICK_REWARD);
        for right in [250.0, 200.0, 150.0] {
            assert!((shaper.reward(right) - 1.1).abs() < 1e-6);
        }
        assert_eq!(shaper.reward(150.0), TICK_REWARD);
        assert_eq!(shaper.reward(180.0), TICK_REWARD);
    }

    #[test]
    fn test_reward_bonus_when_last_obstacle_clears() {
        let mut shaper = RewardShaper::new();
        shaper.reward(120.0);

        assert!((shaper.reward(f32::NEG_INFINITY) - 1.1).abs() < 1e-6);
        assert_eq!(shaper.reward(f32::NEG_INFINITY), TICK_REWARD);
    }

    #[test]
    fn test_reward_clear_forgets_previous_tick() {
        let mut shaper = RewardShaper::new();
        shaper.reward(300.0);
        shaper.clear();

        assert_eq!(shaper.reward(100.0), TICK_REWARD);
    }
}
