use std::collections::VecDeque;

use burn::config::Config;
use ndarray::{s, Array2, Array3};
use rand::prelude::*;

use super::{EnvError, Environment, Frame, Info, Step};

#[derive(Config, Debug)]
pub struct CatchConfig {
    /// Board side, in cells.
    #[config(default = 12)]
    pub grid_size: usize,
    /// Pixels per cell side in the rendered frame.
    #[config(default = 4)]
    pub cell_pixels: usize,
    /// Number of past frames stacked as channels.
    #[config(default = 4)]
    pub frame_stack: usize,
    #[config(default = 3)]
    pub paddle_width: usize,
    /// Balls dropped per episode; the episode ends after the last one lands.
    #[config(default = 5)]
    pub balls_per_episode: usize,
    #[config(default = 0)]
    pub seed: u64,
}

/// Paddle moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatchAction {
    Stay = 0,
    Left = 1,
    Right = 2,
}

impl CatchAction {
    pub const COUNT: usize = 3;

    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::Stay),
            1 => Some(Self::Left),
            2 => Some(Self::Right),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Ball {
    row: usize,
    col: usize,
    /// -1, 0 or 1 column per row; bounces off the side walls
    drift: isize,
}

/// Breakout-flavoured catching game.
///
/// A ball falls one row per step, drifting diagonally and bouncing off the
/// walls; the agent slides a paddle along the bottom row. Catching a ball
/// gives `+1`, missing it `-1`. Observations are the last `frame_stack`
/// renders stacked along the channel axis, like an Atari frame-stack wrapper.
pub struct Catch {
    config: CatchConfig,
    rng: StdRng,
    ball: Ball,
    paddle: usize,
    balls_left: usize,
    frames: VecDeque<Array2<u8>>,
    steps: usize,
    done: bool,
}

impl Catch {
    pub fn new(config: CatchConfig) -> Result<Self, EnvError> {
        if config.paddle_width == 0 || config.paddle_width > config.grid_size {
            return Err(EnvError::Unavailable(format!(
                "paddle width {} does not fit a {}-cell board",
                config.paddle_width, config.grid_size
            )));
        }
        if config.grid_size < 2 || config.cell_pixels == 0 || config.frame_stack == 0 {
            return Err(EnvError::Unavailable(
                "board, cell size and frame stack must be non-empty".to_string(),
            ));
        }

        let rng = StdRng::seed_from_u64(config.seed);
        Ok(Self {
            rng,
            ball: Ball {
                row: 0,
                col: 0,
                drift: 0,
            },
            paddle: 0,
            balls_left: 0,
            frames: VecDeque::with_capacity(config.frame_stack),
            steps: 0,
            // must be reset before the first step
            done: true,
            config,
        })
    }

    pub fn config(&self) -> &CatchConfig {
        &self.config
    }

    /// Side of the rendered frame in pixels.
    pub fn frame_size(&self) -> usize {
        self.config.grid_size * self.config.cell_pixels
    }

    fn bottom(&self) -> usize {
        self.config.grid_size - 1
    }

    fn spawn_ball(&mut self) {
        self.ball = Ball {
            row: 0,
            col: self.rng.gen_range(0..self.config.grid_size),
            drift: self.rng.gen_range(-1..=1),
        };
    }

    fn advance(ball: Ball, grid_size: usize) -> Ball {
        let mut drift = ball.drift;
        let mut col = ball.col as isize + drift;
        if col < 0 || col >= grid_size as isize {
            drift = -drift;
            col = ball.col as isize + drift;
        }
        Ball {
            row: ball.row + 1,
            col: col as usize,
            drift,
        }
    }

    /// Column where the current ball will reach the paddle row.
    pub fn landing_column(&self) -> usize {
        let mut ball = self.ball;
        while ball.row < self.bottom() {
            ball = Self::advance(ball, self.config.grid_size);
        }
        ball.col
    }

    /// Move that brings the paddle centre towards the landing column.
    pub fn expert_action(&self) -> CatchAction {
        let centre = self.paddle + self.config.paddle_width / 2;
        let target = self.landing_column();
        if target < centre {
            CatchAction::Left
        } else if target > centre {
            CatchAction::Right
        } else {
            CatchAction::Stay
        }
    }

    fn render_frame(&self) -> Array2<u8> {
        let px = self.config.cell_pixels;
        let size = self.frame_size();
        let mut frame = Array2::zeros((size, size));

        let (row, col) = (self.ball.row * px, self.ball.col * px);
        frame.slice_mut(s![row..row + px, col..col + px]).fill(255);

        let bottom = self.bottom() * px;
        let left = self.paddle * px;
        let right = (self.paddle + self.config.paddle_width) * px;
        frame.slice_mut(s![bottom..bottom + px, left..right]).fill(255);
        frame
    }

    fn observation(&self) -> Frame {
        let size = self.frame_size();
        let mut stacked = Array3::zeros((size, size, self.frames.len()));
        for (channel, frame) in self.frames.iter().enumerate() {
            stacked.slice_mut(s![.., .., channel]).assign(frame);
        }
        stacked
    }

    fn push_frame(&mut self) {
        if self.frames.len() == self.config.frame_stack {
            self.frames.pop_front();
        }
        let frame = self.render_frame();
        self.frames.push_back(frame);
    }

    /// Text picture of the board: `o` ball, `=` paddle.
    pub fn render(&self) -> String {
        let n = self.config.grid_size;
        let mut out = String::with_capacity((n + 3) * (n + 2));
        out.push_str(&format!("+{}+\n", "-".repeat(n)));
        for row in 0..n {
            out.push('|');
            for col in 0..n {
                let paddle = row == self.bottom()
                    && (self.paddle..self.paddle + self.config.paddle_width).contains(&col);
                out.push(if row == self.ball.row && col == self.ball.col {
                    'o'
                } else if paddle {
                    '='
                } else {
                    ' '
                });
            }
            out.push_str("|\n");
        }
        out.push_str(&format!("+{}+ balls left: {}", "-".repeat(n), self.balls_left));
        out
    }
}

impl Environment for Catch {
    type Observation = Frame;

    fn reset(&mut self) -> Result<Frame, EnvError> {
        self.paddle = (self.config.grid_size - self.config.paddle_width) / 2;
        self.balls_left = self.config.balls_per_episode;
        self.steps = 0;
        self.done = false;
        self.spawn_ball();

        self.frames.clear();
        let first = self.render_frame();
        for _ in 0..self.config.frame_stack {
            self.frames.push_back(first.clone());
        }
        Ok(self.observation())
    }

    fn step(&mut self, action: usize) -> Result<Step<Frame>, EnvError> {
        if self.done {
            return Err(EnvError::EpisodeOver);
        }
        let action = CatchAction::from_index(action).ok_or(EnvError::InvalidAction {
            action,
            actions: CatchAction::COUNT,
        })?;

        let max_paddle = self.config.grid_size - self.config.paddle_width;
        self.paddle = match action {
            CatchAction::Stay => self.paddle,
            CatchAction::Left => self.paddle.saturating_sub(1),
            CatchAction::Right => (self.paddle + 1).min(max_paddle),
        };
        self.ball = Self::advance(self.ball, self.config.grid_size);
        self.steps += 1;

        let mut reward = 0.0;
        let mut info = Info::new();
        if self.ball.row == self.bottom() {
            let caught = (self.paddle..self.paddle + self.config.paddle_width)
                .contains(&self.ball.col);
            reward = if caught { 1.0 } else { -1.0 };
            info.insert("caught".to_string(), f64::from(u8::from(caught)));

            self.balls_left = self.balls_left.saturating_sub(1);
            if self.balls_left == 0 {
                self.done = true;
            }
        }

        if reward != 0.0 && !self.done {
            self.spawn_ball();
        }
        self.push_frame();
        let observation = self.observation();

        info.insert("balls_left".to_string(), self.balls_left as f64);
        info.insert("steps".to_string(), self.steps as f64);
        Ok(Step {
            observation,
            reward,
            done: self.done,
            info,
        })
    }

    fn action_space(&self) -> usize {
        CatchAction::COUNT
    }
}
