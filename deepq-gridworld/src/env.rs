//! Four-rooms grid world.
use anyhow::{bail, Result};
use deepq_core::{error::DeepqError, record::Record, ActionSet, Env, Obs, Step};
use log::trace;
use serde::{Deserialize, Serialize};

/// Position of the agent, `(0, 0)` is the bottom-left cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridState {
    /// Column.
    pub x: usize,

    /// Row, increasing to the north.
    pub y: usize,
}

impl GridState {
    /// Constructs a state.
    pub fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

impl Obs for GridState {}

/// Action names of [`GridWorld`], in the order of action indices.
pub const ACTIONS: [&str; 4] = ["north", "south", "west", "east"];

/// Configuration of [`GridWorld`].
///
/// The default is the 11x11 four-rooms map with the agent starting at the
/// bottom-left corner and the goal at the top-right corner.
#[derive(Debug, Deserialize, Serialize, PartialEq, Eq, Clone)]
pub struct GridWorldConfig {
    /// Number of columns.
    pub width: usize,

    /// Number of rows.
    pub height: usize,

    /// Wall cells.
    pub walls: Vec<GridState>,

    /// Initial position of the agent.
    pub start: GridState,

    /// Reaching this cell terminates the episode.
    pub goal: GridState,
}

impl Default for GridWorldConfig {
    fn default() -> Self {
        Self::four_rooms()
    }
}

impl GridWorldConfig {
    /// The 11x11 four-rooms map.
    pub fn four_rooms() -> Self {
        let mut walls = vec![];
        for x in [0, 2, 3, 4] {
            walls.push(GridState::new(x, 5));
        }
        for x in [6, 7, 9, 10] {
            walls.push(GridState::new(x, 4));
        }
        for y in [0, 2, 3, 4, 5, 6, 7, 9, 10] {
            walls.push(GridState::new(5, y));
        }

        Self {
            width: 11,
            height: 11,
            walls,
            start: GridState::new(0, 0),
            goal: GridState::new(10, 10),
        }
    }

    /// A map without walls.
    pub fn open(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            walls: vec![],
            start: GridState::new(0, 0),
            goal: GridState::new(width.saturating_sub(1), height.saturating_sub(1)),
        }
    }

    /// Sets the initial position of the agent.
    pub fn start(mut self, start: GridState) -> Self {
        self.start = start;
        self
    }

    /// Sets the goal.
    pub fn goal(mut self, goal: GridState) -> Self {
        self.goal = goal;
        self
    }

    /// Checks the configuration.
    pub fn validate(&self) -> Result<(), DeepqError> {
        if self.width == 0 || self.height == 0 {
            return Err(DeepqError::InvalidConfig(format!(
                "grid size must be positive, got {}x{}",
                self.width, self.height
            )));
        }
        for (name, s) in [("start", self.start), ("goal", self.goal)] {
            if s.x >= self.width || s.y >= self.height {
                return Err(DeepqError::InvalidConfig(format!(
                    "{} ({}, {}) is outside of the grid",
                    name, s.x, s.y
                )));
            }
            if self.walls.contains(&s) {
                return Err(DeepqError::InvalidConfig(format!(
                    "{} ({}, {}) is a wall",
                    name, s.x, s.y
                )));
            }
        }
        Ok(())
    }
}

/// Deterministic grid world with uniform step cost.
///
/// Every step gives reward -1. Moves into a wall or off the grid leave the
/// agent in place. The episode terminates when the agent stands on the goal.
pub struct GridWorld {
    config: GridWorldConfig,
    blocked: Vec<bool>,
    actions: ActionSet,
    state: GridState,
}

impl GridWorld {
    /// The configuration of the map.
    pub fn config(&self) -> &GridWorldConfig {
        &self.config
    }

    /// Current position of the agent.
    pub fn state(&self) -> GridState {
        self.state
    }

    /// Returns `true` if the cell is a wall.
    pub fn is_wall(&self, x: usize, y: usize) -> bool {
        self.blocked[y * self.config.width + x]
    }

    fn next_state(&self, act: usize) -> Result<GridState> {
        let GridState { x, y } = self.state;
        let (nx, ny) = match act {
            0 => (x, y + 1),
            1 => (x, y.wrapping_sub(1)),
            2 => (x.wrapping_sub(1), y),
            3 => (x + 1, y),
            _ => bail!("Invalid action index {} for the grid world", act),
        };
        if nx >= self.config.width || ny >= self.config.height || self.is_wall(nx, ny) {
            Ok(self.state)
        } else {
            Ok(GridState::new(nx, ny))
        }
    }
}

impl Env for GridWorld {
    type Config = GridWorldConfig;
    type Obs = GridState;

    fn build(config: &Self::Config, _seed: i64) -> Result<Self> {
        config.validate()?;
        let mut blocked = vec![false; config.width * config.height];
        for w in config.walls.iter() {
            if w.x < config.width && w.y < config.height {
                blocked[w.y * config.width + w.x] = true;
            }
        }

        Ok(Self {
            config: config.clone(),
            blocked,
            actions: ActionSet::new(ACTIONS),
            state: config.start,
        })
    }

    fn action_set(&self) -> &ActionSet {
        &self.actions
    }

    fn step(&mut self, act: usize) -> Result<(Step<Self>, Record)> {
        self.state = self.next_state(act)?;
        let is_terminated = self.state == self.config.goal;
        trace!("{} -> ({}, {})", ACTIONS[act], self.state.x, self.state.y);

        let step = Step::new(self.state, act, -1.0, is_terminated, false);
        Ok((step, Record::empty()))
    }

    fn reset(&mut self) -> Result<GridState> {
        self.state = self.config.start;
        Ok(self.state)
    }
}
