/// Size of one spatial hash cell in world units (meters).
/// All cells are square. Chosen so that a typical scene prop spans 1..4 cells.
pub const CELL_SIZE: f32 = 2.0;

/// Minimum planar motion required to update facing (meters per tick).
pub const YAW_EPS: f32 = 1.0e-6;

/// Horizontal speed under which a grounded character is considered idle (m/s).
pub const IDLE_SPEED_EPS: f32 = 0.05;

/// Terminal fall speed (m/s, negative = downward).
pub const TERMINAL_FALL_SPEED_MPS: f32 = -30.0;

/// Upper bound for a single tick's delta time (seconds).
///
/// A stalled frame (tab switch, debugger) must not teleport the character through
/// the scene; longer frames are simulated as if they lasted this long.
pub const MAX_TICK_DT_S: f32 = 0.1;

/// Margin by which scene collision zones are inflated to account for the agent's own
/// footprint (meters).
pub const AGENT_MARGIN: f32 = 0.35;

/// Distance beyond a zone's collision radius at which interaction prompts appear.
pub const INTERACTION_MARGIN: f32 = 1.5;

// Zone-name shape heuristics. Multipliers are applied to the zone's raw radius.

/// Pillars are round columns slightly thinner than their authored radius.
pub const PILLAR_RADIUS_SCALE: f32 = 0.8;

/// Walls are long and thin: full radius along their length, a fraction across.
pub const WALL_LENGTH_SCALE: f32 = 1.0;
pub const WALL_THICKNESS_SCALE: f32 = 0.2;

/// Terminals are square consoles.
pub const TERMINAL_HALF_EXTENT_SCALE: f32 = 0.6;

/// Pedestals are round display plinths.
pub const PEDESTAL_RADIUS_SCALE: f32 = 0.7;

/// Default number of A* node expansions before a path request gives up.
pub const MAX_PATH_EXPANSIONS: usize = 20_000;

/// Extra grid cells searched around the obstacle extent and path endpoints.
pub const PATH_SEARCH_MARGIN_CELLS: i32 = 4;

/// Extra distance past an interaction radius before a zone reports an exit (meters).
/// Keeps prompts from flickering when the character idles on the boundary.
pub const PROXIMITY_HYSTERESIS: f32 = 0.1;
