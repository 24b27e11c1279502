//! Animated tile state.
//!
//! The tracker keeps one [`AnimationState`] per animated tile position that
//! has been drawn into the buffer. States are created lazily by
//! [`AnimationTracker::resolve`] and stepped by [`AnimationTracker::advance`].
//!
//! # Stepping
//!
//! A state whose deadline has passed moves forward exactly one frame per
//! `advance` call, and its next deadline is computed from the time passed to
//! that call. A large time jump therefore never causes a burst of frame
//! changes.
//!
//! The clock is whatever the caller passes to `advance`; it need not start at
//! zero. States resolved before the first `advance` get their first deadline
//! from that call and do not change frame in it.
//!
//! # Off-buffer positions
//!
//! Animations outside the buffer window are paused. `advance` marks them as
//! parked and leaves their frame alone; the next `resolve` of a parked state
//! restarts its deadline from the current time, so the frame shown when a
//! position scrolls back into view is the frame it had when it left.
//!
//! Parked states are kept so that frame survives, up to a limit
//! ([`DEFAULT_PARKED_LIMIT`] by default). Past it, the parked states farthest
//! from the window are forgotten and restart from frame 0 when drawn again.

use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

use tilescroll_types::geometry::{Point, Rect};

use crate::data::{AnimationSequence, TileCoord, TileImage};

/// Parked states kept before the farthest ones are dropped.
pub const DEFAULT_PARKED_LIMIT: usize = 4096;

/// Per-position animation progress.
struct AnimationState<P> {
    sequence: Rc<AnimationSequence<P>>,
    index: usize,
    /// `None` until the clock is known.
    next_flip: Option<Duration>,
    parked: bool,
}

/// Tracks every animated tile currently referenced by the buffer.
pub struct AnimationTracker<P> {
    states: HashMap<TileCoord, AnimationState<P>>,
    now: Option<Duration>,
    parked_limit: usize,
}

impl<P> AnimationTracker<P> {
    pub fn new() -> Self {
        Self::with_parked_limit(DEFAULT_PARKED_LIMIT)
    }

    pub fn with_parked_limit(parked_limit: usize) -> Self {
        Self {
            states: HashMap::new(),
            now: None,
            parked_limit,
        }
    }

    /// Time of the last `advance` call, if there was one.
    pub fn now(&self) -> Option<Duration> {
        self.now
    }

    /// Current frame image for an animated tile at `coord`.
    ///
    /// Creates the state on first use (frame 0, deadline `now + duration`,
    /// or the next `advance` if the clock has not started). A position whose sequence changed (map edited) restarts from frame 0.
    pub fn resolve(&mut self, coord: TileCoord, sequence: &Rc<AnimationSequence<P>>) -> TileImage<P> {
        let now = self.now;
        let state = self
            .states
            .entry(coord)
            .and_modify(|state| {
                if !Rc::ptr_eq(&state.sequence, sequence) {
                    *state = AnimationState::start(Rc::clone(sequence), now);
                } else if state.parked {
                    state.parked = false;
                    state.next_flip = now.map(|t| t + state.sequence.frame(state.index).duration);
                }
            })
            .or_insert_with(|| AnimationState::start(Rc::clone(sequence), now));
        state.sequence.frame(state.index).image.clone()
    }

    /// Step every due animation inside `window` (tile coordinates) by one
    /// frame. Returns the coordinates whose frame changed, sorted.
    pub fn advance(&mut self, now: Duration, window: Rect) -> Vec<TileCoord> {
        self.now = Some(now);
        let mut changed = Vec::new();
        let mut parked = 0;
        for (coord, state) in &mut self.states {
            if !window.contains_point(Point::new(coord.x, coord.y)) {
                state.parked = true;
                parked += 1;
                continue;
            }
            if state.parked {
                continue;
            }
            let Some(due) = state.next_flip else {
                state.next_flip = Some(now + state.sequence.frame(state.index).duration);
                continue;
            };
            if now < due {
                continue;
            }
            let previous = state.index;
            state.index = (state.index + 1) % state.sequence.len();
            state.next_flip = Some(now + state.sequence.frame(state.index).duration);
            if state.index != previous {
                changed.push(*coord);
            }
        }
        if parked > self.parked_limit {
            self.evict_parked(parked - self.parked_limit, window);
        }
        changed.sort_unstable();
        changed
    }

    /// Drop the `count` parked states farthest from `window`.
    fn evict_parked(&mut self, count: usize, window: Rect) {
        let mut far: Vec<(u64, TileCoord)> = self
            .states
            .iter()
            .filter(|(_, s)| s.parked)
            .map(|(c, _)| (distance(window, Point::new(c.x, c.y)), *c))
            .collect();
        far.sort_unstable_by(|a, b| b.cmp(a));
        for (_, coord) in far.into_iter().take(count) {
            self.states.remove(&coord);
        }
        log::debug!("forgot {count} parked animations");
    }

    /// Current frame index at `coord`, if that position is tracked.
    pub fn frame_index(&self, coord: TileCoord) -> Option<usize> {
        self.states.get(&coord).map(|s| s.index)
    }

    /// Whether the animation at `coord` is paused off-buffer.
    pub fn is_parked(&self, coord: TileCoord) -> bool {
        self.states.get(&coord).is_some_and(|s| s.parked)
    }

    /// Forget every state. Used when the buffer is reallocated or the map
    /// reloaded; the clock is kept.
    pub fn clear(&mut self) {
        self.states.clear();
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

impl<P> Default for AnimationTracker<P> {
    fn default() -> Self {
        Self::new()
    }
}

/// Chebyshev distance in tiles from `window` to `p`.
fn distance(window: Rect, p: Point) -> u64 {
    let dx = (window.x as i64 - p.x as i64).max(p.x as i64 - (window.right() as i64 - 1));
    let dy = (window.y as i64 - p.y as i64).max(p.y as i64 - (window.bottom() as i64 - 1));
    dx.max(dy).max(0) as u64
}

impl<P> AnimationState<P> {
    fn start(sequence: Rc<AnimationSequence<P>>, now: Option<Duration>) -> Self {
        let next_flip = now.map(|t| t + sequence.frame(0).duration);
        Self {
            sequence,
            index: 0,
            next_flip,
            parked: false,
        }
    }
}
