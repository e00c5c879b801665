//! Crossfade between two field/color snapshots.
//!
//! The controller is an explicit state machine: it either has nothing, one
//! settled pair, or a `from -> to` transition with its timing. A transition
//! always blends two pairs built on the same grid; the blend is written into
//! a scratch pair owned by the controller, never into `from` or `to`.

use contour_art_core::color::ColorField;
use contour_art_core::error::EngineError;
use contour_art_core::field::{GridSize, ScalarField};

/// `4t^3` below one half, `1 - (2 - 2t)^3 / 2` above.
pub fn ease_in_out_cubic(t: f64) -> f64 {
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

/// Linear progress of a transition `elapsed_ms` in, clamped to [0, 1]. A
/// non-positive duration completes immediately.
pub fn transition_progress(elapsed_ms: f64, duration_ms: f64) -> f64 {
    if duration_ms <= 0.0 {
        return 1.0;
    }
    (elapsed_ms / duration_ms).clamp(0.0, 1.0)
}

/// A field and its colors, tagged with the source image they came from.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldPair {
    pub image: usize,
    pub field: ScalarField,
    pub colors: ColorField,
}

impl FieldPair {
    pub fn new(image: usize, (field, colors): (ScalarField, ColorField)) -> Self {
        Self {
            image,
            field,
            colors,
        }
    }

    pub fn grid(&self) -> GridSize {
        self.field.grid()
    }
}

#[derive(Debug, Default)]
enum TransitionState {
    #[default]
    Empty,
    Idle {
        current: FieldPair,
    },
    Transitioning {
        from: FieldPair,
        to: FieldPair,
        started_ms: f64,
        progress: f64,
    },
}

/// Drives crossfades and hands the renderer the field to draw each frame.
#[derive(Debug, Default)]
pub struct TransitionController {
    state: TransitionState,
    blend_field: Option<ScalarField>,
    blend_colors: Option<ColorField>,
    /// True once the scratch pair holds this transition's blend.
    blended: bool,
}

impl TransitionController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces whatever is shown with `pair`, dropping any transition.
    pub fn install(&mut self, pair: FieldPair) {
        self.state = TransitionState::Idle { current: pair };
        self.blended = false;
    }

    /// Begins a crossfade to `target` at `now_ms`.
    ///
    /// With nothing installed yet, `target` is installed directly. A
    /// transition already in flight is first committed, so the new one starts
    /// from its target. Returns `EngineError::DimensionMismatch` if `target`
    /// lives on a different grid than the pair it would blend from; the
    /// controller is then left idle on that pair.
    pub fn start(&mut self, target: FieldPair, now_ms: f64) -> Result<(), EngineError> {
        let current = match std::mem::take(&mut self.state) {
            TransitionState::Empty => {
                self.install(target);
                return Ok(());
            }
            TransitionState::Idle { current } => current,
            TransitionState::Transitioning { to, .. } => to,
        };

        if current.grid() != target.grid() {
            let (lhs, rhs) = (current.grid(), target.grid());
            self.install(current);
            return Err(EngineError::DimensionMismatch {
                lhs_w: lhs.width,
                lhs_h: lhs.height,
                rhs_w: rhs.width,
                rhs_h: rhs.height,
            });
        }

        tracing::info!(from = current.image, to = target.image, "transition started");
        self.state = TransitionState::Transitioning {
            from: current,
            to: target,
            started_ms: now_ms,
            progress: 0.0,
        };
        self.blended = false;
        Ok(())
    }

    /// Advances the transition to `now_ms` and returns the field and colors
    /// to render this frame, or `None` if nothing is installed.
    ///
    /// On completion the target is committed and returned as-is, so the
    /// final frame shows the target exactly.
    pub fn advance(
        &mut self,
        now_ms: f64,
        duration_ms: f64,
    ) -> Result<Option<(&ScalarField, &ColorField)>, EngineError> {
        let finished = match &mut self.state {
            TransitionState::Transitioning {
                from,
                to,
                started_ms,
                progress,
            } => {
                *progress = transition_progress(now_ms - *started_ms, duration_ms);
                if *progress >= 1.0 {
                    true
                } else {
                    let eased = ease_in_out_cubic(*progress) as f32;
                    let grid = from.grid();
                    let field = scratch(&mut self.blend_field, grid, ScalarField::new, ScalarField::grid);
                    from.field.lerp_into(&to.field, eased, field)?;
                    let colors = scratch(&mut self.blend_colors, grid, ColorField::new, ColorField::grid);
                    from.colors.lerp_into(&to.colors, eased, colors)?;
                    self.blended = true;
                    false
                }
            }
            _ => false,
        };
        if finished {
            self.commit();
        }
        Ok(self.active())
    }

    /// The pair the last frame was rendered from.
    pub fn active(&self) -> Option<(&ScalarField, &ColorField)> {
        match &self.state {
            TransitionState::Empty => None,
            TransitionState::Idle { current } => Some((&current.field, &current.colors)),
            TransitionState::Transitioning { from, .. } => {
                match (self.blended, &self.blend_field, &self.blend_colors) {
                    (true, Some(field), Some(colors)) => Some((field, colors)),
                    _ => Some((&from.field, &from.colors)),
                }
            }
        }
    }

    /// Swaps in rebuilt pairs after a parameter change or resize.
    ///
    /// A running transition keeps its timing only if `target` is given and
    /// the grid is unchanged. Otherwise the transition is discarded and the
    /// rebuilt target (if any) becomes the settled pair, so mismatched grids
    /// are never blended.
    pub fn regenerated(&mut self, current: FieldPair, target: Option<FieldPair>) {
        let old_grid = self.grid();
        let state = std::mem::take(&mut self.state);
        self.state = match (state, target) {
            (
                TransitionState::Transitioning {
                    started_ms,
                    progress,
                    ..
                },
                Some(to),
            ) if old_grid == Some(current.grid()) && to.grid() == current.grid() => {
                TransitionState::Transitioning {
                    from: current,
                    to,
                    started_ms,
                    progress,
                }
            }
            (_, Some(to)) => {
                tracing::debug!(image = to.image, "grid changed; transition discarded");
                TransitionState::Idle { current: to }
            }
            (_, None) => TransitionState::Idle { current },
        };
        self.blended = false;
    }

    fn commit(&mut self) {
        self.state = match std::mem::take(&mut self.state) {
            TransitionState::Transitioning { from, to, .. } => {
                tracing::info!(from = from.image, to = to.image, "transition complete");
                TransitionState::Idle { current: to }
            }
            other => other,
        };
        self.blended = false;
    }

    /// Grid of the installed pairs.
    pub fn grid(&self) -> Option<GridSize> {
        match &self.state {
            TransitionState::Empty => None,
            TransitionState::Idle { current } => Some(current.grid()),
            TransitionState::Transitioning { from, .. } => Some(from.grid()),
        }
    }

    /// Image the settled (or `from`) pair was built from.
    pub fn current_image(&self) -> Option<usize> {
        match &self.state {
            TransitionState::Empty => None,
            TransitionState::Idle { current } => Some(current.image),
            TransitionState::Transitioning { from, .. } => Some(from.image),
        }
    }

    /// Image being transitioned to, or the settled image when idle.
    pub fn target_image(&self) -> Option<usize> {
        match &self.state {
            TransitionState::Empty => None,
            TransitionState::Idle { current } => Some(current.image),
            TransitionState::Transitioning { to, .. } => Some(to.image),
        }
    }

    pub fn is_transitioning(&self) -> bool {
        matches!(self.state, TransitionState::Transitioning { .. })
    }

    /// Linear progress of the running transition; 1 when settled, 0 when empty.
    pub fn progress(&self) -> f64 {
        match &self.state {
            TransitionState::Empty => 0.0,
            TransitionState::Idle { .. } => 1.0,
            TransitionState::Transitioning { progress, .. } => *progress,
        }
    }
}

/// Returns the scratch buffer in `slot`, reallocating it for `grid` if needed.
fn scratch<T>(
    slot: &mut Option<T>,
    grid: GridSize,
    alloc: fn(GridSize) -> T,
    grid_of: fn(&T) -> GridSize,
) -> &mut T {
    if slot.as_ref().map(grid_of) != Some(grid) {
        *slot = Some(alloc(grid));
    }
    slot.get_or_insert_with(|| alloc(grid))
}
