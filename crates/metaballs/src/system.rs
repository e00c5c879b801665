//! The image-metaball engine: a playlist of source images drawn as animated
//! contour lines that crossfade from one image to the next.

use contour_art_core::config::{FieldParams, MetaballConfig};
use contour_art_core::error::EngineError;
use contour_art_core::field::{GridSize, ScalarField};
use contour_art_core::params::param_f64;
use contour_art_core::perlin::PermutationNoise;
use contour_art_core::pixels::SourceImage;
use contour_art_core::segment::Frame;
use contour_art_core::Engine;
use glam::Vec2;
use serde_json::Value;

use crate::builder::FieldBuilder;
use crate::debounce::ResizeDebounce;
use crate::marching::ContourRenderer;
use crate::threshold::{base_threshold, PointerGrid};
use crate::transition::{FieldPair, TransitionController};

/// Seed used when none is given.
pub const DEFAULT_SEED: u64 = 42;

/// Animated contour rendering of a list of images.
///
/// Field (re)generation happens synchronously inside the call that needs it:
/// construction, an image change, a field-affecting config swap, or the
/// first [`Engine::step`] after a resize has settled.
#[derive(Debug)]
pub struct ImageMetaballs {
    sources: Vec<SourceImage>,
    viewport: (f64, f64),
    grid: GridSize,
    config: MetaballConfig,
    noise: PermutationNoise,
    seed: u64,
    transition: TransitionController,
    /// Last image requested, whether or not its field is installed yet.
    target_index: usize,
    pointer: Option<Vec2>,
    frame: u64,
    resize: ResizeDebounce,
}

impl ImageMetaballs {
    /// Creates the engine and builds the field of the first image.
    ///
    /// If the first image has no drawable area the engine starts without a
    /// field and renders empty frames until another image is shown.
    pub fn new(
        sources: Vec<SourceImage>,
        viewport: (f64, f64),
        config: MetaballConfig,
        seed: u64,
    ) -> Result<Self, EngineError> {
        if sources.is_empty() {
            return Err(EngineError::NoSourceImages);
        }
        config.validate()?;
        let grid = GridSize::from_viewport(viewport.0, viewport.1, config.grid_resolution)?;

        let mut engine = Self {
            sources,
            viewport,
            grid,
            config,
            noise: PermutationNoise::new(seed),
            seed,
            transition: TransitionController::new(),
            target_index: 0,
            pointer: None,
            frame: 0,
            resize: ResizeDebounce::new(),
        };
        match engine.build_pair(0, &engine.layout()) {
            Ok(pair) => engine.transition.install(pair),
            Err(EngineError::EmptyPixelSource) => {
                tracing::warn!(image = 0, "first image is empty; starting without a field");
            }
            Err(e) => return Err(e),
        }
        Ok(engine)
    }

    /// Creates the engine from a JSON parameter object.
    ///
    /// Missing keys fall back to defaults. An optional `"seed"` key overrides `seed`.
    pub fn from_json(
        sources: Vec<SourceImage>,
        viewport: (f64, f64),
        seed: u64,
        params: &Value,
    ) -> Result<Self, EngineError> {
        let seed = param_f64(params, "seed", seed as f64) as u64;
        Self::new(sources, viewport, MetaballConfig::from_json(params), seed)
    }

    /// Crossfades to the image at `index`, starting at `now_ms`.
    ///
    /// Asking for the image that is already the running transition's target
    /// does nothing.
    pub fn transition_to(&mut self, index: usize, now_ms: f64) -> Result<(), EngineError> {
        if index >= self.sources.len() {
            return Err(EngineError::ImageIndexOutOfRange {
                index,
                len: self.sources.len(),
            });
        }
        if self.transition.is_transitioning() && self.target_index == index {
            return Ok(());
        }
        let pair = self.build_pair(index, &self.layout())?;
        self.target_index = index;
        self.transition.start(pair, now_ms)
    }

    /// Crossfades to the image after the current target, wrapping around.
    pub fn next_image(&mut self, now_ms: f64) -> Result<(), EngineError> {
        let next = (self.target_index + 1) % self.sources.len();
        self.transition_to(next, now_ms)
    }

    /// Crossfades to the image before the current target, wrapping around.
    pub fn previous_image(&mut self, now_ms: f64) -> Result<(), EngineError> {
        let len = self.sources.len();
        let prev = (self.target_index + len - 1) % len;
        self.transition_to(prev, now_ms)
    }

    /// Swaps in a new configuration snapshot.
    ///
    /// Fields are rebuilt only if grid resolution, influence radius or
    /// falloff changed; every other setting applies from the next frame. An
    /// invalid snapshot, or one whose fields cannot be rebuilt, is rejected
    /// and the old one kept.
    pub fn set_config(&mut self, config: MetaballConfig) -> Result<(), EngineError> {
        config.validate()?;
        let rebuild = self.config.requires_rebuild(&config);
        if rebuild {
            let layout = Layout::new(self.viewport, &config)?;
            let rebuilt = self.rebuild(&layout)?;
            self.commit_layout(layout, rebuilt);
        }
        self.config = config;
        tracing::debug!(rebuild, "configuration replaced");
        Ok(())
    }

    /// Records a viewport resize. It takes effect in the first
    /// [`Engine::step`] at least 300 ms after the last request.
    pub fn request_resize(&mut self, width: f64, height: f64, now_ms: f64) {
        tracing::debug!(width, height, "resize requested");
        self.resize.request((width, height), now_ms);
    }

    /// Sets the pointer position in viewport pixels, or `None` when absent.
    pub fn set_pointer(&mut self, pointer: Option<Vec2>) {
        self.pointer = pointer;
    }

    pub fn config(&self) -> &MetaballConfig {
        &self.config
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn viewport(&self) -> (f64, f64) {
        self.viewport
    }

    pub fn grid(&self) -> GridSize {
        self.grid
    }

    pub fn image_count(&self) -> usize {
        self.sources.len()
    }

    /// Number of frames produced so far.
    pub fn frame_index(&self) -> u64 {
        self.frame
    }

    pub fn current_image(&self) -> Option<usize> {
        self.transition.current_image()
    }

    pub fn target_image(&self) -> usize {
        self.target_index
    }

    pub fn is_transitioning(&self) -> bool {
        self.transition.is_transitioning()
    }

    pub fn transition_progress(&self) -> f64 {
        self.transition.progress()
    }

    fn layout(&self) -> Layout {
        Layout {
            viewport: self.viewport,
            grid: self.grid,
            params: self.config.field_params(),
        }
    }

    fn build_pair(&self, image: usize, layout: &Layout) -> Result<FieldPair, EngineError> {
        let source = self
            .sources
            .get(image)
            .ok_or(EngineError::ImageIndexOutOfRange {
                index: image,
                len: self.sources.len(),
            })?;
        let pixels = source.cover(layout.viewport);
        let built = FieldBuilder::new(layout.params).build(&pixels, layout.grid)?;
        tracing::info!(
            image,
            width = layout.grid.width,
            height = layout.grid.height,
            "scalar field generated"
        );
        Ok(FieldPair::new(image, built))
    }

    /// Builds every installed field for `layout` without touching engine state.
    ///
    /// `Ok(None)` means nothing is installed and the requested image still
    /// yields no field.
    fn rebuild(&self, layout: &Layout) -> Result<Option<Rebuilt>, EngineError> {
        let Some(current) = self.transition.current_image() else {
            return match self.build_pair(self.target_index, layout) {
                Ok(pair) => Ok(Some((pair, None))),
                Err(EngineError::EmptyPixelSource) => Ok(None),
                Err(e) => Err(e),
            };
        };
        let current = self.build_pair(current, layout)?;
        let target = if self.transition.is_transitioning() {
            Some(self.build_pair(self.target_index, layout)?)
        } else {
            None
        };
        Ok(Some((current, target)))
    }

    fn commit_layout(&mut self, layout: Layout, rebuilt: Option<Rebuilt>) {
        self.viewport = layout.viewport;
        self.grid = layout.grid;
        if let Some((current, target)) = rebuilt {
            self.transition.regenerated(current, target);
        }
    }

    /// Applies a settled resize. A viewport that yields no grid or no field
    /// is ignored and the installed fields stay as they are.
    fn apply_settled_resize(&mut self, now_ms: f64) {
        let Some(size) = self.resize.poll(now_ms) else {
            return;
        };
        if size == self.viewport {
            return;
        }
        let rebuilt = Layout::new(size, &self.config)
            .and_then(|layout| Ok((self.rebuild(&layout)?, layout)));
        match rebuilt {
            Ok((rebuilt, layout)) => {
                self.commit_layout(layout, rebuilt);
                tracing::debug!(
                    width = self.grid.width,
                    height = self.grid.height,
                    "resize applied"
                );
            }
            Err(e) => {
                tracing::warn!(width = size.0, height = size.1, error = %e, "resize ignored");
            }
        }
    }
}

/// Current field, plus the transition target when one is in flight.
type Rebuilt = (FieldPair, Option<FieldPair>);

/// Everything a field build depends on besides the source image.
#[derive(Debug, Clone, Copy)]
struct Layout {
    viewport: (f64, f64),
    grid: GridSize,
    params: FieldParams,
}

impl Layout {
    fn new(viewport: (f64, f64), config: &MetaballConfig) -> Result<Self, EngineError> {
        Ok(Self {
            viewport,
            grid: GridSize::from_viewport(viewport.0, viewport.1, config.grid_resolution)?,
            params: config.field_params(),
        })
    }
}

impl Engine for ImageMetaballs {
    fn step(&mut self, now_ms: f64) -> Result<Frame, EngineError> {
        self.frame += 1;
        self.apply_settled_resize(now_ms);

        let threshold = base_threshold(&self.config, &self.noise, self.frame);
        let pointer = self
            .pointer
            .map(|p| PointerGrid::from_viewport(p, &self.config));

        let segments = match self
            .transition
            .advance(now_ms, self.config.transition_duration_ms)?
        {
            Some((field, colors)) => ContourRenderer::new(&self.noise, &self.config).render(
                field,
                colors,
                threshold,
                self.frame as f64,
                pointer.as_ref(),
            )?,
            None => Vec::new(),
        };
        tracing::debug!(frame = self.frame, segments = segments.len(), threshold, "frame");

        Ok(Frame {
            segments,
            line_width: self.config.line_width as f32,
            threshold,
            frame_index: self.frame,
        })
    }

    fn field(&self) -> Option<&ScalarField> {
        self.transition.active().map(|(field, _)| field)
    }

    fn params(&self) -> Value {
        self.config.to_json()
    }

    fn param_schema(&self) -> Value {
        MetaballConfig::param_schema()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const VIEWPORT: (f64, f64) = (64.0, 64.0);

    /// Black square image with a white disc of `radius` pixels in the middle.
    fn disc_image(size: usize, radius: f64) -> SourceImage {
        let c = size as f64 / 2.0;
        let mut data = Vec::with_capacity(size * size * 4);
        for y in 0..size {
            for x in 0..size {
                let d = ((x as f64 - c).powi(2) + (y as f64 - c).powi(2)).sqrt();
                let v = if d < radius { 255 } else { 0 };
                data.extend_from_slice(&[v, v, v, 255]);
            }
        }
        SourceImage::new(size, size, data).unwrap()
    }

    fn quiet_config() -> MetaballConfig {
        MetaballConfig {
            noise_strength: 0.0,
            ..MetaballConfig::default()
        }
    }

    fn two_image_engine() -> ImageMetaballs {
        ImageMetaballs::new(
            vec![disc_image(64, 16.0), disc_image(64, 24.0)],
            VIEWPORT,
            quiet_config(),
            DEFAULT_SEED,
        )
        .unwrap()
    }

    #[test]
    fn new_rejects_empty_playlist() {
        let result = ImageMetaballs::new(Vec::new(), VIEWPORT, MetaballConfig::default(), 1);
        assert!(matches!(result, Err(EngineError::NoSourceImages)));
    }

    #[test]
    fn new_rejects_invalid_config() {
        let config = MetaballConfig {
            grid_resolution: 0.0,
            ..MetaballConfig::default()
        };
        let result = ImageMetaballs::new(vec![disc_image(8, 2.0)], VIEWPORT, config, 1);
        assert!(matches!(result, Err(EngineError::InvalidConfig(_))));
    }

    #[test]
    fn new_builds_first_field_on_viewport_grid() {
        let engine = two_image_engine();
        assert_eq!(engine.grid(), GridSize::new(32, 32).unwrap());
        let field = engine.field().unwrap();
        assert_eq!(field.grid(), engine.grid());
        assert_eq!(field.max(), 1.0);
        assert_eq!(engine.current_image(), Some(0));
    }

    #[test]
    fn empty_first_image_renders_empty_frames() {
        let empty = SourceImage::new(0, 0, Vec::new()).unwrap();
        let mut engine =
            ImageMetaballs::new(vec![empty], VIEWPORT, MetaballConfig::default(), 1).unwrap();
        assert!(engine.field().is_none());
        let frame = engine.step(0.0).unwrap();
        assert!(frame.is_empty());
        assert_eq!(frame.frame_index, 1);
    }

    #[test]
    fn step_emits_contour_of_disc() {
        let mut engine = two_image_engine();
        let frame = engine.step(0.0).unwrap();
        assert!(!frame.segments.is_empty());
        assert_eq!(frame.line_width, 1.5);
        assert!(frame.threshold >= 0.2 && frame.threshold <= 0.8);
        assert_eq!(engine.step(16.0).unwrap().frame_index, 2);
    }

    #[test]
    fn same_seed_renders_identical_frames() {
        let mut a = two_image_engine();
        let mut b = two_image_engine();
        for i in 0..5 {
            let t = i as f64 * 16.0;
            assert_eq!(a.step(t).unwrap(), b.step(t).unwrap());
        }
    }

    #[test]
    fn strong_pointer_erases_contours() {
        let mut engine = two_image_engine();
        let config = MetaballConfig {
            pointer_radius: 1.0e4,
            pointer_strength: 2.0,
            ..quiet_config()
        };
        engine.set_config(config).unwrap();
        engine.set_pointer(Some(Vec2::new(32.0, 32.0)));
        assert!(engine.step(0.0).unwrap().is_empty());
        engine.set_pointer(None);
        assert!(!engine.step(16.0).unwrap().is_empty());
    }

    #[test]
    fn transition_completes_after_duration() {
        let mut engine = two_image_engine();
        engine.next_image(0.0).unwrap();
        assert!(engine.is_transitioning());
        assert_eq!(engine.target_image(), 1);

        engine.step(750.0).unwrap();
        assert!(engine.is_transitioning());
        assert_eq!(engine.transition_progress(), 0.5);

        engine.step(1500.0).unwrap();
        assert!(!engine.is_transitioning());
        assert_eq!(engine.current_image(), Some(1));
    }

    #[test]
    fn repeated_request_for_running_target_is_ignored() {
        let mut engine = two_image_engine();
        engine.transition_to(1, 0.0).unwrap();
        engine.step(600.0).unwrap();
        engine.transition_to(1, 600.0).unwrap();
        engine.step(900.0).unwrap();
        // Timing still runs from t = 0.
        assert_eq!(engine.transition_progress(), 0.6);
    }

    #[test]
    fn previous_image_wraps_around() {
        let mut engine = two_image_engine();
        engine.previous_image(0.0).unwrap();
        assert_eq!(engine.target_image(), 1);
        engine.next_image(10.0).unwrap();
        assert_eq!(engine.target_image(), 0);
        assert_eq!(engine.current_image(), Some(1));
    }

    #[test]
    fn transition_to_rejects_out_of_range() {
        let mut engine = two_image_engine();
        assert!(matches!(
            engine.transition_to(5, 0.0),
            Err(EngineError::ImageIndexOutOfRange { index: 5, len: 2 })
        ));
    }

    #[test]
    fn render_only_config_keeps_grid() {
        let mut engine = two_image_engine();
        let before = engine.field().unwrap().clone();
        engine
            .set_config(MetaballConfig {
                line_width: 3.0,
                ..quiet_config()
            })
            .unwrap();
        assert_eq!(engine.field().unwrap(), &before);
        assert_eq!(engine.step(0.0).unwrap().line_width, 3.0);
    }

    #[test]
    fn grid_resolution_change_rebuilds_fields() {
        let mut engine = two_image_engine();
        engine
            .set_config(MetaballConfig {
                grid_resolution: 4.0,
                ..quiet_config()
            })
            .unwrap();
        assert_eq!(engine.grid(), GridSize::new(16, 16).unwrap());
        assert_eq!(engine.field().unwrap().grid(), engine.grid());
    }

    #[test]
    fn invalid_config_is_rejected_and_old_kept() {
        let mut engine = two_image_engine();
        let bad = MetaballConfig {
            falloff_power: -1.0,
            ..quiet_config()
        };
        assert!(engine.set_config(bad).is_err());
        assert_eq!(engine.config(), &quiet_config());
    }

    #[test]
    fn resize_waits_for_quiet_period() {
        let mut engine = two_image_engine();
        engine.request_resize(128.0, 64.0, 0.0);
        engine.step(100.0).unwrap();
        assert_eq!(engine.grid(), GridSize::new(32, 32).unwrap());
        engine.step(300.0).unwrap();
        assert_eq!(engine.grid(), GridSize::new(64, 32).unwrap());
        assert_eq!(engine.field().unwrap().grid(), engine.grid());
    }

    #[test]
    fn resize_mid_transition_settles_on_target() {
        let mut engine = two_image_engine();
        engine.next_image(0.0).unwrap();
        engine.request_resize(96.0, 64.0, 0.0);
        engine.step(400.0).unwrap();
        assert!(!engine.is_transitioning());
        assert_eq!(engine.current_image(), Some(1));
        assert_eq!(engine.field().unwrap().grid(), GridSize::new(48, 32).unwrap());
    }

    #[test]
    fn resize_to_empty_cover_keeps_current_field() {
        let mut engine = two_image_engine();
        engine.request_resize(0.5, 0.5, 0.0);
        assert!(!engine.step(400.0).unwrap().is_empty());
        assert_eq!(engine.viewport(), VIEWPORT);
        assert_eq!(engine.grid(), GridSize::new(32, 32).unwrap());
        assert_eq!(engine.field().unwrap().grid(), engine.grid());
        assert!(engine.transition_to(1, 500.0).is_ok());
    }

    #[test]
    fn zero_width_resize_is_ignored_until_a_usable_one() {
        let mut engine = two_image_engine();
        engine.request_resize(0.0, 64.0, 0.0);
        assert!(engine.step(400.0).is_ok());
        assert_eq!(engine.viewport(), VIEWPORT);

        engine.request_resize(128.0, 64.0, 500.0);
        engine.step(900.0).unwrap();
        assert_eq!(engine.viewport(), (128.0, 64.0));
        assert_eq!(engine.grid(), GridSize::new(64, 32).unwrap());
        assert_eq!(engine.field().unwrap().grid(), engine.grid());
    }

    #[test]
    fn field_appears_once_viewport_grows() {
        let mut engine =
            ImageMetaballs::new(vec![disc_image(64, 16.0)], (0.5, 0.5), quiet_config(), 1)
                .unwrap();
        assert!(engine.field().is_none());
        engine.request_resize(64.0, 64.0, 0.0);
        engine.step(400.0).unwrap();
        assert_eq!(engine.field().unwrap().grid(), GridSize::new(32, 32).unwrap());
    }

    #[test]
    fn config_swap_without_field_still_applies() {
        let empty = SourceImage::new(0, 0, Vec::new()).unwrap();
        let mut engine = ImageMetaballs::new(vec![empty], VIEWPORT, quiet_config(), 1).unwrap();
        let config = MetaballConfig {
            grid_resolution: 4.0,
            ..quiet_config()
        };
        engine.set_config(config).unwrap();
        assert_eq!(engine.config(), &config);
        assert_eq!(engine.grid(), GridSize::new(16, 16).unwrap());
        assert!(engine.field().is_none());
    }

    #[test]
    fn from_json_reads_config_and_seed() {
        let engine = ImageMetaballs::from_json(
            vec![disc_image(16, 4.0)],
            VIEWPORT,
            1,
            &json!({"grid_resolution": 4, "seed": 7}),
        )
        .unwrap();
        assert_eq!(engine.seed(), 7);
        assert_eq!(engine.config().grid_resolution, 4.0);
        assert_eq!(engine.params()["grid_resolution"], 4.0);
    }

    #[test]
    fn param_schema_describes_every_param() {
        let engine = two_image_engine();
        let schema = engine.param_schema();
        for key in engine.params().as_object().unwrap().keys() {
            assert!(schema.get(key).is_some(), "schema missing {key}");
        }
    }

    #[test]
    fn usable_as_dyn_engine() {
        let mut engine: Box<dyn Engine> = Box::new(two_image_engine());
        assert!(engine.step(0.0).is_ok());
        assert!(engine.field().is_some());
    }
}
