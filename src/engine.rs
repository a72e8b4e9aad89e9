use std::sync::Arc;

use crate::assets::source::SourceStore;
use crate::cache::resample::{DEFAULT_RESAMPLE_CACHE_CAPACITY, SharedResampleCache};
use crate::compose::atlas::AtlasCanvas;
use crate::compose::fragment::{FragmentCompositor, FragmentImage};
use crate::flood;
use crate::foundation::core::{Point, RgbaImage};
use crate::foundation::error::{TesseraError, TesseraResult};
use crate::project::file::AtlasProject;
use crate::project::model::{AtlasConfig, Mask, Texture, validate_density};
use crate::resample::{FilterMode, ResampleFilter};

/// Environment variable overriding [`EngineOpts::resample_cache_capacity`].
pub const RESAMPLE_CACHE_CAPACITY_ENV: &str = "TESSERA_RESAMPLE_CACHE_CAPACITY";

/// Process-level engine tuning.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EngineOpts {
    /// Number of resampled crops kept in the LRU cache.
    pub resample_cache_capacity: usize,
}

impl Default for EngineOpts {
    fn default() -> Self {
        Self {
            resample_cache_capacity: DEFAULT_RESAMPLE_CACHE_CAPACITY,
        }
    }
}

impl EngineOpts {
    /// Defaults, with `TESSERA_RESAMPLE_CACHE_CAPACITY` applied when it holds a positive integer.
    pub fn from_env() -> Self {
        Self::default().with_capacity_override(std::env::var(RESAMPLE_CACHE_CAPACITY_ENV).ok())
    }

    pub(crate) fn with_capacity_override(mut self, raw: Option<String>) -> Self {
        if let Some(n) = raw
            .as_deref()
            .and_then(|v| v.trim().parse::<usize>().ok())
            .filter(|&n| n > 0)
        {
            self.resample_cache_capacity = n;
        }
        self
    }
}

/// A fragment that was rebuilt successfully.
#[derive(Clone, Debug, PartialEq)]
pub struct BuiltFragment {
    /// Index into [`AtlasProject::fragments`].
    pub index: usize,
    /// Top-left corner on the atlas.
    pub position: Point,
    /// Finished fragment pixels.
    pub image: FragmentImage,
}

/// A fragment that could not be rebuilt.
#[derive(Debug)]
pub struct FragmentFailure {
    /// Index into [`AtlasProject::fragments`].
    pub index: usize,
    /// Why it was skipped.
    pub error: TesseraError,
}

/// Outcome of [`AtlasEngine::rebuild_fragments`].
#[derive(Debug, Default)]
pub struct RebuildReport {
    /// Successfully built fragments, in project order.
    pub built: Vec<BuiltFragment>,
    /// Per-fragment failures; the batch continues past each one.
    pub failed: Vec<FragmentFailure>,
    /// `true` when the cancellation predicate stopped the batch early.
    pub cancelled: bool,
}

impl RebuildReport {
    /// Number of fragments examined (built or failed).
    pub fn processed(&self) -> usize {
        self.built.len() + self.failed.len()
    }
}

/// Composited atlas plus the rebuild that produced it.
#[derive(Debug)]
pub struct AtlasRender {
    /// Canvas pixels, straight RGBA8.
    pub image: RgbaImage,
    /// Per-fragment outcome.
    pub report: RebuildReport,
}

/// Owns the active [`AtlasConfig`] and the fragment compositor.
///
/// Settings changes go through [`AtlasEngine::set_density`] / [`AtlasEngine::set_filter`], which
/// validate first and clear the resample cache on success.
#[derive(Debug)]
pub struct AtlasEngine {
    config: AtlasConfig,
    compositor: FragmentCompositor,
}

impl AtlasEngine {
    /// Create an engine over `sources` with validated `config`.
    pub fn new(
        sources: Arc<dyn SourceStore>,
        config: AtlasConfig,
        opts: EngineOpts,
    ) -> TesseraResult<Self> {
        config.validate()?;
        let cache = SharedResampleCache::with_capacity(opts.resample_cache_capacity)?;
        Ok(Self {
            config,
            compositor: FragmentCompositor::new(sources, cache),
        })
    }

    /// Create an engine configured from `project`'s persisted settings.
    pub fn for_project(
        sources: Arc<dyn SourceStore>,
        project: &AtlasProject,
        opts: EngineOpts,
    ) -> TesseraResult<Self> {
        Self::new(sources, project.config(), opts)
    }

    /// Active settings.
    pub fn config(&self) -> &AtlasConfig {
        &self.config
    }

    /// Shared resample cache.
    pub fn cache(&self) -> &SharedResampleCache {
        self.compositor.cache()
    }

    /// Underlying compositor.
    pub fn compositor(&self) -> &FragmentCompositor {
        &self.compositor
    }

    /// Change the atlas density (pixels per meter); clears the cache.
    #[tracing::instrument(skip(self))]
    pub fn set_density(&mut self, density: f64) -> TesseraResult<()> {
        validate_density(density)?;
        self.config.density = density;
        self.cache().clear();
        Ok(())
    }

    /// Change the canvas side length; fragments are unaffected, so the cache is kept.
    pub fn set_canvas_size(&mut self, canvas_size: u32) -> TesseraResult<()> {
        if canvas_size == 0 {
            return Err(TesseraError::validation("canvas_size must be > 0"));
        }
        self.config.canvas_size = canvas_size;
        Ok(())
    }

    /// Switch the resampling filter; clears the cache.
    ///
    /// Rejected parameters leave the previous filter active.
    #[tracing::instrument(skip(self))]
    pub fn set_filter(
        &mut self,
        mode: FilterMode,
        beta: Option<f64>,
        radius: Option<i64>,
    ) -> TesseraResult<()> {
        let filter = ResampleFilter::from_mode(mode, beta, radius)?;
        self.apply_filter(filter)
    }

    /// [`AtlasEngine::set_filter`] for an already parameterized filter.
    pub fn apply_filter(&mut self, filter: ResampleFilter) -> TesseraResult<()> {
        filter.validate()?;
        self.config.filter = filter;
        self.cache().clear();
        Ok(())
    }

    /// Restore density, canvas size, and filter from `project`; clears the cache.
    pub fn apply_project_settings(&mut self, project: &AtlasProject) -> TesseraResult<()> {
        let config = project.config();
        config.validate()?;
        self.config = config;
        self.cache().clear();
        Ok(())
    }

    /// Build one fragment bitmap under the active settings.
    pub fn build_fragment(&self, texture: &Texture, mask: &Mask) -> TesseraResult<FragmentImage> {
        self.compositor.build_fragment(texture, mask, &self.config)
    }

    /// Flood color into transparent texels of a finished atlas.
    pub fn flood(&self, atlas: &RgbaImage, alpha_threshold: u8, levels: i32) -> RgbaImage {
        flood::flood(atlas, alpha_threshold, levels)
    }

    /// Rebuild every fragment of `project` in order under the active settings.
    ///
    /// `cancel` is polled before each fragment; returning `true` stops the batch. Failures are
    /// logged and recorded, and the batch continues.
    #[tracing::instrument(skip_all, fields(project = %project.name, fragments = project.fragments.len()))]
    pub fn rebuild_fragments<C>(&self, project: &AtlasProject, mut cancel: C) -> RebuildReport
    where
        C: FnMut() -> bool,
    {
        let mut report = RebuildReport::default();
        for (index, fragment) in project.fragments.iter().enumerate() {
            if cancel() {
                tracing::debug!(index, "rebuild cancelled");
                report.cancelled = true;
                break;
            }
            match self.build_project_fragment(project, index) {
                Ok(image) => report.built.push(BuiltFragment {
                    index,
                    position: fragment.position,
                    image,
                }),
                Err(error) => {
                    tracing::warn!(
                        index,
                        texture = %fragment.texture.display(),
                        mask = fragment.mask.0,
                        error = %error,
                        "skipping fragment"
                    );
                    report.failed.push(FragmentFailure { index, error });
                }
            }
        }
        report
    }

    /// Rebuild `project` and composite the successes onto a fresh canvas in fragment order.
    #[tracing::instrument(skip_all, fields(project = %project.name, canvas = self.config.canvas_size))]
    pub fn render_atlas<C>(&self, project: &AtlasProject, cancel: C) -> TesseraResult<AtlasRender>
    where
        C: FnMut() -> bool,
    {
        let mut canvas = AtlasCanvas::new(self.config.canvas_size)?;
        let report = self.rebuild_fragments(project, cancel);
        for b in &report.built {
            canvas.place(&b.image, b.position);
        }
        Ok(AtlasRender {
            image: canvas.into_image(),
            report,
        })
    }

    fn build_project_fragment(
        &self,
        project: &AtlasProject,
        index: usize,
    ) -> TesseraResult<FragmentImage> {
        let fragment = project
            .fragments
            .get(index)
            .ok_or_else(|| TesseraError::validation(format!("no fragment {index}")))?;
        let entry = project.texture(&fragment.texture).ok_or_else(|| {
            TesseraError::validation(format!(
                "fragment {index} references unknown texture '{}'",
                fragment.texture.display()
            ))
        })?;
        let mask = entry.mask(fragment.mask).ok_or_else(|| {
            TesseraError::validation(format!(
                "fragment {index} references missing mask {}",
                fragment.mask.0
            ))
        })?;
        self.build_fragment(&Texture::from(entry), mask)
    }
}

#[cfg(test)]
#[path = "../tests/unit/engine.rs"]
mod tests;
