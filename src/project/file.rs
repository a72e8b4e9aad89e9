use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::foundation::core::Point;
use crate::foundation::error::{TesseraError, TesseraResult};
use crate::project::model::{
    AtlasConfig, DEFAULT_CANVAS_SIZE, DEFAULT_DENSITY, Fragment, Mask, MaskId, TextureEntry,
};
use crate::resample::ResampleFilter;

/// Atlas project: settings, textures with their masks, and placed fragments.
///
/// This is everything needed to rebuild every fragment bitmap from the source images.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AtlasProject {
    /// Display name.
    #[serde(default = "default_name")]
    pub name: String,
    /// Directory texture paths resolve against; defaults to the project file's directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_path: Option<PathBuf>,
    /// Square canvas side in pixels.
    #[serde(default = "default_canvas_size")]
    pub canvas_size: u32,
    /// Pixels per meter.
    #[serde(default = "default_density")]
    pub density: f64,
    /// Resampling filter used for every fragment.
    #[serde(default)]
    pub filter: ResampleFilter,
    /// Source textures and their masks.
    #[serde(default)]
    pub textures: Vec<TextureEntry>,
    /// Placed fragments, composited in order.
    #[serde(default)]
    pub fragments: Vec<Fragment>,
}

fn default_name() -> String {
    "New Project".to_owned()
}

fn default_canvas_size() -> u32 {
    DEFAULT_CANVAS_SIZE
}

fn default_density() -> f64 {
    DEFAULT_DENSITY
}

impl Default for AtlasProject {
    fn default() -> Self {
        Self::new(default_name())
    }
}

impl AtlasProject {
    /// Empty project with default settings.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_path: None,
            canvas_size: DEFAULT_CANVAS_SIZE,
            density: DEFAULT_DENSITY,
            filter: ResampleFilter::default(),
            textures: Vec::new(),
            fragments: Vec::new(),
        }
    }

    /// Parse and validate a project document.
    pub fn from_json_str(s: &str) -> TesseraResult<Self> {
        let project: Self = serde_json::from_str(s)
            .map_err(|e| TesseraError::serde(format!("parse project JSON: {e}")))?;
        project.validate()?;
        Ok(project)
    }

    /// Pretty-printed JSON document.
    pub fn to_json_string(&self) -> TesseraResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| TesseraError::serde(format!("serialize project JSON: {e}")))
    }

    /// Read and validate a project file.
    pub fn load(path: &Path) -> TesseraResult<Self> {
        let f = File::open(path).with_context(|| format!("open project '{}'", path.display()))?;
        let project: Self = serde_json::from_reader(BufReader::new(f)).map_err(|e| {
            TesseraError::serde(format!("parse project '{}': {e}", path.display()))
        })?;
        project.validate()?;
        tracing::debug!(
            path = %path.display(),
            textures = project.textures.len(),
            fragments = project.fragments.len(),
            "loaded project"
        );
        Ok(project)
    }

    /// Write the project as pretty JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> TesseraResult<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create project dir '{}'", parent.display()))?;
        }
        let f =
            File::create(path).with_context(|| format!("create project '{}'", path.display()))?;
        serde_json::to_writer_pretty(BufWriter::new(f), self).map_err(|e| {
            TesseraError::serde(format!("write project '{}': {e}", path.display()))
        })
    }

    /// Directory texture paths resolve against when the project lives at `project_file`.
    pub fn source_root(&self, project_file: &Path) -> PathBuf {
        match &self.base_path {
            Some(p) => p.clone(),
            None => project_file
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_default(),
        }
    }

    /// Settings passed to every compositing call.
    pub fn config(&self) -> AtlasConfig {
        AtlasConfig {
            density: self.density,
            canvas_size: self.canvas_size,
            filter: self.filter,
        }
    }

    /// Check settings, masks, and fragment references.
    pub fn validate(&self) -> TesseraResult<()> {
        self.config().validate()?;

        let mut paths = HashSet::new();
        for t in &self.textures {
            if !paths.insert(t.path.as_path()) {
                return Err(TesseraError::validation(format!(
                    "duplicate texture '{}'",
                    t.path.display()
                )));
            }
            if !t.real_width_meters.is_finite() || t.real_width_meters <= 0.0 {
                return Err(TesseraError::validation(format!(
                    "texture '{}' real_width_meters must be > 0",
                    t.path.display()
                )));
            }
            let mut ids = HashSet::new();
            for m in &t.masks {
                m.validate()?;
                if !ids.insert(m.id) {
                    return Err(TesseraError::validation(format!(
                        "texture '{}' has duplicate mask id {}",
                        t.path.display(),
                        m.id.0
                    )));
                }
            }
        }

        for (i, f) in self.fragments.iter().enumerate() {
            if self.mask(&f.texture, f.mask).is_none() {
                return Err(TesseraError::validation(format!(
                    "fragment {i} references missing mask {} of '{}'",
                    f.mask.0,
                    f.texture.display()
                )));
            }
            if !(f.position.x.is_finite() && f.position.y.is_finite()) {
                return Err(TesseraError::validation(format!(
                    "fragment {i} has a non-finite position"
                )));
            }
        }
        Ok(())
    }

    /// Texture entry for `path`.
    pub fn texture(&self, path: &Path) -> Option<&TextureEntry> {
        self.textures.iter().find(|t| t.matches(path))
    }

    /// Mask `id` of texture `path`.
    pub fn mask(&self, path: &Path, id: MaskId) -> Option<&Mask> {
        self.texture(path).and_then(|t| t.mask(id))
    }

    /// Carve a new mask out of `texture_path`, registering the texture on first use.
    pub fn apply_mask(
        &mut self,
        texture_path: impl Into<PathBuf>,
        points: Vec<Point>,
        real_width: f64,
    ) -> TesseraResult<MaskId> {
        let texture_path = texture_path.into();
        let idx = match self.textures.iter().position(|t| t.matches(&texture_path)) {
            Some(i) => i,
            None => {
                self.textures
                    .push(TextureEntry::new(texture_path.clone(), 1.0));
                self.textures.len() - 1
            }
        };
        let entry = &mut self.textures[idx];
        let id = entry.next_mask_id();
        entry.masks.push(Mask::new(id, points, real_width)?);
        Ok(id)
    }

    /// Replace the polygon and width of an existing mask.
    pub fn update_mask(
        &mut self,
        texture_path: &Path,
        id: MaskId,
        points: Vec<Point>,
        real_width: f64,
    ) -> TesseraResult<()> {
        let slot = self
            .textures
            .iter_mut()
            .find(|t| t.matches(texture_path))
            .and_then(|t| t.masks.iter_mut().find(|m| m.id == id))
            .ok_or_else(|| {
                TesseraError::validation(format!(
                    "no mask {} on '{}'",
                    id.0,
                    texture_path.display()
                ))
            })?;
        *slot = Mask::new(id, points, real_width)?;
        Ok(())
    }

    /// Place mask `mask` of `texture_path` at `position`; returns the fragment index.
    pub fn add_fragment(
        &mut self,
        texture_path: impl Into<PathBuf>,
        mask: MaskId,
        position: Point,
    ) -> TesseraResult<usize> {
        let texture_path = texture_path.into();
        if self.mask(&texture_path, mask).is_none() {
            return Err(TesseraError::validation(format!(
                "no mask {} on '{}'",
                mask.0,
                texture_path.display()
            )));
        }
        self.fragments
            .push(Fragment::new(texture_path, mask, position));
        Ok(self.fragments.len() - 1)
    }

    /// Remove fragment `index`, if present.
    pub fn remove_fragment(&mut self, index: usize) -> Option<Fragment> {
        (index < self.fragments.len()).then(|| self.fragments.remove(index))
    }

    /// Drop every texture, mask, and fragment; settings are kept.
    pub fn clear(&mut self) {
        self.textures.clear();
        self.fragments.clear();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/project/file.rs"]
mod tests;
