use super::*;

use crate::assets::source::MemorySourceStore;

fn square(side: f64) -> Vec<Point> {
    vec![
        Point::new(0.0, 0.0),
        Point::new(side, 0.0),
        Point::new(side, side),
        Point::new(0.0, side),
    ]
}

fn engine_with(store: MemorySourceStore) -> AtlasEngine {
    let config = AtlasConfig {
        density: 8.0,
        canvas_size: 32,
        filter: ResampleFilter::Nearest,
    };
    AtlasEngine::new(Arc::new(store), config, EngineOpts::default()).unwrap()
}

fn blue_store() -> MemorySourceStore {
    MemorySourceStore::new().with(
        "blue.png",
        RgbaImage::from_pixel(8, 8, image::Rgba([0, 0, 255, 255])),
    )
}

#[test]
fn opts_default_and_env_override_parsing() {
    assert_eq!(EngineOpts::default().resample_cache_capacity, 32);
    let o = EngineOpts::default();
    assert_eq!(
        o.with_capacity_override(Some("5".into()))
            .resample_cache_capacity,
        5
    );
    assert_eq!(
        o.with_capacity_override(Some("0".into()))
            .resample_cache_capacity,
        32
    );
    assert_eq!(
        o.with_capacity_override(Some("lots".into()))
            .resample_cache_capacity,
        32
    );
    assert_eq!(o.with_capacity_override(None).resample_cache_capacity, 32);
}

#[test]
fn set_density_validates_and_clears_cache() {
    let mut engine = engine_with(blue_store());
    let texture = Texture::open(&blue_store(), "blue.png", 1.0).unwrap();
    let mask = Mask::new(crate::project::model::MaskId(0), square(8.0), 1.0).unwrap();
    engine.build_fragment(&texture, &mask).unwrap();
    assert_eq!(engine.cache().len(), 1);

    assert!(matches!(
        engine.set_density(0.0),
        Err(TesseraError::Validation(_))
    ));
    assert_eq!(engine.config().density, 8.0);
    assert_eq!(engine.cache().len(), 1);

    engine.set_density(4.0).unwrap();
    assert!(engine.cache().is_empty());
    let frag = engine.build_fragment(&texture, &mask).unwrap();
    assert_eq!((frag.width(), frag.height()), (4, 4));
}

#[test]
fn rejected_filter_keeps_previous_one() {
    let mut engine = engine_with(blue_store());
    engine
        .set_filter(FilterMode::Kaiser, Some(2.0), Some(2))
        .unwrap();
    assert_eq!(
        engine.config().filter,
        ResampleFilter::Kaiser {
            beta: 2.0,
            radius: 2
        }
    );

    for (beta, radius) in [(Some(-1.0), Some(2)), (Some(f64::NAN), None), (None, Some(0))] {
        assert!(matches!(
            engine.set_filter(FilterMode::Kaiser, beta, radius),
            Err(TesseraError::InvalidFilterParameters(_))
        ));
    }
    assert_eq!(engine.config().filter.mode(), FilterMode::Kaiser);

    engine.set_filter(FilterMode::Lanczos, None, None).unwrap();
    assert_eq!(engine.config().filter, ResampleFilter::Lanczos);
}

#[test]
fn rebuild_continues_past_failures() {
    let mut project = AtlasProject::new("mixed");
    let good = project.apply_mask("blue.png", square(8.0), 1.0).unwrap();
    let missing = project.apply_mask("gone.png", square(8.0), 1.0).unwrap();
    project
        .add_fragment("blue.png", good, Point::new(0.0, 0.0))
        .unwrap();
    project
        .add_fragment("gone.png", missing, Point::new(8.0, 0.0))
        .unwrap();
    project
        .add_fragment("blue.png", good, Point::new(16.0, 0.0))
        .unwrap();

    let engine = engine_with(blue_store());
    let report = engine.rebuild_fragments(&project, || false);
    assert!(!report.cancelled);
    assert_eq!(report.processed(), 3);
    assert_eq!(
        report.built.iter().map(|b| b.index).collect::<Vec<_>>(),
        vec![0, 2]
    );
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].index, 1);
    assert!(report.failed[0].error.is_skippable());
}

#[test]
fn rebuild_honors_cancellation_between_fragments() {
    let mut project = AtlasProject::new("cancel");
    let id = project.apply_mask("blue.png", square(8.0), 1.0).unwrap();
    for i in 0..4 {
        project
            .add_fragment("blue.png", id, Point::new(f64::from(i) * 8.0, 0.0))
            .unwrap();
    }

    let engine = engine_with(blue_store());
    let mut polls = 0;
    let report = engine.rebuild_fragments(&project, || {
        polls += 1;
        polls > 2
    });
    assert!(report.cancelled);
    assert_eq!(report.built.len(), 2);
    assert!(report.failed.is_empty());
}

#[test]
fn render_atlas_places_fragments_at_positions() {
    let mut project = AtlasProject::new("render");
    let id = project.apply_mask("blue.png", square(8.0), 1.0).unwrap();
    project
        .add_fragment("blue.png", id, Point::new(4.0, 20.0))
        .unwrap();

    let engine = engine_with(blue_store());
    let render = engine.render_atlas(&project, || false).unwrap();
    assert_eq!(render.image.dimensions(), (32, 32));
    assert_eq!(render.image.get_pixel(0, 0).0, [0, 0, 0, 0]);
    assert_eq!(render.image.get_pixel(7, 23).0, [0, 0, 255, 255]);
    assert_eq!(render.image.get_pixel(12, 23).0, [0, 0, 0, 0]);
    assert_eq!(render.report.built.len(), 1);
}

#[test]
fn project_settings_are_restored() {
    let mut engine = engine_with(blue_store());
    let mut project = AtlasProject::new("settings");
    project.density = 300.0;
    project.canvas_size = 64;
    project.filter = ResampleFilter::Kaiser {
        beta: 5.0,
        radius: 3,
    };
    engine.apply_project_settings(&project).unwrap();
    assert_eq!(*engine.config(), project.config());

    project.density = f64::INFINITY;
    assert!(engine.apply_project_settings(&project).is_err());
    assert_eq!(engine.config().density, 300.0);
}

struct CountingStore {
    inner: MemorySourceStore,
    loads: std::sync::atomic::AtomicUsize,
}

impl SourceStore for CountingStore {
    fn load(&self, path: &std::path::Path) -> TesseraResult<Arc<RgbaImage>> {
        self.loads.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        self.inner.load(path)
    }
}

#[test]
fn cached_rebuild_does_not_reload_sources() {
    let mut project = AtlasProject::new("warm");
    let id = project.apply_mask("blue.png", square(8.0), 1.0).unwrap();
    for i in 0..3 {
        project
            .add_fragment("blue.png", id, Point::new(f64::from(i) * 8.0, 0.0))
            .unwrap();
    }

    let store = Arc::new(CountingStore {
        inner: blue_store(),
        loads: Default::default(),
    });
    let config = AtlasConfig {
        density: 8.0,
        canvas_size: 32,
        filter: ResampleFilter::Nearest,
    };
    let engine = AtlasEngine::new(store.clone(), config, EngineOpts::default()).unwrap();
    let loads = || store.loads.load(std::sync::atomic::Ordering::SeqCst);

    let first = engine.rebuild_fragments(&project, || false);
    assert_eq!(first.built.len(), 3);
    assert_eq!(loads(), 1);

    let second = engine.rebuild_fragments(&project, || false);
    assert_eq!(second.built.len(), 3);
    assert_eq!(loads(), 1);
}
