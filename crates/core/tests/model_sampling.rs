//! Model range index construction and height-based sampling
use ctor::ctor;
use ecoviz_core::{ModelLibrary, ModelRangeIndex, ModelSampler, ModelSetError, TreeModel};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;

#[ctor]
fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

const LIBRARY: &str = r#"[
    {"vueid": 101, "hmin": 0.0,  "hmax": 2.0,  "whratio": 1.4},
    {"vueid": 102, "hmin": 0.0,  "hmax": 5.0,  "whratio": 1.0},
    {"vueid": 103, "hmin": 2.0,  "hmax": 8.0,  "whratio": 0.8},
    {"vueid": 104, "hmin": 5.0,  "hmax": 15.0, "whratio": 0.6},
    {"vueid": 105, "hmin": 8.0,  "hmax": 30.0, "whratio": 0.5},
    {"vueid": 106, "hmin": 12.5, "hmax": 30.0, "whratio": 0.45}
]"#;

fn index() -> ModelRangeIndex {
    ModelLibrary::from_json_reader(LIBRARY.as_bytes())
        .unwrap()
        .build_index()
        .unwrap()
}

fn model(vueid: i32, hmin: f32, hmax: f32) -> TreeModel {
    TreeModel {
        vueid,
        hmin,
        hmax,
        whratio: 1.0,
    }
}

#[test]
fn test_every_model_reachable() {
    let index = index();
    for vueid in 101..=106 {
        assert!(
            index.selections().iter().any(|s| s.contains(&vueid)),
            "model {vueid} is in no selection"
        );
    }
}

#[test]
fn test_breakpoints_partition_library() {
    let index = index();
    assert_eq!(index.ranges(), &[0.0, 2.0, 5.0, 8.0, 12.5, 15.0, 30.0]);
    approx::assert_relative_eq!(index.binsize(), 2.0);
    assert_eq!(index.nbins(), 15);
    assert_eq!(index.samplemap().len(), index.nbins());
    assert!(index.selections().iter().all(|s| !s.is_empty()));
}

#[test]
fn test_sampled_models_cover_height() {
    let index = index();
    let library = ModelLibrary::from_json_reader(LIBRARY.as_bytes()).unwrap();
    let mut rng = StdRng::seed_from_u64(42);

    for step in 0..290 {
        let height = step as f32 * 0.1 + 0.05;
        let (vueid, ratio) = index.sample(height, &mut rng).unwrap();
        let chosen = library
            .models()
            .iter()
            .find(|m| m.vueid == vueid)
            .unwrap();

        assert!(
            chosen.hmin - 0.5 <= height && height <= chosen.hmax + 0.5,
            "model {vueid} [{}, {}] drawn for height {height}",
            chosen.hmin,
            chosen.hmax
        );
        approx::assert_relative_eq!(ratio, chosen.whratio / 2.0);
    }
}

#[test]
fn test_same_seed_same_draws() {
    let index = index();
    let heights: Vec<f32> = (0..100).map(|i| (i % 29) as f32 + 0.5).collect();

    let draw = |seed: u64| -> Vec<i32> {
        let mut sampler = ModelSampler::new(&index, StdRng::seed_from_u64(seed));
        heights.iter().map(|&h| sampler.sample(h).unwrap().0).collect()
    };

    assert_eq!(draw(7), draw(7));
}

#[test]
fn test_concurrent_samplers_share_index() {
    let index = index();
    let counts: Vec<usize> = (0..8_u64)
        .into_par_iter()
        .map(|seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            (0..500)
                .filter(|_| index.sample(9.0, &mut rng).unwrap().0 == 104)
                .count()
        })
        .collect();

    // Selection for 9.0 is {104, 105}; each worker should see both
    assert!(counts.iter().all(|&c| c > 0 && c < 500));
}

#[test]
fn test_height_outside_library() {
    let index = index();
    let mut rng = StdRng::seed_from_u64(0);

    assert!(matches!(
        index.sample(30.5, &mut rng),
        Err(ModelSetError::HeightOutOfRange { .. })
    ));
    assert!(matches!(
        index.sample(-1.0, &mut rng),
        Err(ModelSetError::HeightOutOfRange { .. })
    ));
}

#[test]
fn test_two_adjacent_models() {
    let index = ModelRangeIndex::build(&[model(1, 0.0, 10.0), model(2, 10.0, 20.0)]).unwrap();
    let mut rng = StdRng::seed_from_u64(5);

    assert_eq!(index.samplemap(), &[0, 1]);
    assert_eq!(index.sample(5.0, &mut rng).unwrap().0, 1);
    assert_eq!(index.sample(15.0, &mut rng).unwrap().0, 2);
    assert!(matches!(
        index.sample(25.0, &mut rng),
        Err(ModelSetError::HeightOutOfRange { min, max, .. }) if (min, max) == (0.0, 20.0)
    ));
}

#[test]
fn test_overlap_region_draws_both() {
    let index = ModelRangeIndex::build(&[model(1, 0.0, 10.0), model(2, 8.0, 20.0)]).unwrap();
    let mut rng = StdRng::seed_from_u64(99);

    let draws: Vec<i32> = (0..100).map(|_| index.sample(9.0, &mut rng).unwrap().0).collect();
    assert!(draws.contains(&1) && draws.contains(&2));
}

#[test]
fn test_overlap_draws_repeat_for_seed() {
    let index = ModelRangeIndex::build(&[model(1, 0.0, 10.0), model(2, 8.0, 20.0)]).unwrap();
    assert_eq!(index.select(9.0).unwrap(), &[1, 2]);

    let draw = |seed: u64| -> Vec<i32> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..50).map(|_| index.sample(9.0, &mut rng).unwrap().0).collect()
    };
    assert_eq!(draw(2024), draw(2024));
}

#[test]
fn test_narrow_model_fails_build() {
    assert!(matches!(
        ModelRangeIndex::build(&[model(1, 0.0, 10.0), model(2, 5.0, 5.005)]),
        Err(ModelSetError::UncoveredModel { vueid: 2, .. })
    ));
}

#[test]
fn test_invalid_libraries() {
    assert!(matches!(
        ModelLibrary::new().build_index(),
        Err(ModelSetError::EmptyLibrary)
    ));
    assert!(matches!(
        ModelRangeIndex::build(&[model(3, 4.0, f32::NAN)]),
        Err(ModelSetError::InvalidRange { vueid: 3, .. })
    ));
}
