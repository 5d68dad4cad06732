use delve_core::{Cell, Depth, Grid, SeededRandom, RNG_STREAM_GENERATION};
use delve_system_cavegen::{
    build_level, connected_regions, place_stairs_and_spawn, prune_to_largest, GenerationConfig,
    GridGenerator,
};
use proptest::prelude::*;

fn border_is_wall(grid: &Grid) -> bool {
    grid.positions()
        .filter(|position| grid.is_border(*position))
        .all(|position| grid.get(position) == Some(Cell::Wall))
}

fn passable_regions(grid: &Grid) -> usize {
    let mut flattened = grid.clone();
    for cell in [Cell::StairsDown, Cell::StairsUp] {
        for position in grid.positions_of(cell) {
            flattened.set(position, Cell::Floor);
        }
    }
    connected_regions(&flattened, Cell::Floor).len()
}

#[test]
fn reference_scenario_is_deterministic() {
    let generator = GridGenerator::new(GenerationConfig::default()).expect("default config");

    let mut first_rng = SeededRandom::for_stream(0x5eed, RNG_STREAM_GENERATION);
    let mut second_rng = SeededRandom::for_stream(0x5eed, RNG_STREAM_GENERATION);
    let mut first = generator.generate(&mut first_rng);
    let mut second = generator.generate(&mut second_rng);
    assert_eq!(first, second, "generation diverged between runs");

    let _ = prune_to_largest(&mut first);
    let _ = prune_to_largest(&mut second);
    assert_eq!(first, second, "pruning diverged between runs");
    assert_eq!(first.width(), 100);
    assert_eq!(first.height(), 80);
    assert_eq!(connected_regions(&first, Cell::Floor).len(), 1);
    assert_eq!(first.count(Cell::Floor), second.count(Cell::Floor));
}

#[test]
fn full_pipeline_places_stairs_per_depth() {
    let generator = GridGenerator::new(GenerationConfig::default()).expect("default config");
    let mut rng = SeededRandom::new(99);

    let first = build_level(&generator, Depth::FIRST, &mut rng);
    assert_eq!(first.grid.count(Cell::StairsDown), 1);
    assert_eq!(first.grid.count(Cell::StairsUp), 0);
    assert_eq!(first.grid.get(first.entry), Some(Cell::Floor));

    let second = build_level(&generator, Depth::new(2), &mut rng);
    assert_eq!(second.grid.count(Cell::StairsDown), 1);
    assert_eq!(second.grid.count(Cell::StairsUp), 1);
    assert_eq!(second.up_stairs, Some(second.entry));
    assert_eq!(passable_regions(&second.grid), 1);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn generated_levels_are_walled_and_connected(
        seed in any::<u64>(),
        width in 3u32..40,
        height in 3u32..40,
        fill_probability in 0.05f64..0.7,
        smoothing_iterations in 0u32..6,
        depth in 1u32..4,
    ) {
        let config = GenerationConfig { width, height, fill_probability, smoothing_iterations };
        let generator = GridGenerator::new(config).expect("valid config");
        let mut rng = SeededRandom::new(seed);

        let mut grid = generator.generate(&mut rng);
        prop_assert!(border_is_wall(&grid));

        let _ = prune_to_largest(&mut grid);
        prop_assert!(border_is_wall(&grid));
        prop_assert!(connected_regions(&grid, Cell::Floor).len() <= 1);

        let roomy = width > 3 || height > 3;
        let skeleton = place_stairs_and_spawn(grid, Depth::new(depth), &mut rng);
        prop_assert!(border_is_wall(&skeleton.grid));
        prop_assert_eq!(skeleton.grid.count(Cell::StairsDown), 1);
        prop_assert_eq!(
            skeleton.grid.get(skeleton.down_stairs),
            Some(Cell::StairsDown)
        );
        if roomy {
            prop_assert_eq!(skeleton.grid.count(Cell::StairsUp), usize::from(depth > 1));
        }
        if depth == 1 {
            prop_assert_eq!(skeleton.grid.count(Cell::StairsUp), 0);
            prop_assert!(skeleton.up_stairs.is_none());
        }
    }
}
