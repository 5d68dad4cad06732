//! Text rendering of the fog-of-war view.

use std::collections::HashMap;

use delve_core::{Cell, Position, SessionStatus};
use delve_world::query::Frame;

const UNEXPLORED: char = ' ';

/// Draws visible cells with their occupants, remembered cells as bare
/// terrain and everything else blank.
pub(crate) fn render(frame: &Frame<'_>) -> String {
    let occupants: HashMap<Position, char> = frame
        .entities
        .iter()
        .map(|snapshot| (snapshot.position, snapshot.glyph))
        .collect();
    let width = usize::try_from(frame.grid.width()).unwrap_or(0);
    let height = usize::try_from(frame.grid.height()).unwrap_or(0);
    let mut out = String::with_capacity((width + 1) * height);

    for position in frame.grid.positions() {
        let glyph = match frame.grid.get(position) {
            Some(cell) if frame.visible.contains(&position) => occupants
                .get(&position)
                .copied()
                .unwrap_or_else(|| terrain(cell)),
            Some(cell) if frame.explored.contains(&position) => terrain(cell),
            _ => UNEXPLORED,
        };
        out.push(glyph);
        if i64::from(position.x()) + 1 == i64::from(frame.grid.width()) {
            out.push('\n');
        }
    }

    out
}

/// Share of the level's cells the player has seen, in percent.
pub(crate) fn explored_percentage(frame: &Frame<'_>) -> f64 {
    let total = f64::from(frame.grid.width()) * f64::from(frame.grid.height());
    if total == 0.0 {
        return 0.0;
    }
    frame.explored.len() as f64 * 100.0 / total
}

/// One-line status shown under the map.
pub(crate) fn summary(frame: &Frame<'_>, kills: u32) -> String {
    let status = match frame.status {
        SessionStatus::Running => "exploring",
        SessionStatus::Defeated => "defeated",
    };
    let in_sight = frame
        .entities
        .iter()
        .filter(|snapshot| frame.visible.contains(&snapshot.position))
        .count()
        .saturating_sub(1);
    format!(
        "depth {} | explored {:.1}% | {} in sight | {} slain | {}",
        frame.depth.get(),
        explored_percentage(frame),
        in_sight,
        kills,
        status
    )
}

fn terrain(cell: Cell) -> char {
    match cell {
        Cell::Floor => '.',
        Cell::Wall => '#',
        Cell::StairsDown => '>',
        Cell::StairsUp => '<',
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use delve_core::{Grid, SeededRandom, Stats};
    use delve_system_cavegen::{GenerationConfig, LevelSkeleton};
    use delve_world::{query, DungeonConfig, World};

    fn corridor() -> World {
        let mut grid = Grid::filled(12, 3, Cell::Floor);
        grid.enforce_border();
        grid.set(Position::new(5, 1), Cell::Wall);
        grid.set(Position::new(3, 1), Cell::StairsDown);
        let skeleton = LevelSkeleton {
            grid,
            down_stairs: Position::new(3, 1),
            up_stairs: None,
            entry: Position::new(1, 1),
        };
        let config = DungeonConfig {
            generation: GenerationConfig {
                width: 20,
                height: 12,
                ..GenerationConfig::default()
            },
            ..DungeonConfig::default()
        };
        World::from_layout(
            config,
            skeleton,
            &[(Position::new(2, 1), Stats::new(5, 10, 0))],
            Box::new(SeededRandom::new(1)),
        )
        .expect("valid config")
    }

    #[test]
    fn cells_behind_walls_stay_blank() {
        let world = corridor();
        let frame = query::frame(&world).expect("frame");

        let rendered = render(&frame);
        let rows: Vec<&str> = rendered.lines().collect();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1], "#@g>.#      ");
        assert!(rows[0].starts_with("######"));
    }

    #[test]
    fn summary_reports_depth_and_exploration() {
        let world = corridor();
        let frame = query::frame(&world).expect("frame");

        let percentage = explored_percentage(&frame);
        assert!(percentage > 0.0 && percentage < 100.0);

        let line = summary(&frame, 2);
        assert!(line.starts_with("depth 1 | explored "), "{line}");
        assert!(line.contains("1 in sight"), "{line}");
        assert!(line.ends_with("2 slain | exploring"), "{line}");
    }
}
