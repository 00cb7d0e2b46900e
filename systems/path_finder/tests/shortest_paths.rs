use std::collections::{HashSet, VecDeque};

use proptest::prelude::*;
use skirmish_core::{
    Army, AttackType, BonusTable, Coordinate, Side, Unit, UnitTemplate, GRID_HEIGHT, GRID_WIDTH,
};
use skirmish_system_path_finder::PathFinder;

fn army(side: Side, cells: &[Coordinate]) -> Army {
    let mut army = Army::new(side);
    for (index, cell) in cells.iter().enumerate() {
        let template = UnitTemplate {
            unit_type: format!("Post{index}"),
            health: 5,
            base_attack: 1,
            cost: 1,
            attack_type: AttackType::Melee,
            attack_bonuses: BonusTable::new(),
            defence_bonuses: BonusTable::new(),
        };
        let id = army.recruit(&template).expect("unique type");
        army.get_mut(id).expect("just recruited").set_cell(*cell);
    }
    army
}

/// Hop distance computed independently of the crate under test.
fn reference_distance(start: Coordinate, goal: Coordinate, walls: &HashSet<Coordinate>) -> Option<usize> {
    let mut seen = HashSet::from([start]);
    let mut queue = VecDeque::from([(start, 0)]);

    while let Some((cell, distance)) = queue.pop_front() {
        if cell == goal {
            return Some(distance);
        }
        for dx in -1..=1 {
            for dy in -1..=1 {
                let next = Coordinate::new(cell.x() + dx, cell.y() + dy);
                if (dx, dy) == (0, 0) || !next.is_on_grid() {
                    continue;
                }
                if walls.contains(&next) && next != goal {
                    continue;
                }
                if seen.insert(next) {
                    queue.push_back((next, distance + 1));
                }
            }
        }
    }

    None
}

fn cell_strategy() -> impl Strategy<Value = Coordinate> {
    (0..GRID_WIDTH, 0..GRID_HEIGHT).prop_map(|(x, y)| Coordinate::new(x, y))
}

#[test]
fn two_hop_detour_around_single_obstacle() {
    let duel = army(Side::Player, &[Coordinate::new(0, 0), Coordinate::new(2, 0)]);
    let walls = army(Side::Computer, &[Coordinate::new(1, 0)]);

    let path = PathFinder::new().find_path(&duel.units()[0], &duel.units()[1], walls.units());

    assert_eq!(path.len(), 3);
    assert!(!path.contains(&Coordinate::new(1, 0)));
}

#[test]
fn wall_across_the_battlefield_cuts_every_path() {
    let wall: Vec<_> = (0..GRID_HEIGHT).map(|y| Coordinate::new(13, y)).collect();
    let walls = army(Side::Computer, &wall);
    let duel = army(Side::Player, &[Coordinate::new(1, 4), Coordinate::new(25, 17)]);
    let units: Vec<&Unit> = walls.units().iter().chain(duel.units()).collect();

    let path = PathFinder::new().find_path(&duel.units()[0], &duel.units()[1], units);

    assert!(path.is_empty());
}

proptest! {
    #[test]
    fn path_length_matches_reference_breadth_first_search(
        start in cell_strategy(),
        goal in cell_strategy(),
        obstacles in prop::collection::vec(cell_strategy(), 0..120),
    ) {
        let duel = army(Side::Player, &[start, goal]);
        let walls = army(Side::Computer, &obstacles);
        let blocked: HashSet<Coordinate> = obstacles
            .iter()
            .copied()
            .filter(|cell| *cell != start)
            .collect();

        let path = PathFinder::new().find_path(&duel.units()[0], &duel.units()[1], walls.units());

        match reference_distance(start, goal, &blocked) {
            None => prop_assert!(path.is_empty()),
            Some(distance) => {
                prop_assert_eq!(path.len(), distance + 1);
                prop_assert_eq!(path.first(), Some(&start));
                prop_assert_eq!(path.last(), Some(&goal));
                for step in path.windows(2) {
                    prop_assert_eq!(step[0].chebyshev_distance(step[1]), 1);
                }
                for cell in &path[1..path.len() - 1] {
                    prop_assert!(!blocked.contains(cell));
                }
            }
        }
    }

    #[test]
    fn off_grid_endpoints_never_produce_a_path(
        x in -5..0i32,
        goal in cell_strategy(),
    ) {
        let duel = army(Side::Player, &[Coordinate::new(x, 3), goal]);

        let forward = PathFinder::new().find_path(&duel.units()[0], &duel.units()[1], duel.units());
        let backward = PathFinder::new().find_path(&duel.units()[1], &duel.units()[0], duel.units());

        prop_assert!(forward.is_empty());
        prop_assert!(backward.is_empty());
    }
}
