//! Resolution must not depend on the order in which submissions arrive.

use proptest::prelude::*;

use adjudicator::board::{
    AdjacencyGraph, BoardState, Coast, Location, Order, OrderUnit, Phase, Power, ProvinceId, Season,
    Terrain, Unit,
};
use adjudicator::resolve::{apply_movement, resolve_movement};
use adjudicator::{GameConfig, GameState};

fn map() -> &'static AdjacencyGraph {
    AdjacencyGraph::standard()
}

fn unit_ref(unit: &Unit) -> OrderUnit {
    OrderUnit {
        unit_type: unit.unit_type,
        location: unit.location(),
    }
}

/// Derives one order per unit from a byte of entropy: a hold, a move to an
/// adjacent province, a hold or move support for a neighbouring unit, or a
/// convoy step. Fleets at sea convoy a neighbouring army; armies ask to be
/// carried by a neighbouring fleet.
fn orders_from_choices(state: &BoardState, choices: &[u8]) -> Vec<(Order, Power)> {
    let map = map();
    state
        .units()
        .zip(choices.iter().cycle())
        .map(|(unit, &choice)| {
            let me = unit_ref(unit);
            let reachable = map.provinces_adjacent_to(unit.province, unit.coast, unit.is_fleet());
            let pick = reachable[(choice as usize / 8) % reachable.len()];
            let order = match choice % 8 {
                1 | 2 => Order::move_to(me, Location::new(pick)),
                3 => match state.unit_at(pick) {
                    Some(neighbour) => Order::SupportHold {
                        unit: me,
                        supported: unit_ref(neighbour),
                    },
                    None => Order::Hold { unit: me },
                },
                4 | 5 => support_move(state, unit, pick).unwrap_or(Order::Hold { unit: me }),
                6 | 7 => convoy_step(state, unit, &reachable).unwrap_or(Order::Hold { unit: me }),
                _ => Order::Hold { unit: me },
            };
            (order, unit.power)
        })
        .collect()
}

/// Supports the unit at `pick` into a province both units can reach.
fn support_move(state: &BoardState, unit: &Unit, pick: ProvinceId) -> Option<Order> {
    let map = map();
    let neighbour = state.unit_at(pick)?;
    let mine = map.provinces_adjacent_to(unit.province, unit.coast, unit.is_fleet());
    let dest = map
        .provinces_adjacent_to(neighbour.province, neighbour.coast, neighbour.is_fleet())
        .into_iter()
        .find(|d| *d != unit.province && mine.contains(d))?;
    Some(Order::SupportMove {
        unit: unit_ref(unit),
        supported: unit_ref(neighbour),
        dest: Location::new(dest),
    })
}

/// A convoy order for a fleet at sea, or a convoyed move for a coastal army.
fn convoy_step(state: &BoardState, unit: &Unit, reachable: &[ProvinceId]) -> Option<Order> {
    let map = map();
    let coastal = |p: &ProvinceId| map.info(*p).terrain == Terrain::Coastal;
    if unit.is_fleet() {
        if map.info(unit.province).terrain != Terrain::Sea {
            return None;
        }
        let army = reachable
            .iter()
            .filter_map(|p| state.unit_at(*p))
            .find(|u| !u.is_fleet())?;
        let dest = reachable
            .iter()
            .copied()
            .filter(coastal)
            .find(|p| *p != army.province)?;
        return Some(Order::Convoy {
            unit: unit_ref(unit),
            convoyed_from: Location::new(army.province),
            convoyed_to: Location::new(dest),
        });
    }
    let fleet = map
        .provinces_adjacent_to(unit.province, unit.coast, true)
        .into_iter()
        .filter_map(|p| state.unit_at(p))
        .find(|u| u.is_fleet() && map.info(u.province).terrain == Terrain::Sea)?;
    let dest = map
        .provinces_adjacent_to(fleet.province, fleet.coast, true)
        .into_iter()
        .filter(coastal)
        .find(|p| *p != unit.province)?;
    Some(Order::Move {
        unit: unit_ref(unit),
        dest: Location::new(dest),
        via_convoy: true,
    })
}

fn opening() -> BoardState {
    GameState::standard(GameConfig::default()).board
}

/// A crowded Channel with fleets at sea, so convoys and cut supports come up.
fn channel() -> BoardState {
    let map = map();
    let p = |abbr: &str| map.province(abbr).unwrap();
    let mut state = BoardState::empty(1901, Season::Spring, Phase::Movement);
    for (power, abbr) in [
        (Power::England, "lon"),
        (Power::England, "yor"),
        (Power::France, "bre"),
        (Power::France, "pic"),
        (Power::Germany, "hol"),
        (Power::Germany, "ruh"),
    ] {
        state.place_unit(Unit::army(power, p(abbr)));
    }
    for (power, abbr) in [
        (Power::England, "nth"),
        (Power::England, "eng"),
        (Power::France, "mao"),
        (Power::Germany, "hel"),
    ] {
        state.place_unit(Unit::fleet(power, p(abbr), Coast::None));
    }
    state
}

fn board(index: usize) -> BoardState {
    if index == 0 {
        opening()
    } else {
        channel()
    }
}

fn shuffled_orders() -> impl Strategy<Value = (usize, Vec<(Order, Power)>, Vec<(Order, Power)>)> {
    (0..2usize, prop::collection::vec(any::<u8>(), 22)).prop_flat_map(|(index, choices)| {
        let orders = orders_from_choices(&board(index), &choices);
        (Just(index), Just(orders.clone()), Just(orders).prop_shuffle())
    })
}

proptest! {
    #[test]
    fn prop_report_ignores_submission_order((index, orders, shuffled) in shuffled_orders()) {
        let state = board(index);
        let a = resolve_movement(&orders, &state, map()).unwrap();
        let b = resolve_movement(&shuffled, &state, map()).unwrap();
        prop_assert_eq!(&a, &b);

        let mut after_a = state.clone();
        let mut after_b = state.clone();
        apply_movement(&mut after_a, &a, map()).unwrap();
        apply_movement(&mut after_b, &b, map()).unwrap();
        prop_assert_eq!(after_a, after_b);
    }

    #[test]
    fn prop_resolution_is_repeatable(
        index in 0..2usize,
        choices in prop::collection::vec(any::<u8>(), 22),
    ) {
        let state = board(index);
        let orders = orders_from_choices(&state, &choices);
        let first = resolve_movement(&orders, &state, map()).unwrap();
        let second = resolve_movement(&orders, &state, map()).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_unit_count_is_conserved(
        index in 0..2usize,
        choices in prop::collection::vec(any::<u8>(), 22),
    ) {
        let mut state = board(index);
        let before = state.units().count();
        let orders = orders_from_choices(&state, &choices);
        let report = resolve_movement(&orders, &state, map()).unwrap();
        apply_movement(&mut state, &report, map()).unwrap();
        prop_assert_eq!(state.units().count() + report.dislodged.len(), before);
    }
}
