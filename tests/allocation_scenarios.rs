//! End-to-end allocation scenarios against the public API

use magazine_conveyor::error::Error;
use magazine_conveyor::magazine::{find_run, Conveyor, MagazineEvent, SharedConveyor, SlotIndex};
use magazine_conveyor::MagazineConfig;

const F: bool = false;
const T: bool = true;

fn occupied_indices(conveyor: &Conveyor) -> Vec<usize> {
    conveyor
        .snapshot()
        .iter()
        .filter(|view| view.occupied)
        .map(|view| view.index.get())
        .collect()
}

#[test]
fn test_run_finder_scenarios() {
    // (occupancy, circular, run length, expected start)
    let cases: &[(&[bool], bool, usize, Option<usize>)] = &[
        (&[F, F, F, F], false, 3, Some(0)),
        (&[T, F, F, T], false, 2, Some(1)),
        (&[F, T, T, F], true, 2, Some(3)),
        (&[T, T, T], true, 1, None),
        (&[F, F], false, 3, None),
    ];

    for (occupancy, circular, needed, expected) in cases {
        assert_eq!(
            find_run(occupancy, *circular, *needed),
            *expected,
            "occupancy={:?} circular={} k={}",
            occupancy,
            circular,
            needed
        );
    }
}

#[test]
fn test_two_allocations_on_rotary_magazine() -> Result<(), Error> {
    let mut conveyor = Conveyor::new(&MagazineConfig::default())?;
    conveyor.configure(5, true, 2)?;

    let first = conveyor.allocate(2)?;
    assert_eq!(first.start_index(), 0);
    assert_eq!(occupied_indices(&conveyor), vec![0, 1]);

    let second = conveyor.allocate(2)?;
    assert_eq!(second.start_index(), 2);
    assert_eq!(occupied_indices(&conveyor), vec![0, 1, 2, 3]);

    // One slot left: a run of 2 no longer fits even with wraparound
    let third = conveyor.allocate(2)?;
    assert_eq!(third.start_index(), -1);
    assert_eq!(occupied_indices(&conveyor), vec![0, 1, 2, 3]);

    let fourth = conveyor.allocate(1)?;
    assert_eq!(fourth.start_index(), 4);
    Ok(())
}

#[test]
fn test_default_magazine_fills_up() -> Result<(), Error> {
    // 50 slots, run length 3: sixteen runs fit, the seventeenth does not
    let mut conveyor = Conveyor::new(&MagazineConfig::default())?;

    for expected in (0..48).step_by(3) {
        assert_eq!(conveyor.allocate_default()?.start, Some(expected));
    }
    let last = conveyor.allocate_default()?;
    assert!(!last.is_allocated());
    assert_eq!(
        last.to_string(),
        "There are not enough free positions for 3 needed places."
    );
    assert_eq!(conveyor.stats().occupied_slots, 48);
    Ok(())
}

#[test]
fn test_reduced_capacity_rotary_magazine() -> Result<(), Error> {
    let config = MagazineConfig {
        total_slots: 10,
        circular: true,
        run_length: 3,
        active_capacity: Some(6),
    };
    let mut conveyor = Conveyor::new(&config)?;

    assert_eq!(conveyor.allocate(2)?.start, Some(0)); // 0,1
    assert_eq!(conveyor.allocate(3)?.start, Some(2)); // 2,3,4
    assert_eq!(conveyor.allocate(2)?.start, None); // only 5 left among visible
    assert_eq!(occupied_indices(&conveyor), vec![0, 1, 2, 3, 4]);

    // Hidden slots 6..10 are never handed out
    assert!(conveyor.snapshot()[6..].iter().all(|view| !view.occupied && !view.visible));
    Ok(())
}

#[test]
fn test_run_at_visible_tail_stays_visible() -> Result<(), Error> {
    let config = MagazineConfig {
        total_slots: 8,
        circular: true,
        run_length: 1,
        active_capacity: Some(5),
    };
    let mut conveyor = Conveyor::new(&config)?;
    conveyor.allocate(1)?; // 0
    conveyor.allocate(2)?; // 1,2

    // Visible [T,T,T,F,F]; a run of 2 starts at 3
    let result = conveyor.allocate(2)?;
    assert_eq!(result.start, Some(3));
    assert_eq!(result.occupied, vec![SlotIndex(3), SlotIndex(4)]);
    Ok(())
}

#[test]
fn test_reconfigure_emits_event_and_resets() -> Result<(), Error> {
    let mut conveyor = Conveyor::new(&MagazineConfig::default())?;
    conveyor.allocate(5)?;
    conveyor.take_events();

    conveyor.configure(12, true, 4)?;
    assert_eq!(
        conveyor.take_events(),
        vec![MagazineEvent::Reconfigured {
            total_slots: 12,
            circular: true,
            run_length: 4,
        }]
    );
    assert!(occupied_indices(&conveyor).is_empty());
    Ok(())
}

#[test]
fn test_invalid_configuration_rejected() {
    let config = MagazineConfig {
        total_slots: 4,
        circular: false,
        run_length: 2,
        active_capacity: Some(9),
    };
    assert!(matches!(
        Conveyor::new(&config),
        Err(Error::CapacityOutOfRange {
            requested: 9,
            total: 4
        })
    ));
}

#[test]
fn test_shared_conveyor_reconfigure() -> Result<(), Error> {
    let shared = SharedConveyor::new(Conveyor::new(&MagazineConfig::default())?);
    shared.allocate(3)?;
    shared.configure(4, false, 1)?;

    let snapshot = shared.snapshot();
    assert_eq!(snapshot.len(), 4);
    assert!(snapshot.iter().all(|view| !view.occupied));
    Ok(())
}
