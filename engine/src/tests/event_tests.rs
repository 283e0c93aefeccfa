use super::*;

fn event(clock: f64, destination: TransitionId, value: Const) -> Event {
    Event {
        clock: Clock(clock),
        destination,
        value,
    }
}

#[test]
fn insert_keeps_clock_order() {
    let mut list = EventList::new();
    list.insert(event(2.0, 0, 1));
    list.insert(event(1.0, 1, 1));
    list.insert(event(3.0, 2, 1));
    assert_eq!(list.first_clock(), Some(Clock(1.0)));
    assert_eq!(list.pop().unwrap().destination, 1);
    assert_eq!(list.pop().unwrap().destination, 0);
    assert_eq!(list.pop().unwrap().destination, 2);
    assert!(list.pop().is_none());
}

#[test]
fn ties_keep_arrival_order() {
    let mut list = EventList::new();
    list.insert(event(1.0, 0, 1));
    list.insert(event(1.0, 1, 1));
    list.insert(event(0.5, 2, 1));
    list.insert(event(1.0, 3, 1));
    let order: Vec<_> = std::iter::from_fn(|| list.pop())
        .map(|e| e.destination)
        .collect();
    assert_eq!(order, vec![2, 0, 1, 3]);
}

#[test]
fn pop_at_matches_exact_clock_only() {
    let mut list = EventList::new();
    list.insert(event(2.0, 0, 1));
    assert!(list.pop_at(Clock(1.0)).is_none());
    assert!(list.has_events_at(Clock(2.0)));
    assert_eq!(list.pop_at(Clock(2.0)).unwrap().destination, 0);
    assert!(list.is_empty());
}

#[test]
fn empty_list_has_no_first_clock() {
    let list = EventList::new();
    assert_eq!(list.first_clock(), None);
    assert!(!list.has_events_at(Clock(0.0)));
}
