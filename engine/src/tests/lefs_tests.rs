use super::*;
use crate::common::{lefs, transition};

const SUBNET: &str = r#"{
    "ia_red": [
        {
            "ii_idglobal": 0,
            "ii_valor": 1,
            "ii_tiempo": 0,
            "ii_duracion_disparo": 1,
            "ii_listactes_IUL": [[0, 1]],
            "ii_listactes_PUL": [[-1, -1]],
            "ib_desalida": true
        },
        {
            "ii_idglobal": 1,
            "ii_valor": 0,
            "ii_tiempo": 0,
            "ii_duracion_disparo": 2,
            "ii_listactes_IUL": [],
            "ii_listactes_PUL": [[0, -1]],
            "ib_desalida": false
        }
    ]
}"#;

#[test]
fn parse_subnet_json() {
    let lefs: Lefs = serde_json::from_str(SUBNET).unwrap();
    assert_eq!(lefs.network.len(), 2);

    let transition = &lefs.network[&0];
    assert_eq!(transition.value, 1);
    assert_eq!(transition.clock, Clock(0.0));
    assert_eq!(transition.duration, Clock(1.0));
    assert_eq!(transition.update, vec![(0, 1)]);
    assert_eq!(transition.propagate, vec![(-1, -1)]);
    assert!(transition.external);
    assert!(!lefs.network[&1].external);
}

#[test]
fn unknown_keys_are_ignored() {
    let raw = r#"{
        "ia_red": [
            {
                "ii_idglobal": 0,
                "ii_valor": 0,
                "ii_tiempo": 0,
                "ii_duracion_disparo": 1,
                "ii_listactes_IUL": [],
                "ii_listactes_PUL": [],
                "ib_desalida": false,
                "Lookahead": [1, 2]
            }
        ]
    }"#;
    let lefs: Lefs = serde_json::from_str(raw).unwrap();
    assert_eq!(lefs.network.len(), 1);
}

#[test]
fn load_missing_file_fails() {
    assert!(Lefs::load(".does_not_exist.subred0.json").is_err());
}

#[test]
fn sensitization_selects_enabled_transitions_at_clock() {
    let mut lefs = lefs(vec![
        transition(0, 0, 0.0, 1.0, vec![], vec![]),
        transition(1, 1, 0.0, 1.0, vec![], vec![]),
        transition(2, -1, 1.0, 1.0, vec![], vec![]),
        transition(3, 0, 0.0, 1.0, vec![], vec![]),
    ]);
    lefs.update_sensitized(Clock(0.0));

    // The stack pops in reverse push order.
    assert_eq!(lefs.get_sensitized(), Some(3));
    assert_eq!(lefs.get_sensitized(), Some(0));
    assert_eq!(lefs.get_sensitized(), None);

    lefs.update_sensitized(Clock(1.0));
    assert_eq!(lefs.get_sensitized(), Some(2));
    assert_eq!(lefs.get_sensitized(), None);
}

#[test]
fn apply_update_moves_the_function_value() {
    let mut lefs = lefs(vec![transition(0, 1, 0.0, 1.0, vec![], vec![])]);
    lefs.apply_update(0, -2);
    assert_eq!(lefs.network[&0].value, -1);
    lefs.apply_update(0, 1);
    assert_eq!(lefs.network[&0].value, 0);
}
