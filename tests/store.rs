use rusqlite::Connection;

use scoreprob::dataset::{Fixture, MatchRecord, parse_match_time};
use scoreprob::predict::predict_fixture;
use scoreprob::store;
use scoreprob::strength::{HomeAdvantage, StrengthFit, TeamStrength};

fn memory_db() -> Connection {
    let conn = Connection::open_in_memory().expect("in-memory sqlite");
    store::init_schema(&conn).expect("schema");
    conn
}

fn at(raw: &str) -> chrono::NaiveDateTime {
    parse_match_time(raw).expect("valid time")
}

#[test]
fn matches_round_trip_in_date_order() {
    let mut conn = memory_db();
    let rows = vec![
        MatchRecord::new(at("2018-12-22 15:00:00"), "Leicester", "Man City", 2, 1),
        MatchRecord::new(at("2018-12-15 15:00:00"), "Man City", "Everton", 3, 1),
    ];
    store::upsert_matches(&mut conn, "yc", &rows).unwrap();
    // Re-importing the same match updates it in place.
    store::upsert_matches(
        &mut conn,
        "yc",
        &[MatchRecord::new(at("2018-12-15 15:00:00"), "Man City", "Everton", 3, 2)],
    )
    .unwrap();
    store::upsert_matches(
        &mut conn,
        "dj",
        &[MatchRecord::new(at("2018-12-15 15:00:00"), "Bayern", "Hannover", 4, 1)],
    )
    .unwrap();

    let loaded = store::load_finished_matches(&conn, "yc").unwrap();
    assert_eq!(loaded.len(), 2);
    assert_eq!(loaded[0].home_team, "Man City");
    assert_eq!(loaded[0].away_goals, 2);
    assert_eq!(loaded[1], rows[0]);
}

#[test]
fn fixtures_are_windowed() {
    let mut conn = memory_db();
    let fixtures = vec![
        Fixture {
            id: 10,
            date: at("2019-01-12 15:00:00"),
            home_team: "Chelsea".to_string(),
            away_team: "Newcastle".to_string(),
            handicap_line: Some("一球/球半".to_string()),
            total_line: Some("2.5/3".to_string()),
        },
        Fixture {
            id: 11,
            date: at("2019-01-20 15:00:00"),
            home_team: "Wolves".to_string(),
            away_team: "Leicester".to_string(),
            handicap_line: None,
            total_line: None,
        },
    ];
    store::upsert_fixtures(&mut conn, "yc", &fixtures).unwrap();

    let window = store::load_fixtures(&conn, "yc", &at("2019-01-10"), &at("2019-01-15")).unwrap();
    assert_eq!(window, vec![fixtures[0].clone()]);
    let other = store::load_fixtures(&conn, "dj", &at("2019-01-01"), &at("2019-02-01")).unwrap();
    assert!(other.is_empty());
}

#[test]
fn predictions_are_stored_once_per_fixture() {
    let conn = memory_db();
    let fit = StrengthFit::from_parts(
        vec![
            TeamStrength {
                team: "Chelsea".to_string(),
                attack: 1.4,
                defense: 0.8,
            },
            TeamStrength {
                team: "Newcastle".to_string(),
                attack: 0.8,
                defense: 1.2,
            },
        ],
        HomeAdvantage::fixed(1.1),
    );
    let fixture = Fixture {
        id: 10,
        date: at("2019-01-12 15:00:00"),
        home_team: "Chelsea".to_string(),
        away_team: "Newcastle".to_string(),
        handicap_line: Some("半球".to_string()),
        total_line: None,
    };
    let prediction = predict_fixture(&fit, &fixture).unwrap();

    assert!(!store::has_prediction(&conn, 10).unwrap());
    store::save_prediction(&conn, "yc", &prediction).unwrap();
    store::save_prediction(&conn, "yc", &prediction).unwrap();
    assert!(store::has_prediction(&conn, 10).unwrap());

    let payload = store::load_prediction_json(&conn, 10).unwrap().expect("payload stored");
    assert_eq!(payload["fixture_id"], 10);
    assert_eq!(payload["handicap"]["quote"], "半球");
    assert!(payload["score"]["1:0"].as_f64().unwrap() > 0.0);
    assert!(payload["total"].is_null());
    assert!(store::load_prediction_json(&conn, 11).unwrap().is_none());
}
