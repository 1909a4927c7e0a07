mod common;

use common::{init_logging, mixed_field};
use derby_engine::wagering::{performance_score, win_odds};
use derby_engine::*;
use proptest::prelude::*;

fn meeting(distance: f64) -> RaceMeeting {
    let mut config = SimulatorConfig::default();
    config.race.distance = distance;
    config.seed = 9;
    RaceMeeting::new(config).unwrap()
}

#[test]
fn test_zero_stake_leaves_book_untouched() {
    let field = mixed_field();
    let mut book = WageringEngine::default();
    book.place_bet("stayer", WagerClass::Win, 40.0).unwrap();
    let before = book.calculate_odds(&field);

    assert_eq!(
        book.place_bet("stayer", WagerClass::Win, 0.0),
        Err(WagerError::NonPositiveStake(0.0))
    );
    assert_eq!(book.total_pool(), 40.0);
    assert_eq!(book.bets().len(), 1);
    assert_eq!(book.calculate_odds(&field), before);

    // Ticket numbers are not consumed by rejected bets
    assert_eq!(book.place_bet("stayer", WagerClass::Show, 5.0), Ok(2));
}

#[test]
fn test_win_payouts_follow_settlement_odds() {
    init_logging();
    let field = mixed_field();
    let mut meeting = meeting(500.0);
    meeting.init_race(field.clone()).unwrap();

    for entity in &field {
        meeting.place_bet(&entity.id, WagerClass::Win, 100.0).unwrap();
    }
    meeting.place_bet("stayer", WagerClass::Win, 150.0).unwrap();

    meeting.start_race();
    let results = meeting.run(&mut NullObserver).unwrap();
    let winner = results[0].entity_id.clone();

    let quotes = meeting.book().calculate_odds(&field);
    let winner_odds = quotes
        .iter()
        .find(|q| q.entity_id == winner)
        .map(|q| q.win_odds)
        .unwrap();

    let outcomes = meeting.settle().unwrap();
    assert_eq!(outcomes.len(), field.len() + 1);
    for outcome in &outcomes {
        if outcome.bet.entity_id == winner {
            assert!(outcome.won);
            assert!((outcome.payout - outcome.bet.stake * winner_odds).abs() < 1e-9);
        } else {
            assert!(!outcome.won);
            assert_eq!(outcome.payout, 0.0);
        }
    }
}

#[test]
fn test_place_and_show_pay_on_the_board() {
    let field = mixed_field();
    let mut meeting = meeting(400.0);
    meeting.init_race(field.clone()).unwrap();
    for entity in &field {
        meeting.place_bet(&entity.id, WagerClass::Place, 10.0).unwrap();
        meeting.place_bet(&entity.id, WagerClass::Show, 10.0).unwrap();
    }
    meeting.start_race();
    let results = meeting.run(&mut NullObserver).unwrap();
    let outcomes = meeting.settle().unwrap();

    let rank_of = |id: &str| results.iter().find(|r| r.entity_id == id).map(|r| r.rank);
    let winners = outcomes.iter().filter(|o| o.won).count();
    assert_eq!(winners, 2 + 3);
    for o in &outcomes {
        let rank = rank_of(&o.bet.entity_id).unwrap();
        assert_eq!(o.won, o.bet.class.pays(rank));
        assert_eq!(o.won, o.payout > 0.0);
    }
}

#[test]
fn test_reset_after_settlement_returns_to_morning_line() {
    let field = mixed_field();
    let morning_line = WageringEngine::default().calculate_odds(&field);

    let mut meeting = meeting(300.0);
    meeting.init_race(field.clone()).unwrap();
    meeting.place_bet("longshot", WagerClass::Win, 1000.0).unwrap();
    assert_ne!(meeting.odds(), morning_line);

    meeting.start_race();
    meeting.run(&mut NullObserver).unwrap();
    meeting.settle().unwrap();

    meeting.init_race(field).unwrap();
    assert_eq!(meeting.book().total_pool(), 0.0);
    assert_eq!(meeting.odds(), morning_line);
}

#[test]
fn test_settlement_does_not_mutate_book() {
    let field = mixed_field();
    let mut meeting = meeting(300.0);
    meeting.init_race(field).unwrap();
    meeting.place_bet("sprinter", WagerClass::Win, 25.0).unwrap();
    meeting.start_race();
    meeting.run(&mut NullObserver).unwrap();

    let first = meeting.settle().unwrap();
    let second = meeting.settle().unwrap();
    assert_eq!(first, second);
    assert_eq!(meeting.book().total_pool(), 25.0);
}

#[test]
fn test_stronger_horse_quoted_shorter() {
    let field = mixed_field();
    let quotes = WageringEngine::default().calculate_odds(&field);
    let odds = |id: &str| quotes.iter().find(|q| q.entity_id == id).unwrap().win_odds;
    assert!(odds("allrounder") < odds("longshot"));
    for q in &quotes {
        assert!(q.place_odds <= q.win_odds);
        assert!(q.show_odds <= q.place_odds);
    }
}

proptest! {
    #[test]
    fn prop_win_odds_monotone_in_score(
        a in 0.1..=0.9f64,
        b in 0.1..=0.9f64,
        share in prop::option::of(0.0..=1.0f64),
    ) {
        let config = WageringConfig::default();
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        let long = win_odds(low, share, &config);
        let short = win_odds(high, share, &config);
        prop_assert!(short <= long);
        prop_assert!(short >= config.min_win_odds);
    }

    #[test]
    fn prop_quotes_never_below_floor(
        speed in 0.0..=100.0f64,
        stamina in 0.0..=100.0f64,
        stakes in prop::collection::vec(0.5..5000.0f64, 0..8),
    ) {
        let field = vec![
            Entity::new("x", "X", Attributes { base_speed: speed, stamina, ..Attributes::default() }),
            Entity::new("y", "Y", Attributes::default()),
        ];
        let mut book = WageringEngine::default();
        for (i, stake) in stakes.into_iter().enumerate() {
            let id = if i % 2 == 0 { "x" } else { "y" };
            book.place_bet(id, WagerClass::Win, stake).unwrap();
        }
        for q in book.calculate_odds(&field) {
            prop_assert!(q.win_odds >= 1.1);
        }
        let score = performance_score(&field[0]);
        prop_assert!((0.1..=0.9).contains(&score));
    }
}
