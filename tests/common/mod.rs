#![allow(dead_code)]

use derby_engine::*;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn identical_field(n: usize) -> Vec<Entity> {
    let attrs = Attributes {
        base_speed: 70.0,
        stamina: 70.0,
        agility: 70.0,
        intelligence: 50.0,
        temperament: 50.0,
    };
    (0..n)
        .map(|i| Entity::new(format!("h{}", i + 1), format!("Twin {}", i + 1), attrs))
        .collect()
}

pub fn mixed_field() -> Vec<Entity> {
    vec![
        Entity::new("sprinter", "Front Runner", Attributes {
            base_speed: 90.0,
            stamina: 35.0,
            agility: 60.0,
            intelligence: 30.0,
            temperament: 15.0,
        }),
        Entity::new("stayer", "Late Closer", Attributes {
            base_speed: 75.0,
            stamina: 90.0,
            agility: 55.0,
            intelligence: 85.0,
            temperament: 80.0,
        }),
        Entity::new("allrounder", "Steady Eddie", Attributes::uniform(65.0)),
        Entity::new("longshot", "Rank Outsider", Attributes::uniform(35.0)),
        Entity::new("plodder", "Slow Boat", Attributes {
            base_speed: 20.0,
            stamina: 95.0,
            agility: 20.0,
            intelligence: 60.0,
            temperament: 95.0,
        }),
    ]
}

/// Every emitted state plus the results handed to the finish callback
pub struct RaceRecording {
    pub states: Vec<RaceState>,
    pub finished: Vec<Vec<RaceResult>>,
    pub results: Vec<RaceResult>,
}

pub fn run_recorded(field: &[Entity], race: RaceConfiguration, seed: u64) -> RaceRecording {
    let mut engine = SimulationEngine::new(field, race).unwrap().with_seed(seed);
    let mut states = Vec::new();
    let mut finished = Vec::new();
    let results = {
        let mut observer = Callbacks {
            on_update: |s: &RaceState| states.push(s.clone()),
            on_finish: |r: &[RaceResult]| finished.push(r.to_vec()),
        };
        engine.run(&mut observer)
    };
    RaceRecording {
        states,
        finished,
        results,
    }
}

pub fn race_config(
    distance: f64,
    weather: Weather,
    track_condition: TrackCondition,
) -> RaceConfiguration {
    RaceConfiguration::new(distance, Surface::Firm, weather, track_condition).unwrap()
}
