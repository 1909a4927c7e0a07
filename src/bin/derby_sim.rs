//! Derby simulator CLI - runs one race meeting end to end

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use derby_engine::{
    Attributes, Entity, RaceMeeting, RaceObserver, RaceRecord, RaceResult, RaceState, RunOutcome,
    SimulatorConfig, StopHandle, Surface, TrackCondition, WagerClass, Weather,
};

const NAMES: [&str; 12] = [
    "Thunder Road",
    "Silver Comet",
    "Midnight Drift",
    "Copper Crown",
    "Northern Gale",
    "Lucky Ember",
    "Quiet Storm",
    "Paper Tiger",
    "Iron Lark",
    "Saffron Dusk",
    "Glass Harbor",
    "Wild Clover",
];

#[derive(Parser)]
#[command(name = "derby-sim")]
#[command(author, version, about = "Horse race simulation and wagering", long_about = None)]
struct Cli {
    /// JSON simulator config
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Race distance in meters
    #[arg(long)]
    distance: Option<f64>,

    #[arg(long)]
    weather: Option<Weather>,

    #[arg(long)]
    track: Option<TrackCondition>,

    #[arg(long)]
    surface: Option<Surface>,

    /// Physics RNG seed (also used to generate the field)
    #[arg(long)]
    seed: Option<u64>,

    /// Number of runners
    #[arg(short, long, default_value = "8")]
    field: usize,

    /// Pace ticks on the wall clock
    #[arg(long)]
    realtime: bool,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

/// Logs the leader once per simulated second
struct Commentary {
    every: u64,
}

impl RaceObserver for Commentary {
    fn on_update(&mut self, state: &RaceState) {
        if state.tick % self.every != 0 || state.finished {
            return;
        }
        if let Some(leader) = state.participants.first() {
            log::info!(
                "{:>6.1}s  {} leads at {:.0}m ({:.1} m/s, energy {:.0})",
                state.elapsed_time,
                leader.name,
                leader.distance,
                leader.speed,
                leader.energy
            );
        }
    }

    fn on_finish(&mut self, results: &[RaceResult]) {
        if let Some(winner) = results.first() {
            log::info!("{} wins in {:.2}s", winner.entity_name, winner.finish_time);
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let mut config = match &cli.config {
        Some(path) => SimulatorConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => SimulatorConfig::default(),
    };
    if let Some(distance) = cli.distance {
        config.race.distance = distance;
    }
    if let Some(weather) = cli.weather {
        config.race.weather = weather;
    }
    if let Some(track) = cli.track {
        config.race.track_condition = track;
    }
    if let Some(surface) = cli.surface {
        config.race.surface = surface;
    }
    if let Some(seed) = cli.seed {
        config.seed = seed;
    }

    let field = generate_field(cli.field, config.seed);
    let ticks_per_second = (1000 / config.physics.tick_interval_ms.max(1)).max(1);
    let realtime = cli.realtime;

    let mut meeting = RaceMeeting::new(config).context("invalid configuration")?;
    meeting.init_race(field).context("invalid field")?;

    print_odds(&meeting);
    place_demo_bets(&mut meeting)?;

    let mut commentary = Commentary {
        every: ticks_per_second,
    };
    meeting.start_race();
    let results = if realtime {
        match meeting.run_realtime(&mut commentary, &StopHandle::new()) {
            Some(RunOutcome::Finished(results)) => results,
            Some(RunOutcome::Stopped) => bail!("race stopped before the finish"),
            None => bail!("no race carded"),
        }
    } else {
        meeting.run(&mut commentary).context("no race carded")?
    };
    print_results(&results);

    if let Some(outcomes) = meeting.settle() {
        println!("\nSettlement");
        for o in &outcomes {
            println!(
                "  #{:<3} {:<6} {:<16} stake {:>8.2}  {}  payout {:>9.2}",
                o.bet.ticket,
                format!("{:?}", o.bet.class),
                o.bet.entity_id,
                o.bet.stake,
                if o.won { "WON " } else { "lost" },
                o.payout
            );
        }
    }

    if let Some(stats) = meeting.stats() {
        log::debug!("{:?}", stats);
    }
    Ok(())
}

fn generate_field(count: usize, seed: u64) -> Vec<Entity> {
    let mut rng = Pcg32::seed_from_u64(seed ^ 0x5eed);
    (0..count)
        .map(|i| {
            let name = match NAMES.get(i) {
                Some(name) => name.to_string(),
                None => format!("Runner {}", i + 1),
            };
            let attributes = Attributes {
                base_speed: rng.gen_range(55.0..95.0),
                stamina: rng.gen_range(50.0..95.0),
                agility: rng.gen_range(45.0..95.0),
                intelligence: rng.gen_range(40.0..95.0),
                temperament: rng.gen_range(20.0..90.0),
            };
            let races = rng.gen_range(0..20);
            let wins = if races == 0 { 0 } else { rng.gen_range(0..=races / 2) };
            Entity::new(format!("h{}", i + 1), name, attributes)
                .with_record(RaceRecord { races, wins })
        })
        .collect()
}

fn print_odds(meeting: &RaceMeeting) {
    println!("Morning line");
    for (entity, quote) in meeting.field().iter().zip(meeting.odds()) {
        println!(
            "  {:<4} {:<16} win {:>5.1}  place {:>5.1}  show {:>5.1}",
            entity.id, entity.name, quote.win_odds, quote.place_odds, quote.show_odds
        );
    }
}

/// Back the favourite to win, the second pick to place and the third to show
fn place_demo_bets(meeting: &mut RaceMeeting) -> Result<()> {
    let mut quotes = meeting.odds();
    quotes.sort_by(|a, b| a.win_odds.total_cmp(&b.win_odds));

    let picks = [
        (WagerClass::Win, 500.0),
        (WagerClass::Place, 300.0),
        (WagerClass::Show, 200.0),
    ];
    for (quote, (class, stake)) in quotes.iter().zip(picks) {
        meeting
            .place_bet(&quote.entity_id, class, stake)
            .with_context(|| format!("placing {:?} bet on {}", class, quote.entity_id))?;
    }
    log::info!("Pool open with {:.2} staked", meeting.book().total_pool());
    Ok(())
}

fn print_results(results: &[RaceResult]) {
    println!("\nResult");
    for r in results {
        println!(
            "  {:>2}. {:<16} lane {:<2} {:>8.3}s",
            r.rank, r.entity_name, r.lane + 1, r.finish_time
        );
    }
}
