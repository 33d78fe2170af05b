//! Headless Threat Probe
//!
//! Runs one evaluator update for a faction and prints, per allied squad,
//! the best adjacent tile and its role-weighted score as JSON.

use clap::Parser;
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use tactical_threat::core::config::{load_threat_config, ThreatConfig};
use tactical_threat::spatial::GridBounds;
use tactical_threat::squad::{AttackType, SquadQuery, SquadRecord, SquadRole, SquadRoster, ThreatByRange, UnitAttack};
use tactical_threat::threat::CompositeThreatEvaluator;
use tactical_threat::{FactionId, GridPos, Result, SquadId};

/// Threat Probe - inspect threat layers for a scenario
#[derive(Parser, Debug)]
#[command(name = "threat_probe")]
#[command(about = "Score positions for every squad of a faction and output JSON")]
struct Args {
    /// Threat config name (loaded from data/ai_threat/)
    #[arg(long, default_value = "default")]
    config: String,

    /// Scenario roster TOML; a random skirmish is generated when omitted
    #[arg(long)]
    scenario: Option<String>,

    /// Viewing faction
    #[arg(long, default_value_t = 1)]
    faction: u32,

    /// Combat round to evaluate
    #[arg(long, default_value_t = 0)]
    round: i64,

    /// Map width in tiles
    #[arg(long, default_value_t = 40)]
    width: i32,

    /// Map height in tiles
    #[arg(long, default_value_t = 40)]
    height: i32,

    /// Squads per side for generated skirmishes
    #[arg(long, default_value_t = 6)]
    squads: u32,

    /// Random seed for generated skirmishes
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Serialize)]
struct SquadAdvice {
    squad: SquadId,
    role: SquadRole,
    position: GridPos,
    current_score: f64,
    best_position: GridPos,
    best_score: f64,
    melee_threat: f64,
    ranged_pressure: f64,
    total_risk: f64,
}

#[derive(Serialize)]
struct ProbeReport {
    config: String,
    faction: FactionId,
    round: i64,
    seed: Option<u64>,
    most_damaged_ally: Option<SquadId>,
    squads: Vec<SquadAdvice>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = load_threat_config(&args.config).unwrap_or_else(|e| {
        tracing::warn!("Failed to load threat config '{}': {}, using defaults", args.config, e);
        ThreatConfig::default()
    });

    let bounds = GridBounds::new(args.width, args.height);
    let (roster, seed) = match &args.scenario {
        Some(path) => match SquadRoster::load(path) {
            Ok(roster) => (roster, None),
            Err(e) => {
                tracing::error!("Failed to load scenario '{}': {}", path, e);
                std::process::exit(1);
            }
        },
        None => {
            let seed = args.seed.unwrap_or_else(rand::random);
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            (random_skirmish(&mut rng, bounds, args.squads), Some(seed))
        }
    };

    let faction = FactionId::new(args.faction);
    let mut evaluator = CompositeThreatEvaluator::new(faction, bounds, &config);
    evaluator.update(&roster, args.round);

    let squads = roster
        .active_squads(faction)
        .into_iter()
        .filter_map(|squad| advise(&evaluator, &roster, bounds, squad))
        .collect();

    let report = ProbeReport {
        config: config.name.clone(),
        faction,
        round: args.round,
        seed,
        most_damaged_ally: evaluator.support().most_damaged_ally(),
        squads,
    };

    match render_report(&report) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            tracing::error!("Failed to serialize report: {}", e);
            std::process::exit(1);
        }
    }
}

fn render_report(report: &ProbeReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

fn advise(
    evaluator: &CompositeThreatEvaluator,
    roster: &SquadRoster,
    bounds: GridBounds,
    squad: SquadId,
) -> Option<SquadAdvice> {
    let position = roster.position(squad)?;

    // Stay put or take one step
    let candidates: Vec<GridPos> = std::iter::once(position)
        .chain(position.neighbors())
        .filter(|p| bounds.contains(*p))
        .collect();
    let best_position = evaluator.optimal_position_for_role(roster, squad, &candidates);

    Some(SquadAdvice {
        squad,
        role: roster.primary_role(squad).unwrap_or_default(),
        position,
        current_score: evaluator.role_weighted_threat(roster, squad, position),
        best_position,
        best_score: evaluator.role_weighted_threat(roster, squad, best_position),
        melee_threat: evaluator.combat().melee_threat_at(position),
        ranged_pressure: evaluator.combat().ranged_pressure_at(position),
        total_risk: evaluator.positional().total_risk_at(position),
    })
}

/// Two sides facing each other across the map, mixed roles and attack types
fn random_skirmish(rng: &mut ChaCha8Rng, bounds: GridBounds, per_side: u32) -> SquadRoster {
    let mut roster = SquadRoster::new();
    let third = (bounds.width / 3).max(1);

    for (side, faction) in [FactionId::new(1), FactionId::new(2)].into_iter().enumerate() {
        let x_start = if side == 0 { 0 } else { bounds.width - third };
        for i in 0..per_side {
            let id = SquadId::new(faction.0 * 100 + i);
            let pos = GridPos::new(
                rng.gen_range(x_start..x_start + third),
                rng.gen_range(0..bounds.height.max(1)),
            );

            let role = match rng.gen_range(0..3) {
                0 => SquadRole::Tank,
                1 => SquadRole::Dps,
                _ => SquadRole::Support,
            };
            let mut record = SquadRecord::new(id, faction)
                .at(pos)
                .speed(rng.gen_range(1..=4))
                .role(role)
                .health(rng.gen_range(0.3..=1.0));

            let melee_power = rng.gen_range(10.0..60.0);
            let mut threat = ThreatByRange::new().with(1, melee_power);
            if role == SquadRole::Support || rng.gen_bool(0.4) {
                let range = rng.gen_range(2..=5);
                let attack_type = if rng.gen_bool(0.5) { AttackType::Ranged } else { AttackType::Magic };
                record = record.unit(UnitAttack::new(attack_type, range));
                threat.insert(range, melee_power * 0.5);
            }
            if role != SquadRole::Support {
                record = record.unit(UnitAttack::new(AttackType::MeleeRow, 1));
            }

            roster.add_squad(record.threat(threat));
        }
    }

    roster
}
