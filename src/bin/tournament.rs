//! Command-line front end: runs one tournament kept as a JSON snapshot.
//! Run with: cargo run --bin tournament -- <command> [args]
//! The snapshot path defaults to tournament.json; override with env TOURNAMENT_FILE.
//! Rosters are imported from CSV (name,seed) and pairings/standings are printed as CSV.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fs;
use std::io;
use tournament_engine::{
    correct_match_result, drop_player, end_tournament, generate_round, get_standings,
    reinstate_player, start_tournament, submit_intentional_draw, submit_match_result, GameMatch,
    MatchId, MatchResult, PlayerId, RematchPolicy, Tournament, TournamentConfig,
    TournamentError, TournamentStructure,
};
use uuid::Uuid;

type CliResult<T> = Result<T, Box<dyn Error>>;

const USAGE: &str = "usage: tournament <command> [args]

  init <name> <swiss|single|double> [config.json]
  add-player <name> [seed]
  import-roster <roster.csv>
  rounds <count>
  start
  report <match> <wins_1> <wins_2> [draws]
  draw <match>
  correct <match> <wins_1> <wins_2> [draws]
  next-round [--allow-rematches]
  drop <player>
  reinstate <player>
  pairings [round]
  standings
  end
  show

<match> is a match id or round:table. <player> is a player id or name.";

#[derive(Deserialize)]
struct RosterRow {
    name: String,
    #[serde(default)]
    seed: u32,
}

#[derive(Serialize)]
struct PairingRow<'a> {
    round: u32,
    table: u32,
    player_1: &'a str,
    player_2: &'a str,
    score: String,
    result: &'static str,
    match_id: MatchId,
}

#[derive(Serialize)]
struct StandingRow<'a> {
    rank: u32,
    player: &'a str,
    match_points: u32,
    wins: u32,
    losses: u32,
    draws: u32,
    byes: u32,
    omw: String,
    gw: String,
    ogw: String,
    active: bool,
}

fn default_snapshot_path() -> String {
    "tournament.json".to_string()
}

fn load(path: &str) -> CliResult<Tournament> {
    let json = fs::read_to_string(path)
        .map_err(|e| format!("cannot read {path}: {e} (run `tournament init` first)"))?;
    Ok(serde_json::from_str(&json)?)
}

fn save(path: &str, tournament: &Tournament) -> CliResult<()> {
    fs::write(path, serde_json::to_string_pretty(tournament)?)?;
    Ok(())
}

fn parse_structure(raw: &str) -> CliResult<TournamentStructure> {
    match raw.to_ascii_lowercase().as_str() {
        "swiss" => Ok(TournamentStructure::Swiss),
        "single" | "single_elimination" => Ok(TournamentStructure::SingleElimination),
        "double" | "double_elimination" => Ok(TournamentStructure::DoubleElimination),
        other => Err(format!("unknown structure {other:?}").into()),
    }
}

fn arg<'a>(args: &'a [String], index: usize, name: &str) -> CliResult<&'a str> {
    args.get(index)
        .map(String::as_str)
        .ok_or_else(|| format!("missing <{name}>\n\n{USAGE}").into())
}

fn number(args: &[String], index: usize, name: &str) -> CliResult<u32> {
    let raw = arg(args, index, name)?;
    raw.parse()
        .map_err(|_| format!("<{name}> must be a number, got {raw:?}").into())
}

fn optional_number(args: &[String], index: usize, name: &str) -> CliResult<u32> {
    match args.get(index) {
        Some(_) => number(args, index, name),
        None => Ok(0),
    }
}

fn find_match(tournament: &Tournament, raw: &str) -> CliResult<MatchId> {
    if let Ok(id) = Uuid::parse_str(raw) {
        return Ok(id);
    }
    let (round, table) = raw
        .split_once(':')
        .ok_or_else(|| format!("{raw:?} is neither a match id nor round:table"))?;
    let (round, table): (u32, u32) = (round.parse()?, table.parse()?);
    tournament
        .matches
        .iter()
        .find(|m| m.round == round && m.table == table)
        .map(|m| m.id)
        .ok_or_else(|| format!("no match at round {round} table {table}").into())
}

fn find_player(tournament: &Tournament, raw: &str) -> CliResult<PlayerId> {
    if let Ok(id) = Uuid::parse_str(raw) {
        return Ok(id);
    }
    tournament
        .players
        .iter()
        .find(|p| p.name.eq_ignore_ascii_case(raw.trim()))
        .map(|p| p.id)
        .ok_or_else(|| format!("no player named {raw:?}").into())
}

fn player_name(tournament: &Tournament, id: Option<PlayerId>) -> &str {
    id.and_then(|id| tournament.get_player(id))
        .map_or("", |p| p.name.as_str())
}

fn result_label(m: &GameMatch) -> &'static str {
    match (m.bye, m.result) {
        (true, _) => "bye",
        (false, Some(MatchResult::Win1)) => "win_1",
        (false, Some(MatchResult::Win2)) => "win_2",
        (false, Some(MatchResult::Draw)) => "draw",
        (false, None) if m.is_completed() => "void",
        (false, None) => "",
    }
}

fn print_pairings<'a>(
    tournament: &Tournament,
    matches: impl Iterator<Item = &'a GameMatch>,
) -> CliResult<()> {
    let mut writer = csv::Writer::from_writer(io::stdout());
    for m in matches {
        writer.serialize(PairingRow {
            round: m.round,
            table: m.table,
            player_1: player_name(tournament, m.player_1),
            player_2: player_name(tournament, m.player_2),
            score: format!("{}-{}-{}", m.wins_1, m.wins_2, m.draws),
            result: result_label(m),
            match_id: m.id,
        })?;
    }
    writer.flush()?;
    Ok(())
}

fn print_standings(tournament: &Tournament) -> CliResult<()> {
    let mut writer = csv::Writer::from_writer(io::stdout());
    for s in get_standings(tournament)? {
        writer.serialize(StandingRow {
            rank: s.rank,
            player: player_name(tournament, Some(s.player_id)),
            match_points: s.match_points,
            wins: s.wins,
            losses: s.losses,
            draws: s.draws,
            byes: s.byes,
            omw: format!("{:.4}", s.opponents_match_win_percentage),
            gw: format!("{:.4}", s.game_win_percentage),
            ogw: format!("{:.4}", s.opponents_game_win_percentage),
            active: s.active,
        })?;
    }
    writer.flush()?;
    Ok(())
}

fn import_roster(tournament: &mut Tournament, path: &str) -> CliResult<usize> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut added = 0;
    for row in reader.deserialize() {
        let row: RosterRow = row?;
        tournament.add_player(row.name, row.seed)?;
        added += 1;
    }
    Ok(added)
}

/// Apply one command. Returns whether the snapshot changed.
fn run(path: &str, args: &[String]) -> CliResult<bool> {
    let command = arg(args, 0, "command")?;
    if command == "init" {
        let name = arg(args, 1, "name")?;
        let structure = parse_structure(arg(args, 2, "structure")?)?;
        let mut tournament = Tournament::new(name, structure);
        if let Some(config_path) = args.get(3) {
            let config = TournamentConfig::from_json(&fs::read_to_string(config_path)?)?;
            tournament.set_config(config)?;
        }
        log::info!("created tournament {} ({})", tournament.name, tournament.id);
        save(path, &tournament)?;
        return Ok(false);
    }

    let mut tournament = load(path)?;
    match command {
        "add-player" => {
            let seed = optional_number(args, 2, "seed")?;
            let id = tournament.add_player(arg(args, 1, "name")?, seed)?;
            println!("{id}");
        }
        "import-roster" => {
            let added = import_roster(&mut tournament, arg(args, 1, "roster.csv")?)?;
            log::info!("imported {added} players");
        }
        "rounds" => tournament.set_rounds(number(args, 1, "count")?)?,
        "start" => {
            let created = start_tournament(&mut tournament)?;
            let round = tournament.current_round;
            print_pairings(&tournament, created.iter().filter(|m| m.round == round))?;
        }
        "report" | "correct" => {
            let match_id = find_match(&tournament, arg(args, 1, "match")?)?;
            let wins_1 = number(args, 2, "wins_1")?;
            let wins_2 = number(args, 3, "wins_2")?;
            let draws = optional_number(args, 4, "draws")?;
            if command == "report" {
                submit_match_result(&mut tournament, match_id, wins_1, wins_2, draws)?;
            } else {
                correct_match_result(&mut tournament, match_id, wins_1, wins_2, draws)?;
            }
        }
        "draw" => {
            let match_id = find_match(&tournament, arg(args, 1, "match")?)?;
            submit_intentional_draw(&mut tournament, match_id)?;
        }
        "next-round" => {
            let policy = if args.iter().any(|a| a == "--allow-rematches") {
                RematchPolicy::AllowLeastRecent
            } else {
                RematchPolicy::Forbid
            };
            let generated = generate_round(&mut tournament, policy)?;
            for (one, two) in &generated.forced_rematches {
                eprintln!(
                    "rematch: {} vs {}",
                    player_name(&tournament, Some(*one)),
                    player_name(&tournament, Some(*two))
                );
            }
            print_pairings(&tournament, generated.matches.iter())?;
        }
        "drop" => {
            let id = find_player(&tournament, arg(args, 1, "player")?)?;
            drop_player(&mut tournament, id)?;
        }
        "reinstate" => {
            let id = find_player(&tournament, arg(args, 1, "player")?)?;
            reinstate_player(&mut tournament, id)?;
        }
        "end" => end_tournament(&mut tournament)?,
        "pairings" => {
            let round = match args.get(1) {
                Some(_) => number(args, 1, "round")?,
                None => tournament.current_round,
            };
            print_pairings(&tournament, tournament.round_matches(round))?;
            return Ok(false);
        }
        "standings" => {
            print_standings(&tournament)?;
            return Ok(false);
        }
        "show" => {
            println!("{}", serde_json::to_string_pretty(&tournament)?);
            return Ok(false);
        }
        other => return Err(format!("unknown command {other:?}\n\n{USAGE}").into()),
    }
    save(path, &tournament)?;
    Ok(true)
}

fn main() {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let path = std::env::var("TOURNAMENT_FILE").unwrap_or_else(|_| default_snapshot_path());
    let args: Vec<String> = std::env::args().skip(1).collect();
    if let Err(e) = run(&path, &args) {
        match e.downcast_ref::<TournamentError>() {
            Some(err) => eprintln!("error [{}]: {err}", err.kind()),
            None => eprintln!("error: {e}"),
        }
        std::process::exit(1);
    }
}
