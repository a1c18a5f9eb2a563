use crate::db::models::CurrentGame;

/// Whether `candidate` differs from `previous` in anything the display shows.
///
/// Outs and bases only count for leagues that track them, power-play flags
/// only for leagues that have them. Snapshots from different leagues are
/// always a change since their game and team ids live in different spaces.
pub fn changed(previous: &CurrentGame, candidate: &CurrentGame) -> bool {
    if previous.league != candidate.league {
        return true;
    }

    let core = previous.game_id != candidate.game_id
        || previous.away_id != candidate.away_id
        || previous.home_id != candidate.home_id
        || previous.away_score != candidate.away_score
        || previous.home_score != candidate.home_score
        || previous.division != candidate.division
        || previous.time_remaining != candidate.time_remaining;
    if core {
        return true;
    }

    let league = previous.league.league();
    if league.tracks_bases()
        && (previous.outs != candidate.outs || previous.bases != candidate.bases)
    {
        return true;
    }
    if league.tracks_power_play()
        && (previous.away_power_play != candidate.away_power_play
            || previous.home_power_play != candidate.home_power_play)
    {
        return true;
    }

    false
}
