pub fn xp_to_next_level(level: u32) -> u64 {
    level as u64 * 100
}

/// Add experience, carrying over into as many level-ups as it covers.
pub fn add_experience(level: u32, experience: u64, gained: u64) -> (u32, u64) {
    let mut level = level.max(1);
    let mut experience = experience + gained;
    while experience >= xp_to_next_level(level) {
        experience -= xp_to_next_level(level);
        level += 1;
    }
    (level, experience)
}

pub fn level_progress_percent(level: u32, experience: u64) -> u32 {
    let needed = xp_to_next_level(level.max(1));
    ((experience as f64 / needed as f64) * 100.0).round().min(100.0) as u32
}
