//! Dice primitives.
//!
//! All randomness in combat flows through these helpers and the game's
//! seeded stream, so a replay of the same actions rolls the same faces.

use rand::Rng;

pub const DIE_FACES: u8 = 6;

/// A die hits on this face or higher unless an ability says otherwise.
pub const DEFAULT_HIT_THRESHOLD: u8 = 4;

pub fn roll_die<R: Rng + ?Sized>(rng: &mut R) -> u8 {
    rng.gen_range(1..=DIE_FACES)
}

/// Rolls one die per point of combat, never fewer than one.
pub fn roll_dice<R: Rng + ?Sized>(rng: &mut R, combat: u8) -> Vec<u8> {
    (0..combat.max(1)).map(|_| roll_die(rng)).collect()
}

pub fn count_hits(dice: &[u8], threshold: u8) -> u8 {
    dice.iter().filter(|&&face| face >= threshold).count() as u8
}

/// Rerolls every miss once in place. Returns the number of dice rerolled.
pub fn reroll_misses<R: Rng + ?Sized>(rng: &mut R, dice: &mut [u8], threshold: u8) -> usize {
    let mut rerolled = 0;
    for face in dice.iter_mut().filter(|face| **face < threshold) {
        *face = roll_die(rng);
        rerolled += 1;
    }
    rerolled
}

/// Damage one hit deals after armor.
pub fn damage_per_hit(base: u8, armor: u8, armor_piercing: bool) -> u8 {
    if armor_piercing {
        base
    } else {
        base.saturating_sub(armor)
    }
}

/// Splits hits into (ordinary hits, sixes) for attackers whose sixes are
/// placed separately.
pub fn split_wolverine_sixes(dice: &[u8], threshold: u8) -> (u8, u8) {
    let sixes = dice.iter().filter(|&&face| face == DIE_FACES).count() as u8;
    (count_hits(dice, threshold) - sixes, sixes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn faces_stay_in_range() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..500 {
            let face = roll_die(&mut rng);
            assert!((1..=DIE_FACES).contains(&face));
        }
    }

    #[test]
    fn zero_combat_still_rolls_one() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert_eq!(roll_dice(&mut rng, 0).len(), 1);
        assert_eq!(roll_dice(&mut rng, 4).len(), 4);
    }

    #[test]
    fn same_seed_same_faces() {
        let mut a = ChaCha8Rng::seed_from_u64(99);
        let mut b = ChaCha8Rng::seed_from_u64(99);
        assert_eq!(roll_dice(&mut a, 10), roll_dice(&mut b, 10));
    }

    #[test]
    fn hits_respect_threshold() {
        let dice = [1, 3, 4, 6];
        assert_eq!(count_hits(&dice, 4), 2);
        assert_eq!(count_hits(&dice, 3), 3);
    }

    #[test]
    fn reroll_touches_only_misses() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut dice = [6, 1, 5, 2];
        assert_eq!(reroll_misses(&mut rng, &mut dice, 4), 2);
        assert_eq!(dice[0], 6);
        assert_eq!(dice[2], 5);
    }

    #[test]
    fn armor_floors_at_zero() {
        assert_eq!(damage_per_hit(1, 0, false), 1);
        assert_eq!(damage_per_hit(1, 2, false), 0);
        assert_eq!(damage_per_hit(2, 1, false), 1);
        assert_eq!(damage_per_hit(1, 2, true), 1);
    }

    #[test]
    fn sixes_are_set_aside() {
        assert_eq!(split_wolverine_sixes(&[6, 6, 4, 2], 4), (1, 2));
        assert_eq!(split_wolverine_sixes(&[1, 2], 4), (0, 0));
    }
}
