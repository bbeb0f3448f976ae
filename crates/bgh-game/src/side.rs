use rand::Rng;

/// Extra-ball column selection, chosen once per round.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Side {
    #[default]
    Unspec,
    Left,
    Right,
}

impl Side {
    /// Uniform binary choice.
    pub fn random<R: Rng>(rng: &mut R) -> Self {
        if rng.random_bool(0.5) {
            Side::Left
        } else {
            Side::Right
        }
    }
    pub fn is_selected(self) -> bool {
        self != Side::Unspec
    }
    /// Wire-level enum name.
    pub fn wire_name(self) -> &'static str {
        match self {
            Side::Unspec => "EXTRA_BALL_SIDE_UNSPECIFIED",
            Side::Left => "EXTRA_BALL_SIDE_LEFT",
            Side::Right => "EXTRA_BALL_SIDE_RIGHT",
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.wire_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn random_side_is_never_unspec() {
        let mut rng = rand::rng();
        for _ in 0..64 {
            assert!(Side::random(&mut rng).is_selected());
        }
    }
    #[test]
    fn both_sides_are_reachable() {
        let mut rng = rand::rng();
        let sides: Vec<Side> = (0..256).map(|_| Side::random(&mut rng)).collect();
        assert!(sides.contains(&Side::Left));
        assert!(sides.contains(&Side::Right));
    }
}
