use serde::Serialize;

/// Which direction of a retrieval score means "closer".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreConvention {
    /// Lower is closer, as index distances are.
    Distance,
    /// Higher is closer, as raw dot products are.
    Similarity,
}

impl ScoreConvention {
    /// Strict comparison, so an equal score never displaces the incumbent.
    /// NaN never wins.
    pub fn is_better(self, candidate: f32, incumbent: f32) -> bool {
        match self {
            Self::Distance => candidate < incumbent,
            Self::Similarity => candidate > incumbent,
        }
    }

    /// Position and score of the best entry; ties resolve to the earliest.
    pub fn best_position<I>(self, scores: I) -> Option<(usize, f32)>
    where
        I: IntoIterator<Item = f32>,
    {
        let mut best: Option<(usize, f32)> = None;
        for (position, score) in scores.into_iter().enumerate() {
            if score.is_nan() {
                continue;
            }
            match best {
                Some((_, incumbent)) if !self.is_better(score, incumbent) => {}
                _ => best = Some((position, score)),
            }
        }
        best
    }
}
