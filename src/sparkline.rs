//! Text sparklines for rank histories

use crate::data::{DomainReport, Series};

/// Block characters for different bar heights (8 levels)
const BLOCKS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Default number of points drawn per series
pub const DEFAULT_WIDTH: usize = 60;

/// A sparkline of a rank history
///
/// Ranks span several orders of magnitude, so bars are scaled on a log axis.
/// Better (smaller) ranks draw taller bars. When the history is longer than
/// the width, only the most recent points are drawn.
pub struct RankSparkline<'a> {
    ranks: &'a [u32],
    width: usize,
}

impl<'a> RankSparkline<'a> {
    pub fn new(ranks: &'a [u32]) -> Self {
        Self {
            ranks,
            width: DEFAULT_WIDTH,
        }
    }

    pub fn width(mut self, width: usize) -> Self {
        self.width = width.max(1);
        self
    }

    fn visible(&self) -> &'a [u32] {
        let skip = self.ranks.len().saturating_sub(self.width);
        &self.ranks[skip..]
    }

    fn rank_to_block(rank: u32, best: f64, worst: f64) -> char {
        if worst <= best {
            return BLOCKS[4];
        }
        let normalized = ((worst - f64::from(rank.max(1)).ln()) / (worst - best)).clamp(0.0, 1.0);
        let index = ((normalized * 7.0).round() as usize).min(7);
        BLOCKS[index]
    }

    pub fn render(&self) -> String {
        let visible = self.visible();
        let logs = visible.iter().map(|&r| f64::from(r.max(1)).ln());
        let best = logs.clone().fold(f64::INFINITY, f64::min);
        let worst = logs.fold(f64::NEG_INFINITY, f64::max);

        visible
            .iter()
            .map(|&rank| Self::rank_to_block(rank, best, worst))
            .collect()
    }
}

/// Formats one report as a single line: domain, sparkline and summary
pub fn render_report(report: &DomainReport, width: usize) -> String {
    let series: &Series = &report.series;
    let mut line = if series.out_of_top_1m && report.is_error() {
        format!("{}  (no cached data)", series.domain)
    } else if series.out_of_top_1m {
        format!("{}  (not in top 1M)", series.domain)
    } else {
        format!(
            "{}  {}  (best {}, latest {})",
            series.domain,
            RankSparkline::new(&series.ranks).width(width).render(),
            series.best_rank().unwrap_or_default(),
            series.latest_rank().unwrap_or_default()
        )
    };
    if let Some(error) = &report.error {
        line.push_str(&format!("  [error: {}]", error));
    }
    line
}
