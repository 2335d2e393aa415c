use super::Packer;
use crate::config::Heuristic;
use crate::model::Rect;

/// Score tuple; lower is better, compared lexicographically.
type Score = (i64, i64, i64);

/// Maximal-rectangles bin.
///
/// Works in slot coordinates: callers pass sizes that already include padding and
/// extrusion. The free list is a plain `Vec` indexed by position; removals use
/// `swap_remove`, which keeps the list order deterministic for a given input sequence.
pub struct MaxRectsPacker {
    bounds: Rect,
    free: Vec<Rect>,
    used: Vec<Rect>,
    heuristic: Heuristic,
    allow_rotation: bool,
    /// Right/bottom extent of everything placed so far.
    extent: (u32, u32),
}

impl MaxRectsPacker {
    pub fn new(width: u32, height: u32, allow_rotation: bool, heuristic: Heuristic) -> Self {
        let bounds = Rect::new(0, 0, width, height);
        Self {
            bounds,
            free: vec![bounds],
            used: Vec::new(),
            heuristic,
            allow_rotation,
            extent: (0, 0),
        }
    }

    /// Places `node` and updates the free list.
    fn place_rect(&mut self, node: &Rect) {
        let mut new_free: Vec<Rect> = Vec::new();
        let mut i = 0usize;
        while i < self.free.len() {
            let fr = self.free[i];
            if fr.intersects(node) {
                self.free.swap_remove(i);
                split_free_node(fr, node, &mut new_free);
            } else {
                i += 1;
            }
        }
        self.prune_new_vs_old(&mut new_free);
        prune_within(&mut new_free);
        self.free.extend(new_free);
        self.used.push(*node);
        self.extent = (
            self.extent.0.max(node.right()),
            self.extent.1.max(node.bottom()),
        );
    }

    fn prune_new_vs_old(&mut self, new_free: &mut Vec<Rect>) {
        new_free.retain(|nr| nr.w > 0 && nr.h > 0 && !self.free.iter().any(|of| of.contains(nr)));
        let mut i = 0;
        while i < self.free.len() {
            if new_free.iter().any(|nr| nr.contains(&self.free[i])) {
                self.free.swap_remove(i);
            } else {
                i += 1;
            }
        }
    }

    fn score(&self, fr: &Rect, w: u32, h: u32) -> Score {
        let leftover_h = (fr.w - w) as i64;
        let leftover_v = (fr.h - h) as i64;
        let short_fit = leftover_h.min(leftover_v);
        let long_fit = leftover_h.max(leftover_v);
        let area_fit = fr.area() as i64 - (w as u64 * h as u64) as i64;
        let grown_w = self.extent.0.max(fr.x + w) as i64;
        let grown_h = self.extent.1.max(fr.y + h) as i64;
        let grown_area = grown_w * grown_h;
        let grown_side = grown_w.max(grown_h);
        match self.heuristic {
            Heuristic::BestShortSideFit => (short_fit, long_fit, 0),
            Heuristic::BestLongSideFit => (long_fit, short_fit, 0),
            Heuristic::BestAreaFit => (area_fit, short_fit, 0),
            Heuristic::BottomLeft => ((fr.y + h) as i64, fr.x as i64, 0),
            Heuristic::ContactPoint => {
                let contact = self.contact_point_score(fr.x, fr.y, w, h);
                (-(contact as i64), area_fit, 0)
            }
            Heuristic::Smart => (grown_area, short_fit, long_fit),
            Heuristic::SmartArea => (grown_area, area_fit, short_fit),
            Heuristic::Square => (grown_side, short_fit, long_fit),
            Heuristic::SquareArea => (grown_side, area_fit, short_fit),
            Heuristic::SmartSquare => (grown_side, grown_area, short_fit),
            Heuristic::SmartSquareArea => (grown_side, grown_area, area_fit),
        }
    }

    /// Best position for a `w` x `h` slot. Candidates are visited in free-list order,
    /// unrotated before rotated; only a strictly better score replaces the current best,
    /// so ties keep the first candidate seen.
    fn find_position(&self, w: u32, h: u32) -> Option<(Rect, bool)> {
        let mut best: Option<(Score, Rect, bool)> = None;
        let mut consider = |score: Score, rect: Rect, rotated: bool| {
            if best.as_ref().is_none_or(|(s, _, _)| score < *s) {
                best = Some((score, rect, rotated));
            }
        };

        for fr in &self.free {
            if fr.w >= w && fr.h >= h {
                consider(self.score(fr, w, h), Rect::new(fr.x, fr.y, w, h), false);
            }
            if self.allow_rotation && w != h && fr.w >= h && fr.h >= w {
                consider(self.score(fr, h, w), Rect::new(fr.x, fr.y, h, w), true);
            }
        }
        best.map(|(_, rect, rotated)| (rect, rotated))
    }

    fn contact_point_score(&self, x: u32, y: u32, w: u32, h: u32) -> u32 {
        let node = Rect::new(x, y, w, h);
        let mut score = 0u32;
        if node.x == self.bounds.x || node.right() == self.bounds.right() {
            score += node.h;
        }
        if node.y == self.bounds.y || node.bottom() == self.bounds.bottom() {
            score += node.w;
        }
        for u in &self.used {
            if node.x == u.right() || u.x == node.right() {
                score += overlap_1d(node.y, node.bottom(), u.y, u.bottom());
            }
            if node.y == u.bottom() || u.y == node.bottom() {
                score += overlap_1d(node.x, node.right(), u.x, u.right());
            }
        }
        score
    }

    /// Current number of free rectangles.
    pub fn free_list_len(&self) -> usize {
        self.free.len()
    }
}

/// Splits `fr` around `node` into up to four maximal free rectangles.
fn split_free_node(fr: Rect, node: &Rect, out: &mut Vec<Rect>) {
    // left
    if node.x > fr.x && node.x < fr.right() {
        out.push(Rect::new(fr.x, fr.y, node.x - fr.x, fr.h));
    }
    // right
    if node.right() < fr.right() {
        out.push(Rect::new(node.right(), fr.y, fr.right() - node.right(), fr.h));
    }
    // top
    if node.y > fr.y && node.y < fr.bottom() {
        out.push(Rect::new(fr.x, fr.y, fr.w, node.y - fr.y));
    }
    // bottom
    if node.bottom() < fr.bottom() {
        out.push(Rect::new(fr.x, node.bottom(), fr.w, fr.bottom() - node.bottom()));
    }
}

/// Drops every rectangle contained in another one of the same list.
fn prune_within(v: &mut Vec<Rect>) {
    let mut i = 0;
    while i < v.len() {
        let a = v[i];
        let dominated = v
            .iter()
            .enumerate()
            .any(|(j, b)| j != i && b.contains(&a) && (a != *b || j < i));
        if dominated {
            v.swap_remove(i);
        } else {
            i += 1;
        }
    }
}

fn overlap_1d(a1: u32, a2: u32, b1: u32, b2: u32) -> u32 {
    let start = a1.max(b1);
    let end = a2.min(b2);
    end.saturating_sub(start)
}

impl Packer for MaxRectsPacker {
    fn can_pack(&self, w: u32, h: u32) -> bool {
        self.find_position(w, h).is_some()
    }

    fn pack(&mut self, w: u32, h: u32) -> Option<(Rect, bool)> {
        let (place, rotated) = self.find_position(w, h)?;
        self.place_rect(&place);
        Some((place, rotated))
    }
}
