use super::Packer;
use crate::config::PackHeuristic;
use crate::model::Rect;

/// MaxRects free-list packer over one page.
///
/// Each placed rect reserves `padding` extra pixels (split half/half around the
/// content), and the page border is inset by `padding` as well, so two placed
/// rects expanded by `padding / 2` on every side stay disjoint and inside the
/// page.
pub struct MaxRectsPacker {
    padding: u32,
    free: Vec<Rect>,
    heuristic: PackHeuristic,
}

impl MaxRectsPacker {
    pub fn new(width: u32, height: u32, padding: u32, heuristic: PackHeuristic) -> Self {
        let w = width.saturating_sub(padding.saturating_mul(2));
        let h = height.saturating_sub(padding.saturating_mul(2));
        let border = Rect::new(padding, padding, w, h);
        Self {
            padding,
            free: vec![border],
            heuristic,
        }
    }

    fn rect_right_ex(r: &Rect) -> u32 {
        r.x + r.w
    }
    fn rect_bottom_ex(r: &Rect) -> u32 {
        r.y + r.h
    }

    fn intersects(a: &Rect, b: &Rect) -> bool {
        !(a.x >= Self::rect_right_ex(b)
            || b.x >= Self::rect_right_ex(a)
            || a.y >= Self::rect_bottom_ex(b)
            || b.y >= Self::rect_bottom_ex(a))
    }

    fn place_rect(&mut self, node: &Rect) {
        // split all free rectangles that intersect with node
        let mut new_free: Vec<Rect> = Vec::new();
        for fr in self.free.iter() {
            if !Self::intersects(fr, node) {
                new_free.push(*fr);
                continue;
            }
            let fr_x2 = fr.x + fr.w;
            let fr_y2 = fr.y + fr.h;
            let n_x2 = node.x + node.w;
            let n_y2 = node.y + node.h;

            let ix1 = fr.x.max(node.x);
            let iy1 = fr.y.max(node.y);
            let ix2 = fr_x2.min(n_x2);
            let iy2 = fr_y2.min(n_y2);

            // above
            if iy1 > fr.y {
                let h = iy1 - fr.y;
                new_free.push(Rect::new(fr.x, fr.y, fr.w, h));
            }
            // below
            if iy2 < fr_y2 {
                let h = fr_y2 - iy2;
                new_free.push(Rect::new(fr.x, iy2, fr.w, h));
            }
            // left
            if ix1 > fr.x {
                let w = ix1 - fr.x;
                let y = iy1;
                let h = iy2.saturating_sub(iy1);
                if h > 0 {
                    new_free.push(Rect::new(fr.x, y, w, h));
                }
            }
            // right
            if ix2 < fr_x2 {
                let w = fr_x2 - ix2;
                let x = ix2;
                let y = iy1;
                let h = iy2.saturating_sub(iy1);
                if h > 0 {
                    new_free.push(Rect::new(x, y, w, h));
                }
            }
        }

        self.free = new_free;
        self.prune_free_list();
    }

    fn prune_free_list(&mut self) {
        let mut i = 0;
        while i < self.free.len() {
            let mut j = i + 1;
            let a = self.free[i];
            let a_right = Self::rect_right_ex(&a);
            let a_bottom = Self::rect_bottom_ex(&a);
            let mut remove_i = false;
            while j < self.free.len() {
                let b = self.free[j];
                let b_right = Self::rect_right_ex(&b);
                let b_bottom = Self::rect_bottom_ex(&b);
                // if a inside b
                if a.x >= b.x && a.y >= b.y && a_right <= b_right && a_bottom <= b_bottom {
                    remove_i = true;
                    break;
                }
                // if b inside a
                if b.x >= a.x && b.y >= a.y && b_right <= a_right && b_bottom <= a_bottom {
                    self.free.remove(j);
                    continue;
                }
                j += 1;
            }
            if remove_i {
                self.free.remove(i);
            } else {
                i += 1;
            }
        }
    }

    fn score(&self, fr: &Rect, w: u32, h: u32) -> (i32, i32) {
        let leftover_h = fr.w as i32 - w as i32;
        let leftover_v = fr.h as i32 - h as i32;
        let short_fit = leftover_h.abs().min(leftover_v.abs());
        let long_fit = leftover_h.abs().max(leftover_v.abs());
        let area_fit = (fr.w * fr.h) as i32 - (w * h) as i32;
        match self.heuristic {
            PackHeuristic::BestAreaFit => (area_fit, short_fit),
            PackHeuristic::BestShortSideFit => (short_fit, long_fit),
            PackHeuristic::BestLongSideFit => (long_fit, short_fit),
            PackHeuristic::BottomLeft => (fr.y as i32, fr.x as i32),
        }
    }

    fn find_position(&self, w: u32, h: u32) -> Option<Rect> {
        let mut best_score1 = i32::MAX;
        let mut best_score2 = i32::MAX;
        let mut best_rect = Rect::new(0, 0, 0, 0);
        let mut best_top = u32::MAX; // tie-break: prefer smaller top side (y + h)
        let mut best_left = u32::MAX; // then prefer smaller x

        for fr in &self.free {
            if fr.w >= w && fr.h >= h {
                let (s1, s2) = self.score(fr, w, h);
                let top = fr.y.saturating_add(h);
                if s1 < best_score1
                    || (s1 == best_score1
                        && (s2 < best_score2
                            || (s2 == best_score2
                                && (top < best_top || (top == best_top && fr.x < best_left)))))
                {
                    best_score1 = s1;
                    best_score2 = s2;
                    best_top = top;
                    best_left = fr.x;
                    best_rect = Rect::new(fr.x, fr.y, w, h);
                }
                // perfect fit early-out
                if fr.w == w && fr.h == h {
                    return Some(Rect::new(fr.x, fr.y, w, h));
                }
            }
        }

        if best_rect.w == 0 || best_rect.h == 0 {
            None
        } else {
            Some(best_rect)
        }
    }
}

impl Packer for MaxRectsPacker {
    fn can_pack(&self, rect: &Rect) -> bool {
        let w = rect.w + self.padding;
        let h = rect.h + self.padding;
        self.find_position(w, h).is_some()
    }

    fn pack(&mut self, rect: &Rect) -> Option<Rect> {
        let w = rect.w + self.padding;
        let h = rect.h + self.padding;
        let place = self.find_position(w, h)?;
        self.place_rect(&place);
        // content sits centered in its reserved slot
        let pad_half = self.padding / 2;
        Some(Rect::new(
            place.x.saturating_add(pad_half),
            place.y.saturating_add(pad_half),
            rect.w,
            rect.h,
        ))
    }
}
