//! Vector outline of the glass cavity.
//!
//! Understands the absolute subset of SVG path data the widget draws with
//! (`M`, `L`, `H`, `V`, `Q`, `Z`). Curves are flattened into line segments at
//! build time, so a `Silhouette` is just a set of closed polygons and
//! `contains` is a plain winding-number test.

use crate::error::PathError;

/// Outline of the widget's glass in its 100×200 view box.
pub const HOURGLASS_PATH: &str = "M 20 10 H 80 Q 80 55 53 98 L 53 102 Q 80 145 80 190 \
     H 20 Q 20 145 47 102 L 47 98 Q 20 55 20 10 Z";

/// Line segments per flattened quadratic curve.
const CURVE_SEGMENTS: u32 = 16;

#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Closed polygons making up the cavity. Filled with the non-zero rule.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct Silhouette {
    rings: Vec<Vec<Point>>,
}

impl Silhouette {
    /// Parse absolute SVG path data.
    pub fn parse(d: &str) -> Result<Self, PathError> {
        let tokens = tokenize(d)?;
        if tokens.is_empty() {
            return Err(PathError::Empty);
        }

        let mut builder = PathBuilder::default();
        let mut tokens = tokens.into_iter().peekable();
        let mut last: Option<char> = None;

        while let Some(&token) = tokens.peek() {
            let command = match token {
                Token::Command(c) => {
                    tokens.next();
                    c
                }
                // Repeated coordinates reuse the previous command; after a
                // moveto they are implicit linetos.
                Token::Number(n) => match last {
                    Some('M') => 'L',
                    Some(c) if c != 'Z' => c,
                    _ => return Err(PathError::StrayNumber(n)),
                },
            };

            match command {
                'M' => {
                    let p = point(&mut tokens, command)?;
                    builder.move_to(p);
                }
                'L' => {
                    let p = point(&mut tokens, command)?;
                    builder.line_to(command, p)?;
                }
                'H' => {
                    let x = number(&mut tokens, command)?;
                    let y = builder.current(command)?.y;
                    builder.line_to(command, Point::new(x, y))?;
                }
                'V' => {
                    let y = number(&mut tokens, command)?;
                    let x = builder.current(command)?.x;
                    builder.line_to(command, Point::new(x, y))?;
                }
                'Q' => {
                    let ctrl = point(&mut tokens, command)?;
                    let to = point(&mut tokens, command)?;
                    builder.quad_to(command, ctrl, to)?;
                }
                'Z' | 'z' => builder.close(),
                other => return Err(PathError::UnknownCommand(other)),
            }
            last = Some(command.to_ascii_uppercase());
        }

        Ok(builder.finish())
    }

    /// The widget's glass outline, in view-box units.
    #[must_use]
    pub fn hourglass() -> Self {
        let mut b = PathBuilder::default();
        b.move_to(Point::new(20.0, 10.0));
        b.push(Point::new(80.0, 10.0));
        b.push_quad(Point::new(80.0, 55.0), Point::new(53.0, 98.0));
        b.push(Point::new(53.0, 102.0));
        b.push_quad(Point::new(80.0, 145.0), Point::new(80.0, 190.0));
        b.push(Point::new(20.0, 190.0));
        b.push_quad(Point::new(20.0, 145.0), Point::new(47.0, 102.0));
        b.push(Point::new(47.0, 98.0));
        b.push_quad(Point::new(20.0, 55.0), Point::new(20.0, 10.0));
        b.close();
        b.finish()
    }

    /// Two opposed trapezoids meeting at a narrow waist, in grid units.
    ///
    /// The cavity spans rows `1..height-1` at full `width` and narrows
    /// linearly to `waist_width` columns over rows `waist_row-1..waist_row+1`.
    #[must_use]
    pub fn double_trapezoid(width: f64, height: f64, waist_width: f64, waist_row: f64) -> Self {
        let left = (width - waist_width) / 2.0;
        let right = left + waist_width;
        let top = 1.0;
        let bottom = height - 1.0;

        let mut b = PathBuilder::default();
        b.move_to(Point::new(0.0, top));
        b.push(Point::new(width, top));
        b.push(Point::new(right, waist_row - 1.0));
        b.push(Point::new(right, waist_row + 1.0));
        b.push(Point::new(width, bottom));
        b.push(Point::new(0.0, bottom));
        b.push(Point::new(left, waist_row + 1.0));
        b.push(Point::new(left, waist_row - 1.0));
        b.close();
        b.finish()
    }

    /// Axis-aligned rectangle, mostly useful for open test boxes.
    #[must_use]
    pub fn rectangle(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        let mut b = PathBuilder::default();
        b.move_to(Point::new(x0, y0));
        b.push(Point::new(x1, y0));
        b.push(Point::new(x1, y1));
        b.push(Point::new(x0, y1));
        b.close();
        b.finish()
    }

    #[must_use]
    pub fn scaled(&self, sx: f64, sy: f64) -> Self {
        Self {
            rings: self
                .rings
                .iter()
                .map(|ring| ring.iter().map(|p| Point::new(p.x * sx, p.y * sy)).collect())
                .collect(),
        }
    }

    #[must_use]
    pub fn rings(&self) -> &[Vec<Point>] {
        &self.rings
    }

    /// `(min, max)` corners, or `None` for an empty outline.
    #[must_use]
    pub fn bounds(&self) -> Option<(Point, Point)> {
        let mut points = self.rings.iter().flatten();
        let first = *points.next()?;
        Some(points.fold((first, first), |(lo, hi), p| {
            (
                Point::new(lo.x.min(p.x), lo.y.min(p.y)),
                Point::new(hi.x.max(p.x), hi.y.max(p.y)),
            )
        }))
    }

    /// Non-zero winding test. Points exactly on an edge count as inside, so
    /// mirrored outlines classify mirrored points the same way.
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn contains(&self, x: f64, y: f64) -> bool {
        let mut winding = 0i32;
        for ring in &self.rings {
            let n = ring.len();
            for i in 0..n {
                let a = ring[i];
                let b = ring[(i + 1) % n];
                let side = (b.x - a.x) * (y - a.y) - (x - a.x) * (b.y - a.y);
                if side == 0.0
                    && x >= a.x.min(b.x)
                    && x <= a.x.max(b.x)
                    && y >= a.y.min(b.y)
                    && y <= a.y.max(b.y)
                {
                    return true;
                }
                if a.y <= y {
                    if b.y > y && side > 0.0 {
                        winding += 1;
                    }
                } else if b.y <= y && side < 0.0 {
                    winding -= 1;
                }
            }
        }
        winding != 0
    }
}

#[derive(Debug, Default)]
struct PathBuilder {
    rings: Vec<Vec<Point>>,
    ring: Vec<Point>,
    start: Option<Point>,
}

impl PathBuilder {
    fn move_to(&mut self, p: Point) {
        self.flush();
        self.ring.push(p);
        self.start = Some(p);
    }

    fn current(&self, command: char) -> Result<Point, PathError> {
        self.ring
            .last()
            .copied()
            .or(self.start)
            .ok_or(PathError::NoCurrentPoint(command))
    }

    fn line_to(&mut self, command: char, p: Point) -> Result<(), PathError> {
        self.reopen(command)?;
        self.push(p);
        Ok(())
    }

    fn quad_to(&mut self, command: char, ctrl: Point, to: Point) -> Result<(), PathError> {
        self.reopen(command)?;
        self.push_quad(ctrl, to);
        Ok(())
    }

    /// After a closepath, drawing resumes from the subpath's start point.
    fn reopen(&mut self, command: char) -> Result<(), PathError> {
        if self.ring.is_empty() {
            let start = self.start.ok_or(PathError::NoCurrentPoint(command))?;
            self.ring.push(start);
        }
        Ok(())
    }

    fn push(&mut self, p: Point) {
        self.ring.push(p);
    }

    fn push_quad(&mut self, ctrl: Point, to: Point) {
        let Some(&from) = self.ring.last() else {
            return;
        };
        for step in 1..=CURVE_SEGMENTS {
            let t = f64::from(step) / f64::from(CURVE_SEGMENTS);
            let u = 1.0 - t;
            self.ring.push(Point::new(
                u * u * from.x + 2.0 * u * t * ctrl.x + t * t * to.x,
                u * u * from.y + 2.0 * u * t * ctrl.y + t * t * to.y,
            ));
        }
    }

    fn close(&mut self) {
        self.flush();
    }

    fn flush(&mut self) {
        let mut ring = std::mem::take(&mut self.ring);
        // A closing segment back onto the start point adds nothing.
        if ring.len() > 1 && ring.first() == ring.last() {
            ring.pop();
        }
        if ring.len() >= 3 {
            self.rings.push(ring);
        }
    }

    fn finish(mut self) -> Silhouette {
        self.flush();
        Silhouette { rings: self.rings }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Token {
    Command(char),
    Number(f64),
}

fn tokenize(d: &str) -> Result<Vec<Token>, PathError> {
    let mut tokens = Vec::new();
    let mut chars = d.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        if c.is_whitespace() || c == ',' {
            chars.next();
        } else if c.is_ascii_alphabetic() && c != 'e' && c != 'E' {
            tokens.push(Token::Command(c));
            chars.next();
        } else if c.is_ascii_digit() || matches!(c, '-' | '+' | '.') {
            let mut end = start;
            let mut prev = None;
            while let Some(&(i, ch)) = chars.peek() {
                let sign_ok = matches!(ch, '-' | '+') && (i == start || matches!(prev, Some('e' | 'E')));
                if ch.is_ascii_digit() || ch == '.' || matches!(ch, 'e' | 'E') || sign_ok {
                    end = i + ch.len_utf8();
                    prev = Some(ch);
                    chars.next();
                } else {
                    break;
                }
            }
            let text = &d[start..end];
            let value = text
                .parse::<f64>()
                .map_err(|_| PathError::BadNumber(text.to_string()))?;
            tokens.push(Token::Number(value));
        } else {
            return Err(PathError::UnknownCommand(c));
        }
    }
    Ok(tokens)
}

fn number<I: Iterator<Item = Token>>(
    tokens: &mut std::iter::Peekable<I>,
    command: char,
) -> Result<f64, PathError> {
    match tokens.peek() {
        Some(&Token::Number(n)) => {
            tokens.next();
            Ok(n)
        }
        _ => Err(PathError::MissingNumber { command }),
    }
}

fn point<I: Iterator<Item = Token>>(
    tokens: &mut std::iter::Peekable<I>,
    command: char,
) -> Result<Point, PathError> {
    let x = number(tokens, command)?;
    let y = number(tokens, command)?;
    Ok(Point::new(x, y))
}
