use super::{ReportRenderer, wrap};
use crate::markup::{self, Color};
use crate::snapshot::AggregateSnapshot;

impl ReportRenderer {
    /// Bulleted suggestions, wrapped to the line width.
    pub fn recommendations(&self, s: &AggregateSnapshot) -> String {
        let mut out = self.header("Recommendations");
        let bullet = format!("{} ", self.theme.bullet);
        let indent = bullet.chars().count();
        let width = self.layout.width().saturating_sub(indent);
        for message in self.recommender.recommend(s) {
            for (i, line) in wrap(&message, width).into_iter().enumerate() {
                let lead = if i == 0 {
                    markup::paint(&bullet, Color::Cyan)
                } else {
                    " ".repeat(indent)
                };
                out.push_str(&self.fit(&format!("{lead}{}", markup::escape(&line))));
                out.push('\n');
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{records, renderer, snapshot};
    use crate::recommend::ALL_CLEAR;

    #[test]
    fn healthy_run_gets_positive_message() {
        let recs = records(&[("A", 5000, 1.0), ("B", 4000, 1.0)]);
        let out = renderer(146).recommendations(&snapshot(&recs));
        assert!(out.contains(&format!("* {ALL_CLEAR}")));
    }

    #[test]
    fn long_messages_wrap_with_hanging_indent() {
        let recs = records(&[("A", 5000, 1.0), ("B", 5, 1.0)]);
        let out = renderer(40).recommendations(&snapshot(&recs));
        let rows: Vec<&str> = out.lines().skip(2).collect();
        assert!(rows.len() > 2);
        assert!(rows[0].starts_with("* 1 job rated"));
        assert!(rows[1].starts_with("  "));
        for row in rows {
            assert!(row.chars().count() <= 40);
        }
    }
}
