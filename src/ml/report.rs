use serde::{Deserialize, Serialize};
use std::fmt;

const REPORT_WIDTH: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// Per-class precision / recall / f1 for a binary classifier, plus accuracy
/// and macro / weighted averages. Undefined ratios count as 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub classes: [ClassMetrics; 2],
    pub accuracy: f64,
    pub macro_avg: ClassMetrics,
    pub weighted_avg: ClassMetrics,
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

fn f1(precision: f64, recall: f64) -> f64 {
    if precision + recall == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / (precision + recall)
    }
}

fn averaged(classes: &[ClassMetrics; 2], weights: [f64; 2], support: usize) -> ClassMetrics {
    let norm: f64 = weights.iter().sum();
    let avg = |field: fn(&ClassMetrics) -> f64| {
        if norm == 0.0 {
            0.0
        } else {
            classes
                .iter()
                .zip(weights)
                .map(|(c, w)| field(c) * w)
                .sum::<f64>()
                / norm
        }
    };
    ClassMetrics {
        precision: avg(|c| c.precision),
        recall: avg(|c| c.recall),
        f1: avg(|c| c.f1),
        support,
    }
}

fn write_row(f: &mut fmt::Formatter<'_>, name: &str, m: &ClassMetrics) -> fmt::Result {
    writeln!(
        f,
        "{:>w$}  {:>9.2} {:>9.2} {:>9.2} {:>9}",
        name,
        m.precision,
        m.recall,
        m.f1,
        m.support,
        w = REPORT_WIDTH
    )
}

impl ClassificationReport {
    pub fn from_predictions(y_true: &[u8], y_pred: &[u8]) -> Self {
        let total = y_true.len().min(y_pred.len());

        let class_metrics = |class: u8| {
            let mut tp = 0;
            let mut predicted = 0;
            let mut actual = 0;
            for (&t, &p) in y_true.iter().zip(y_pred) {
                if p == class {
                    predicted += 1;
                }
                if t == class {
                    actual += 1;
                    if p == class {
                        tp += 1;
                    }
                }
            }
            let precision = ratio(tp, predicted);
            let recall = ratio(tp, actual);
            ClassMetrics {
                precision,
                recall,
                f1: f1(precision, recall),
                support: actual,
            }
        };

        let classes = [class_metrics(0), class_metrics(1)];
        let correct = y_true
            .iter()
            .zip(y_pred)
            .filter(|(t, p)| t == p)
            .count();

        Self {
            classes,
            accuracy: ratio(correct, total),
            macro_avg: averaged(&classes, [1.0, 1.0], total),
            weighted_avg: averaged(
                &classes,
                [classes[0].support as f64, classes[1].support as f64],
                total,
            ),
        }
    }

    pub fn support(&self) -> usize {
        self.macro_avg.support
    }
}

// 常見的分類報表版面：每類一列，接著 accuracy 與兩種平均
impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:>w$}  {:>9} {:>9} {:>9} {:>9}",
            "",
            "precision",
            "recall",
            "f1-score",
            "support",
            w = REPORT_WIDTH
        )?;
        writeln!(f)?;
        write_row(f, "0", &self.classes[0])?;
        write_row(f, "1", &self.classes[1])?;
        writeln!(f)?;
        writeln!(
            f,
            "{:>w$}  {:>9} {:>9} {:>9.2} {:>9}",
            "accuracy",
            "",
            "",
            self.accuracy,
            self.support(),
            w = REPORT_WIDTH
        )?;
        write_row(f, "macro avg", &self.macro_avg)?;
        write_row(f, "weighted avg", &self.weighted_avg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics() {
        let y_true = [0, 0, 0, 1, 1, 1, 1, 0];
        let y_pred = [0, 0, 1, 1, 1, 0, 1, 0];
        let report = ClassificationReport::from_predictions(&y_true, &y_pred);

        // class 1: tp=3, predicted=4, actual=4
        assert_eq!(report.classes[1].precision, 0.75);
        assert_eq!(report.classes[1].recall, 0.75);
        assert_eq!(report.classes[1].support, 4);
        assert_eq!(report.accuracy, 0.75);
        assert_eq!(report.macro_avg.support, 8);
    }

    #[test]
    fn test_zero_division_is_zero() {
        let report = ClassificationReport::from_predictions(&[0, 1], &[0, 0]);
        assert_eq!(report.classes[1].precision, 0.0);
        assert_eq!(report.classes[1].f1, 0.0);
        assert_eq!(report.accuracy, 0.5);
    }

    #[test]
    fn test_display_layout() {
        let report = ClassificationReport::from_predictions(&[0, 1, 1, 0], &[0, 1, 1, 0]);
        let text = report.to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "              precision    recall  f1-score   support"
        );
        assert_eq!(
            lines[2],
            "           0       1.00      1.00      1.00         2"
        );
        assert!(lines[5].trim_start().starts_with("accuracy"));
        assert!(lines[7].trim_start().starts_with("weighted avg"));
    }
}
