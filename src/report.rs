//! Presentation helpers layered on top of the algorithmic results. Nothing
//! here changes the numbers; callers render the output however they like.

use maud::html;
use std::sync::Arc;

use crate::correlation::{log2, normalize_min_max, CorrelationMatrix};
use crate::reduce::{ReducedProfile, Run};

/// Render a correlation matrix as an HTML table: run legends as row and
/// column headers, coefficients rounded to three decimals, undefined cells
/// as a dash.
pub fn correlation_matrix_html(matrix: &CorrelationMatrix) -> String {
    let n = matrix.len();
    html! {
        table class="correlation-matrix" {
            thead {
                tr {
                    th {}
                    @for run in matrix.runs() {
                        th { (run.legend()) }
                    }
                }
            }
            tbody {
                @for (row, run) in matrix.runs().iter().enumerate() {
                    tr {
                        th { (run.legend()) }
                        @for col in 0..n {
                            @let value = matrix[(row, col)];
                            @if value.is_nan() {
                                td { "-" }
                            } @else {
                                td { (format!("{:.3}", value)) }
                            }
                        }
                    }
                }
            }
        }
    }
    .into_string()
}

/// Chart-ready series per run: one `(experiment, value)` point for each
/// non-gap experiment, in universe order.
///
/// Raw intensities are log2-transformed for display; with `normalize` set,
/// values are instead min-max normalized within the run (mirroring the two
/// profile-chart variants).
pub fn chart_series(reduced: &ReducedProfile, normalize: bool) -> Vec<(Run, Vec<(Arc<str>, f64)>)> {
    let labels = reduced.experiments().labels();
    reduced
        .entries()
        .iter()
        .map(|(run, vector)| {
            let points = if normalize {
                normalize_min_max(vector)
                    .into_iter()
                    .zip(labels)
                    .filter_map(|(value, label)| value.map(|v| (label.clone(), v)))
                    .collect()
            } else {
                vector
                    .iter()
                    .copied()
                    .zip(labels)
                    .filter_map(|(value, label)| value.map(|v| (label.clone(), log2(v))))
                    .collect()
            };
            (*run, points)
        })
        .collect()
}
