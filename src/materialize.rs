use pdf_table_geometry::TableModel;

/// Vertical merge marker of a cell: the origin row restarts the merge, every
/// later row of the span continues it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerticalMerge {
    Restart,
    Continue,
}

/// Merge attributes for one cell. `grid_span` is set on the origin column of
/// every row a horizontal span covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CellMerge {
    pub grid_span: Option<usize>,
    pub v_merge: Option<VerticalMerge>,
}

/// Destination renderer. Calls arrive per table in a fixed order: creation,
/// all cell texts, row shading, then merge attributes.
pub trait TableSink {
    fn create_table(&mut self, rows: usize, cols: usize);

    fn set_cell_text(&mut self, row: usize, col: usize, text: &str);

    fn shade_row(&mut self, row: usize);

    fn set_merge(&mut self, row: usize, col: usize, merge: CellMerge);
}

/// Merge attributes per origin-column cell, in row order.
pub fn merge_markers(model: &TableModel) -> Vec<(usize, usize, CellMerge)> {
    let mut markers = Vec::new();
    for span in model.merges() {
        for row in span.row..span.row + span.row_span {
            let v_merge = (span.row_span > 1).then_some(if row == span.row {
                VerticalMerge::Restart
            } else {
                VerticalMerge::Continue
            });
            markers.push((
                row,
                span.col,
                CellMerge {
                    grid_span: (span.col_span > 1).then_some(span.col_span),
                    v_merge,
                },
            ));
        }
    }
    markers.sort_by_key(|(row, col, _)| (*row, *col));
    markers
}

/// Replays one table model into a sink. Shadow cells are written empty.
pub fn materialize<S: TableSink + ?Sized>(model: &TableModel, sink: &mut S) {
    sink.create_table(model.row_count(), model.col_count());

    for row in 0..model.row_count() {
        for col in 0..model.col_count() {
            let text = if model.is_shadow(row, col) {
                ""
            } else {
                model.cell(row, col).unwrap_or_default()
            };
            sink.set_cell_text(row, col, text);
        }
    }

    for (row, shaded) in model.row_shaded().iter().enumerate() {
        if *shaded {
            sink.shade_row(row);
        }
    }

    for (row, col, merge) in merge_markers(model) {
        sink.set_merge(row, col, merge);
    }
}

#[cfg(test)]
mod tests {
    use pdf_table_geometry::{MergeSpan, TableModel};
    use pretty_assertions::assert_eq;

    use super::{CellMerge, TableSink, VerticalMerge, materialize};

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Create(usize, usize),
        Text(usize, usize, String),
        Shade(usize),
        Merge(usize, usize, CellMerge),
    }

    #[derive(Default)]
    struct Recorder {
        calls: Vec<Call>,
    }

    impl TableSink for Recorder {
        fn create_table(&mut self, rows: usize, cols: usize) {
            self.calls.push(Call::Create(rows, cols));
        }

        fn set_cell_text(&mut self, row: usize, col: usize, text: &str) {
            self.calls.push(Call::Text(row, col, text.to_string()));
        }

        fn shade_row(&mut self, row: usize) {
            self.calls.push(Call::Shade(row));
        }

        fn set_merge(&mut self, row: usize, col: usize, merge: CellMerge) {
            self.calls.push(Call::Merge(row, col, merge));
        }
    }

    fn block_model() -> TableModel {
        let rows = vec![
            vec!["origin".to_string(), "stray".to_string(), "x".to_string(), "a".to_string()],
            vec!["y".to_string(), String::new(), "z".to_string(), "b".to_string()],
        ];
        TableModel::new(
            1,
            rows,
            &[MergeSpan {
                row: 0,
                col: 0,
                col_span: 3,
                row_span: 2,
            }],
            vec![true, false],
        )
    }

    #[test]
    fn block_merge_marks_restart_then_continue_and_clears_shadows() {
        let mut recorder = Recorder::default();
        materialize(&block_model(), &mut recorder);

        let texts = recorder
            .calls
            .iter()
            .filter_map(|call| match call {
                Call::Text(row, col, text) => Some(((*row, *col), text.as_str())),
                _ => None,
            })
            .collect::<Vec<_>>();
        assert_eq!(texts[0], ((0, 0), "origin"));
        for shadow in [(0, 1), (0, 2), (1, 0), (1, 1), (1, 2)] {
            let text = texts.iter().find(|(address, _)| *address == shadow).map(|(_, text)| *text);
            assert_eq!(text, Some(""), "shadow {shadow:?} must be empty");
        }
        assert!(texts.contains(&((1, 3), "b")));

        let merges = recorder
            .calls
            .iter()
            .filter(|call| matches!(call, Call::Merge(..)))
            .cloned()
            .collect::<Vec<_>>();
        assert_eq!(
            merges,
            vec![
                Call::Merge(
                    0,
                    0,
                    CellMerge {
                        grid_span: Some(3),
                        v_merge: Some(VerticalMerge::Restart),
                    }
                ),
                Call::Merge(
                    1,
                    0,
                    CellMerge {
                        grid_span: Some(3),
                        v_merge: Some(VerticalMerge::Continue),
                    }
                ),
            ]
        );
    }

    #[test]
    fn calls_follow_create_text_shade_merge_order() {
        let mut recorder = Recorder::default();
        materialize(&block_model(), &mut recorder);

        let phase = |call: &Call| match call {
            Call::Create(..) => 0,
            Call::Text(..) => 1,
            Call::Shade(..) => 2,
            Call::Merge(..) => 3,
        };
        let phases = recorder.calls.iter().map(phase).collect::<Vec<_>>();
        let mut sorted = phases.clone();
        sorted.sort_unstable();
        assert_eq!(phases, sorted);
        assert_eq!(recorder.calls[0], Call::Create(2, 4));
        assert!(recorder.calls.contains(&Call::Shade(0)));
        assert!(!recorder.calls.contains(&Call::Shade(1)));
    }

    #[test]
    fn horizontal_only_span_has_no_vertical_marker() {
        let model = TableModel::new(
            1,
            vec![vec!["wide".to_string(), String::new()]],
            &[MergeSpan {
                row: 0,
                col: 0,
                col_span: 2,
                row_span: 1,
            }],
            vec![],
        );
        let mut recorder = Recorder::default();
        materialize(&model, &mut recorder);
        assert!(recorder.calls.contains(&Call::Merge(
            0,
            0,
            CellMerge {
                grid_span: Some(2),
                v_merge: None,
            }
        )));
    }
}
